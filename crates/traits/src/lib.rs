pub mod codec;
pub mod storage;

pub use codec::{CodecError, DocumentCodec, PageHandle};
pub use storage::{Artifact, InMemorySessionStorage, SessionStorage, SharedBytes, StorageError};
