//! Session storage backends for the Folio engine.
//!
//! This crate provides platform-specific implementations of the
//! `SessionStorage` trait from folio-traits.
//!
//! ## Available Backends
//!
//! - [`FilesystemSessionStorage`]: One directory per session on local disk
//!
//! ## Re-exports
//!
//! For convenience, we also re-export the in-memory backend from folio-traits:
//! - [`InMemorySessionStorage`]: Process-local storage

mod filesystem;

pub use filesystem::FilesystemSessionStorage;

pub use folio_traits::InMemorySessionStorage;
