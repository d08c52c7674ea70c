pub mod ids;
pub mod plan;
pub mod render;

pub use ids::SessionId;
pub use plan::{InsertionKey, PageSource, PlanItem};
pub use render::RenderOptions;
