pub mod builder;
pub mod canvas;
pub mod sync_engine;
pub mod views;

pub use builder::SyncEngineBuilder;
pub use canvas::{CanvasService, DrawingContent};
pub use sync_engine::SyncEngine;
pub use views::{DrawingViews, ViewStream};
