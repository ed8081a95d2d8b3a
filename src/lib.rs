//! DrawSync Library
//!
//! 本地/远程绘图同步引擎

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;

// 重新导出常用类型
pub use application::builder::SyncEngineBuilder;
pub use application::sync_engine::SyncEngine;
pub use application::views::{DrawingViews, ViewStream};
pub use config::Settings;
pub use domain::drawing::{Drawing, RemoteName, StorageLocation};
pub use domain::identity::Identity;
pub use error::{Result, SyncError};
pub use infrastructure::network::api_client::{ApiConfig, DrawingApi, HttpDrawingApi};
pub use infrastructure::storage::db::pool::{init_db_pool, DbPool};
pub use infrastructure::storage::metadata_store::MetadataStore;
