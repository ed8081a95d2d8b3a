//! Domain model
//!
//! 绘图同步引擎的核心实体与值对象。

pub mod drawing;
pub mod identity;

pub use drawing::{Drawing, RemoteName, StorageLocation, UNKNOWN_OWNER};
pub use identity::Identity;
