//! 存储基础设施
//!
//! 元数据走 SQLite, 画布位图以文件形式落盘。

pub mod blob_store;
pub mod db;
pub mod metadata_store;

pub use blob_store::BlobStore;
pub use metadata_store::MetadataStore;
