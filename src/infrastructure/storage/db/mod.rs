pub mod dao;
pub mod models;
pub mod pool;
pub mod schema;

pub use pool::{init_db_pool, DbPool};
