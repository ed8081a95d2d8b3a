use diesel::prelude::*;

use crate::domain::drawing::{Drawing, StorageLocation};

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::infrastructure::storage::db::schema::drawings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DbDrawing {
    pub id: i32,
    pub file_name: String,
    pub file_path: String,
    pub storage_location: String,
    pub owner_username: Option<String>,
    pub created_at: i32,
}

impl DbDrawing {
    /// 获取存储位置枚举
    ///
    /// 数据库文本损坏时回退为 `Local`，记录最多在本地视图中消失而不会
    /// 被误认为在服务器上。
    pub fn get_storage_location(&self) -> StorageLocation {
        StorageLocation::try_from(self.storage_location.as_str()).unwrap_or(StorageLocation::Local)
    }
}

impl From<DbDrawing> for Drawing {
    fn from(record: DbDrawing) -> Self {
        let storage_location = record.get_storage_location();
        Drawing {
            id: record.id,
            file_name: record.file_name,
            file_path: record.file_path,
            storage_location,
            owner_username: record.owner_username,
            created_at: record.created_at,
        }
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::infrastructure::storage::db::schema::drawings)]
pub struct NewDrawing {
    pub file_name: String,
    pub file_path: String,
    pub storage_location: String,
    pub owner_username: Option<String>,
    pub created_at: i32,
}

impl NewDrawing {
    pub fn new(
        file_name: &str,
        file_path: &str,
        storage_location: StorageLocation,
        owner_username: Option<&str>,
        created_at: i32,
    ) -> Self {
        Self {
            file_name: file_name.to_string(),
            file_path: file_path.to_string(),
            storage_location: storage_location.to_string(),
            owner_username: owner_username.map(|s| s.to_string()),
            created_at,
        }
    }
}

/// 可变字段的整行更新；所有者在插入后不再变化
#[derive(AsChangeset, Debug)]
#[diesel(table_name = crate::infrastructure::storage::db::schema::drawings)]
pub struct DrawingChanges {
    pub file_name: String,
    pub file_path: String,
    pub storage_location: String,
}

impl From<&Drawing> for DrawingChanges {
    fn from(drawing: &Drawing) -> Self {
        Self {
            file_name: drawing.file_name.clone(),
            file_path: drawing.file_path.clone(),
            storage_location: drawing.storage_location.to_string(),
        }
    }
}
