use crate::error::Result;
use crate::infrastructure::storage::db::models::drawing::{DbDrawing, DrawingChanges, NewDrawing};
use crate::infrastructure::storage::db::schema::drawings;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

/// 插入一条绘图记录，返回分配的ID
///
/// 唯一索引 `(owner_username, file_name)` 负责名称查重：冲突时返回
/// `SyncError::Conflict`，调用方无需先行检查。
pub fn insert_drawing(conn: &mut SqliteConnection, new_drawing: &NewDrawing) -> Result<i32> {
    let id = diesel::insert_into(drawings::table)
        .values(new_drawing)
        .returning(drawings::id)
        .get_result(conn)?;
    Ok(id)
}

/// 更新一条绘图记录；ID不存在时为空操作
pub fn update_drawing(
    conn: &mut SqliteConnection,
    id: i32,
    changes: &DrawingChanges,
) -> Result<()> {
    diesel::update(drawings::table.find(id))
        .set(changes)
        .execute(conn)?;
    Ok(())
}

/// 仅更新存储位置
pub fn update_storage_location(
    conn: &mut SqliteConnection,
    id: i32,
    storage_location: &str,
) -> Result<()> {
    diesel::update(drawings::table.find(id))
        .set(drawings::storage_location.eq(storage_location))
        .execute(conn)?;
    Ok(())
}

/// 删除指定ID的绘图记录
pub fn delete_drawing(conn: &mut SqliteConnection, id: i32) -> Result<()> {
    diesel::delete(drawings::table.find(id)).execute(conn)?;
    Ok(())
}

/// 查询指定ID的绘图记录
pub fn get_drawing_by_id(conn: &mut SqliteConnection, id: i32) -> Result<Option<DbDrawing>> {
    let record = drawings::table
        .find(id)
        .select(DbDrawing::as_select())
        .first(conn)
        .optional()?;
    Ok(record)
}

/// 按文件名查询绘图记录，重复时取最新一条
pub fn find_drawing_by_name(
    conn: &mut SqliteConnection,
    file_name: &str,
) -> Result<Option<DbDrawing>> {
    let record = drawings::table
        .filter(drawings::file_name.eq(file_name))
        .order(drawings::id.desc())
        .select(DbDrawing::as_select())
        .first(conn)
        .optional()?;
    Ok(record)
}

/// 统计同名绘图记录数量
pub fn count_drawings_by_name(conn: &mut SqliteConnection, file_name: &str) -> Result<i64> {
    let count = drawings::table
        .filter(drawings::file_name.eq(file_name))
        .count()
        .get_result(conn)?;
    Ok(count)
}

/// 获取全部绘图记录
pub fn get_all_drawings(conn: &mut SqliteConnection) -> Result<Vec<DbDrawing>> {
    let records = drawings::table
        .order(drawings::id.asc())
        .select(DbDrawing::as_select())
        .load(conn)?;
    Ok(records)
}

/// 删除指定所有者的全部绘图记录
pub fn delete_drawings_for_owner(conn: &mut SqliteConnection, owner: &str) -> Result<usize> {
    let count = diesel::delete(drawings::table.filter(drawings::owner_username.eq(owner)))
        .execute(conn)?;
    Ok(count)
}
