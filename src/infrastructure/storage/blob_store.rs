use crate::error::Result;
use bytes::Bytes;
use log::info;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// 本地 blob 存储
///
/// 以目录 + 文件名寻址的图像文件存储。目录由调用方提供（即记录的
/// `file_path`），因此这里只有无状态的关联函数。
pub struct BlobStore;

impl BlobStore {
    /// 写入 blob，已存在时覆盖
    ///
    /// 先写临时文件再重命名，并发读取方不会看到截断的文件。
    pub async fn write(dir: &Path, name: &str, content: &Bytes) -> Result<PathBuf> {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }

        let tmp_path = dir.join(format!(".tmp-{}", Uuid::new_v4()));
        let mut file = File::create(&tmp_path)?;
        file.write_all(content)?;

        let file_path = dir.join(name);
        fs::rename(&tmp_path, &file_path)?;

        info!("Blob stored at: {:?}", file_path);
        Ok(file_path)
    }

    /// 读取 blob 内容
    ///
    /// 文件不存在返回 `None`；其他 I/O 失败（权限、磁盘）作为错误传播。
    pub async fn read(dir: &Path, name: &str) -> Result<Option<Bytes>> {
        let file_path = dir.join(name);
        if !file_path.exists() {
            return Ok(None);
        }
        let content = fs::read(&file_path)?;
        Ok(Some(Bytes::from(content)))
    }

    /// 删除 blob
    ///
    /// 返回是否真正删除了文件；不存在时为空操作。
    pub async fn delete(dir: &Path, name: &str) -> Result<bool> {
        let file_path = dir.join(name);
        if !file_path.exists() {
            return Ok(false);
        }
        fs::remove_file(&file_path)?;
        info!("Blob deleted: {:?}", file_path);
        Ok(true)
    }

    /// 重命名 blob
    ///
    /// 旧文件不存在或新名称已被占用时返回 `false`，且不产生任何副作用。
    pub async fn rename(dir: &Path, old_name: &str, new_name: &str) -> Result<bool> {
        let old_path = dir.join(old_name);
        let new_path = dir.join(new_name);
        if !old_path.exists() || new_path.exists() {
            return Ok(false);
        }
        fs::rename(&old_path, &new_path)?;
        Ok(true)
    }

    /// blob 是否存在
    pub fn exists(dir: &Path, name: &str) -> bool {
        dir.join(name).exists()
    }
}
