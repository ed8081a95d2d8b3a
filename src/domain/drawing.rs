use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// 绘图文件当前所在的存储位置
///
/// `Uploading` 是上传进行中的显式状态：网络调用成功前不会出现 `Both`，
/// 失败时回退到 `Local`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageLocation {
    Local,
    Uploading,
    Server,
    Both,
}

impl StorageLocation {
    /// Whether the blob is expected to be present on local disk.
    pub fn is_locally_present(&self) -> bool {
        matches!(
            self,
            StorageLocation::Local | StorageLocation::Uploading | StorageLocation::Both
        )
    }

    /// Whether the record claims a copy on the server.
    ///
    /// `Uploading` deliberately does not claim server presence: the name is
    /// legitimately absent from the server listing until the POST completes,
    /// so reconciliation must not sweep it away.
    pub fn claims_server(&self) -> bool {
        matches!(self, StorageLocation::Server | StorageLocation::Both)
    }
}

impl Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StorageLocation::Local => "local",
            StorageLocation::Uploading => "uploading",
            StorageLocation::Server => "server",
            StorageLocation::Both => "both",
        };
        write!(f, "{}", s)
    }
}

impl TryFrom<&str> for StorageLocation {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "local" => Ok(StorageLocation::Local),
            "uploading" => Ok(StorageLocation::Uploading),
            "server" => Ok(StorageLocation::Server),
            "both" => Ok(StorageLocation::Both),
            _ => Err(format!("无效的存储位置: {}", s)),
        }
    }
}

/// Owner used when a server-side entry carries no owner segment and for
/// legacy records that predate owner tracking.
pub const UNKNOWN_OWNER: &str = "unknown";

/// 绘图元数据记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Drawing {
    /// 记录ID，由元数据存储在插入时分配
    pub id: i32,
    /// 文件名，同一所有者下唯一
    pub file_name: String,
    /// 本地 blob 所在目录
    pub file_path: String,
    /// 存储位置
    pub storage_location: StorageLocation,
    /// 创建/上传该绘图的用户；仅旧记录可能为空
    pub owner_username: Option<String>,
    /// 创建时间(时间戳)
    pub created_at: i32,
}

impl Drawing {
    /// The `owner/filename` key this record occupies on the server.
    ///
    /// Records without a tracked owner fall back to [`UNKNOWN_OWNER`], which
    /// mirrors how malformed server entries are parsed.
    pub fn remote_name(&self) -> RemoteName {
        RemoteName {
            owner: self
                .owner_username
                .clone()
                .unwrap_or_else(|| UNKNOWN_OWNER.to_string()),
            name: self.file_name.clone(),
        }
    }
}

impl PartialEq for Drawing {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Display for Drawing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Drawing(id: {}, name: {}, location: {}, owner: {})",
            self.id,
            self.file_name,
            self.storage_location,
            self.owner_username.clone().unwrap_or_default()
        )
    }
}

/// A `"owner/filename"` entry from the server's authoritative listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteName {
    pub owner: String,
    pub name: String,
}

impl RemoteName {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse a listing entry, splitting on the first `/`.
    ///
    /// Entries without a slash are attributed to [`UNKNOWN_OWNER`] instead of
    /// failing the whole listing.
    pub fn parse(entry: &str) -> Self {
        match entry.split_once('/') {
            Some((owner, name)) => Self::new(owner, name),
            None => Self::new(UNKNOWN_OWNER, entry),
        }
    }
}

impl Display for RemoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
