use super::utils::{get_data_dir, get_setting_path};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// 引擎设置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // 远程绘图服务地址
    #[serde(default = "default_server_url")]
    pub server_url: String,
    // 数据目录, 数据库和画布文件都在这里
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    // 新建画布的边长（像素）
    #[serde(default = "default_canvas_size")]
    pub canvas_size: u32,
    // 数据库文件名
    #[serde(default = "default_db_file_name")]
    pub db_file_name: String,
}

fn default_server_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_data_dir() -> PathBuf {
    get_data_dir().unwrap_or_else(|_| PathBuf::from("drawsync-data"))
}

fn default_canvas_size() -> u32 {
    800
}

fn default_db_file_name() -> String {
    "drawings.db".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            data_dir: default_data_dir(),
            canvas_size: default_canvas_size(),
            db_file_name: default_db_file_name(),
        }
    }
}

impl Settings {
    /// 加载设置
    ///
    /// 如果指定了设置文件路径，则从该路径加载设置
    /// 否则从默认配置目录加载设置；文件不存在时写入默认设置
    pub fn load(setting_path: Option<PathBuf>) -> Result<Self> {
        let setting_path = if let Some(path) = setting_path {
            path
        } else {
            get_setting_path()?
        };

        if let Ok(setting_str) = fs::read_to_string(&setting_path) {
            let settings: Settings =
                serde_json::from_str(&setting_str).with_context(|| "无法解析设置文件")?;
            Ok(settings)
        } else {
            let default_settings = Settings::default();
            default_settings.save(Some(setting_path))?;
            Ok(default_settings)
        }
    }

    /// 保存设置
    ///
    /// 如果指定了设置文件路径，则保存到该路径
    /// 否则保存到默认配置目录
    pub fn save(&self, setting_path: Option<PathBuf>) -> Result<()> {
        let setting_path = if let Some(path) = setting_path {
            path
        } else {
            get_setting_path()?
        };

        // 确保目录存在
        if let Some(parent) = setting_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let setting_str = serde_json::to_string_pretty(self)?;
        fs::write(&setting_path, setting_str)
            .with_context(|| format!("无法写入设置文件: {:?}", setting_path))?;

        Ok(())
    }

    /// 数据库文件的完整路径
    pub fn database_url(&self) -> String {
        self.data_dir
            .join(&self.db_file_name)
            .to_string_lossy()
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert_eq!(settings.server_url, "http://localhost:8080");
        assert_eq!(settings.canvas_size, 800);
        assert_eq!(settings.db_file_name, "drawings.db");
        assert!(settings.database_url().ends_with("drawings.db"));
    }

    #[test]
    fn test_settings_save_load() -> Result<()> {
        let temp_dir = tempdir()?;
        let setting_path = temp_dir.path().join("test_setting.json");

        let mut settings = Settings::default();
        settings.server_url = "http://draw.example.com".to_string();
        settings.canvas_size = 640;
        settings.save(Some(setting_path.clone()))?;

        let loaded = Settings::load(Some(setting_path))?;
        assert_eq!(loaded.server_url, "http://draw.example.com");
        assert_eq!(loaded.canvas_size, 640);

        Ok(())
    }

    #[test]
    fn test_load_missing_file_writes_defaults() -> Result<()> {
        let temp_dir = tempdir()?;
        let setting_path = temp_dir.path().join("nested").join("setting.json");

        let loaded = Settings::load(Some(setting_path.clone()))?;
        assert_eq!(loaded.canvas_size, 800);
        assert!(setting_path.exists());

        Ok(())
    }

    #[test]
    fn test_partial_file_fills_defaults() -> Result<()> {
        let temp_dir = tempdir()?;
        let setting_path = temp_dir.path().join("setting.json");
        fs::write(&setting_path, r#"{"server_url": "http://other:9000"}"#)?;

        let loaded = Settings::load(Some(setting_path))?;
        assert_eq!(loaded.server_url, "http://other:9000");
        assert_eq!(loaded.canvas_size, 800);

        Ok(())
    }
}
