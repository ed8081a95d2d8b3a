//! 从设置组装同步引擎

use crate::application::sync_engine::SyncEngine;
use crate::config::Settings;
use crate::error::{Result, SyncError};
use crate::infrastructure::network::api_client::{ApiConfig, DrawingApi, HttpDrawingApi};
use crate::infrastructure::storage::db::pool::init_db_pool;
use crate::infrastructure::storage::metadata_store::MetadataStore;
use std::sync::Arc;
use std::time::Duration;

/// 远程请求的默认超时时间
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct SyncEngineBuilder {
    settings: Option<Settings>,
    api: Option<Arc<dyn DrawingApi>>,
}

impl SyncEngineBuilder {
    pub fn new() -> Self {
        Self {
            settings: None,
            api: None,
        }
    }

    pub fn set_settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// 替换远程客户端, 测试时可注入 mock
    pub fn set_api(mut self, api: Arc<dyn DrawingApi>) -> Self {
        self.api = Some(api);
        self
    }

    /// 建库跑迁移, 接上远程客户端, 组装出引擎
    pub fn build(self) -> Result<SyncEngine> {
        let settings = self
            .settings
            .ok_or_else(|| SyncError::config("No settings set"))?;

        let pool = init_db_pool(&settings.database_url())?;
        let store = Arc::new(MetadataStore::new(Arc::new(pool)));

        let api: Arc<dyn DrawingApi> = match self.api {
            Some(api) => api,
            None => Arc::new(HttpDrawingApi::new(ApiConfig {
                base_url: settings.server_url.clone(),
                timeout: DEFAULT_TIMEOUT,
            })?),
        };

        Ok(SyncEngine::new(
            store,
            api,
            settings.data_dir.clone(),
            settings.canvas_size,
        ))
    }
}
