use crate::error::{Result, SyncError};
use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, info};
use reqwest::multipart;
use reqwest::StatusCode;
use std::time::Duration;

/// Remote drawing server operations.
///
/// `upload` sends the bearer token when one is available; `delete` always
/// requires one. The server decides ownership, the client only reports it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DrawingApi: Send + Sync {
    /// List every remote drawing as `owner/file_name` strings.
    async fn list_names(&self) -> Result<Vec<String>>;
    /// Fetch the PNG bytes of one remote drawing.
    async fn download(&self, owner: &str, file_name: &str) -> Result<Bytes>;
    /// Publish one drawing under the given owner.
    async fn upload(
        &self,
        owner: &str,
        file_name: &str,
        bytes: Bytes,
        token: Option<String>,
    ) -> Result<()>;
    /// Remove one remote drawing; the server rejects non-owners.
    async fn delete(&self, owner: &str, file_name: &str, token: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

pub struct HttpDrawingApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDrawingApi {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SyncError::network(format!("构建 HTTP 客户端失败: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn download_url(&self, owner: &str, file_name: &str) -> String {
        format!("{}/download/{}/{}", self.base_url, owner, file_name)
    }
}

#[async_trait]
impl DrawingApi for HttpDrawingApi {
    async fn list_names(&self) -> Result<Vec<String>> {
        let url = format!("{}/download/file_names", self.base_url);
        debug!("Listing remote drawings from {}", url);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(map_status_code(response.status()));
        }
        let names = response.json::<Vec<String>>().await?;
        Ok(names)
    }

    async fn download(&self, owner: &str, file_name: &str) -> Result<Bytes> {
        let url = self.download_url(owner, file_name);
        info!("Downloading drawing from {}", url);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SyncError::not_found(format!("{}/{}", owner, file_name)));
        }
        if !status.is_success() {
            return Err(map_status_code(status));
        }
        let content = response.bytes().await?;
        Ok(content)
    }

    async fn upload(
        &self,
        owner: &str,
        file_name: &str,
        bytes: Bytes,
        token: Option<String>,
    ) -> Result<()> {
        let url = format!("{}/upload/{}/{}", self.base_url, owner, file_name);
        info!("Uploading drawing to {}", url);
        let part = multipart::Part::bytes(bytes.to_vec())
            .file_name(file_name.to_string())
            .mime_str("image/png")?;
        let form = multipart::Form::new().part("image", part);
        let mut request = self.client.post(&url).multipart(form);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        match response.status() {
            StatusCode::OK | StatusCode::CREATED => Ok(()),
            code => Err(map_status_code(code)),
        }
    }

    async fn delete(&self, owner: &str, file_name: &str, token: &str) -> Result<()> {
        let url = self.download_url(owner, file_name);
        info!("Deleting remote drawing {}", url);
        let response = self.client.delete(&url).bearer_auth(token).send().await?;
        if !response.status().is_success() {
            return Err(map_status_code(response.status()));
        }
        Ok(())
    }
}

fn map_status_code(code: StatusCode) -> SyncError {
    match code {
        StatusCode::UNAUTHORIZED => SyncError::unauthorized("认证失败"),
        StatusCode::FORBIDDEN => SyncError::unauthorized("禁止访问"),
        StatusCode::NOT_FOUND => SyncError::not_found("资源不存在"),
        StatusCode::CONFLICT => SyncError::conflict("资源已存在"),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            SyncError::network("请求超时")
        }
        _ if code.is_server_error() => SyncError::network(format!("服务器错误: {}", code)),
        _ => SyncError::network(format!("意外的状态码: {}", code)),
    }
}
