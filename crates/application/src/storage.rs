use async_trait::async_trait;
use domain::{DomainError, Timestamp};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(String),
    #[error("invalid path: {0}")]
    InvalidPath(String),
}

/// 允许上传的头像格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl ImageKind {
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/gif" => Some(Self::Gif),
            "image/webp" => Some(Self::Webp),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Webp => "webp",
        }
    }
}

/// 上传限制以及对外 URL 前缀
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub public_base_url: String,
    pub max_bytes: usize,
}

impl UploadPolicy {
    /// 校验文件并生成 `{目录}/{毫秒时间戳}.{扩展名}` 形式的相对路径
    pub fn accept(
        &self,
        content_type: Option<&str>,
        bytes: &[u8],
        now: Timestamp,
    ) -> Result<(ImageKind, String), DomainError> {
        if bytes.is_empty() {
            return Err(DomainError::invalid_argument("file", "file is empty"));
        }
        if bytes.len() > self.max_bytes {
            return Err(DomainError::invalid_argument(
                "file",
                format!("file exceeds {} bytes", self.max_bytes),
            ));
        }
        let kind = content_type
            .and_then(ImageKind::from_content_type)
            .ok_or_else(|| {
                DomainError::invalid_argument("file", "only JPEG, PNG, GIF or WebP images are allowed")
            })?;
        let file_name = format!("{}.{}", now.timestamp_millis(), kind.extension());
        Ok((kind, file_name))
    }

    /// 上传文件对外可访问的地址
    pub fn public_url(&self, relative_path: &str) -> String {
        format!(
            "{}/api/uploads/{}",
            self.public_base_url.trim_end_matches('/'),
            relative_path.trim_start_matches('/')
        )
    }
}

/// 头像文件存储
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AvatarStorage: Send + Sync {
    /// 写入文件，返回相对上传根目录的路径
    async fn store(
        &self,
        directory: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StorageError>;
}
