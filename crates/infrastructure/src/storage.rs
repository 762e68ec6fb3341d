use std::path::{Component, Path, PathBuf};

use application::{AvatarStorage, StorageError};
use async_trait::async_trait;
use tokio::fs;

/// 保存在本地目录中的上传文件，对外由静态文件服务暴露
#[derive(Debug, Clone)]
pub struct LocalAvatarStorage {
    root: PathBuf,
}

impl LocalAvatarStorage {
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|err| StorageError::Io(format!("{}: {err}", root.display())))?;
        tracing::info!(path = %root.display(), "upload directory ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// 只接受普通路径片段，拒绝 `..`、绝对路径等越界写法
fn relative_path(directory: &str, file_name: &str) -> Result<PathBuf, StorageError> {
    let candidate = Path::new(directory).join(file_name);
    let mut relative = PathBuf::new();
    for component in candidate.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            _ => {
                return Err(StorageError::InvalidPath(
                    candidate.display().to_string(),
                ))
            }
        }
    }
    if relative.as_os_str().is_empty() || file_name.contains(['/', '\\']) {
        return Err(StorageError::InvalidPath(candidate.display().to_string()));
    }
    Ok(relative)
}

#[async_trait]
impl AvatarStorage for LocalAvatarStorage {
    async fn store(
        &self,
        directory: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StorageError> {
        let relative = relative_path(directory, file_name)?;
        let target = self.root.join(&relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| StorageError::Io(err.to_string()))?;
        }
        fs::write(&target, &bytes)
            .await
            .map_err(|err| StorageError::Io(err.to_string()))?;

        let relative = relative
            .components()
            .filter_map(|component| component.as_os_str().to_str())
            .collect::<Vec<_>>()
            .join("/");
        tracing::debug!(path = %relative, size = bytes.len(), "file stored");
        Ok(relative)
    }
}
