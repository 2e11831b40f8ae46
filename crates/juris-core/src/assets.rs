//! Storage for uploaded binary assets such as profile pictures.
//!
//! Records only ever hold the reference an [`AssetStore`] hands back.

use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use crate::error::{JurisError, JurisResult};

/// Location profile pictures are uploaded under.
pub const PROFILE_PICTURE_PREFIX: &str = "upload/profile";

pub trait AssetStore: Send + Sync {
    /// Persist `bytes` under `prefix` and return the stored reference.
    fn store(
        &self,
        prefix: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> impl Future<Output = JurisResult<String>> + Send;
}

/// Writes assets below a root directory on the local filesystem.
///
/// Stored names are prefixed with a random UUID so uploads with the same
/// file name never overwrite each other.
#[derive(Debug, Clone)]
pub struct LocalAssetStore {
    root: PathBuf,
}

impl LocalAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Strip any directory components from a client-supplied file name.
fn base_name(file_name: &str) -> JurisResult<&str> {
    Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| JurisError::validation(format!("invalid file name: {file_name:?}")))
}

impl AssetStore for LocalAssetStore {
    async fn store(&self, prefix: &str, file_name: &str, bytes: Vec<u8>) -> JurisResult<String> {
        let name = format!("{}_{}", Uuid::new_v4().simple(), base_name(file_name)?);
        let dir = self.root.join(prefix);

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| JurisError::Storage(format!("create {}: {e}", dir.display())))?;
        let path = dir.join(&name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| JurisError::Storage(format!("write {}: {e}", path.display())))?;

        let reference = format!("{}/{name}", prefix.trim_end_matches('/'));
        debug!(reference = %reference, "Stored asset");
        Ok(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_drops_directories() {
        assert_eq!(base_name("../../etc/passwd").unwrap(), "passwd");
        assert_eq!(base_name("avatar.png").unwrap(), "avatar.png");
        assert!(base_name("").is_err());
        assert!(base_name("..").is_err());
    }

    #[tokio::test]
    async fn stores_under_prefix() {
        let root = std::env::temp_dir().join(format!("juris-assets-{}", Uuid::new_v4()));
        let store = LocalAssetStore::new(&root);

        let reference = store
            .store(PROFILE_PICTURE_PREFIX, "me.png", vec![1, 2, 3])
            .await
            .unwrap();
        assert!(reference.starts_with("upload/profile/"));
        assert!(reference.ends_with("_me.png"));

        let written = tokio::fs::read(root.join(&reference)).await.unwrap();
        assert_eq!(written, vec![1, 2, 3]);

        let again = store
            .store(PROFILE_PICTURE_PREFIX, "me.png", vec![4])
            .await
            .unwrap();
        assert_ne!(reference, again);

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }
}
