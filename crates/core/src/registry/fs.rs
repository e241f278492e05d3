// Directory-backed content-addressed blob store
//
// Layout: <root>/<repository>/blobs/<algorithm>/<hex>

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

use super::{BlobProvider, ObjectDescriptor, RegistryClient};
use crate::digest::Digest;
use crate::error::{RegistryError, RegistryResult};
use crate::message::ScratchSpace;

#[derive(Debug, Clone)]
pub struct FsRegistry {
    root: PathBuf,
}

impl FsRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path of a blob stored under `reference`
    pub fn blob_path(&self, reference: &str, digest: &Digest) -> RegistryResult<PathBuf> {
        Ok(self
            .repository_dir(reference)?
            .join("blobs")
            .join(digest.algorithm())
            .join(digest.hex()))
    }

    fn repository_dir(&self, reference: &str) -> RegistryResult<PathBuf> {
        let (repository, tag) = reference
            .rsplit_once(':')
            .filter(|(_, tag)| !tag.is_empty() && !tag.contains('/'))
            .ok_or_else(|| {
                RegistryError::rejected(format!("reference '{reference}' has no version tag"))
            })?;

        // Registry ports become part of the directory name
        let relative = PathBuf::from(repository.replace(':', "_"));
        let is_safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !is_safe || relative.as_os_str().is_empty() {
            return Err(RegistryError::rejected(format!(
                "reference '{reference}' does not map to a repository path"
            )));
        }
        debug!("Resolved reference {} (tag {})", reference, tag);
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl RegistryClient for FsRegistry {
    async fn push_blob(
        &self,
        reference: &str,
        desc: &ObjectDescriptor,
        source: &mut dyn BlobProvider,
    ) -> RegistryResult<()> {
        let target = self.blob_path(reference, &desc.digest)?;
        let dir = target
            .parent()
            .ok_or_else(|| RegistryError::rejected("blob path has no parent"))?;
        tokio::fs::create_dir_all(dir).await?;

        let mut staging = ScratchSpace::in_dir(dir).create()?;
        source.write_blob(desc, &mut staging).await?;
        staging.rewind().await?;

        let (digest, size) = Digest::from_reader(&mut staging).await?;
        if digest != desc.digest || size != desc.size {
            return Err(RegistryError::rejected(format!(
                "content {digest} ({size} bytes) does not match descriptor {} ({} bytes)",
                desc.digest, desc.size
            )));
        }

        staging.persist(&target).await?;
        debug!("Stored {} at {:?}", digest, target);
        Ok(())
    }

    async fn fetch_blob(
        &self,
        reference: &str,
        digest: &Digest,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> RegistryResult<()> {
        let path = self.blob_path(reference, digest)?;
        let mut file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RegistryError::NotFound {
                    reference: reference.to_string(),
                    digest: digest.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        tokio::io::copy(&mut file, sink).await?;
        sink.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ReaderProvider;

    fn descriptor(data: &[u8]) -> ObjectDescriptor {
        ObjectDescriptor {
            media_type: "oci-blob".to_string(),
            digest: Digest::of_bytes(data),
            size: data.len() as u64,
        }
    }

    #[tokio::test]
    async fn test_push_and_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let registry = FsRegistry::new(dir.path());
        let reference = "registry.example:5000/acme/acme/app:1.2.0";
        let desc = descriptor(b"hello");

        let mut source: &[u8] = b"hello";
        registry
            .push_blob(reference, &desc, &mut ReaderProvider::new(&mut source))
            .await
            .unwrap();

        let path = registry.blob_path(reference, &desc.digest).unwrap();
        assert!(path.starts_with(dir.path().join("registry.example_5000/acme/acme/app")));
        assert!(path.exists());

        let mut fetched = Vec::new();
        registry.fetch_blob(reference, &desc.digest, &mut fetched).await.unwrap();
        assert_eq!(fetched, b"hello");

        // Only the stored blob remains in the blob directory
        let entries = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn test_push_rejects_mismatched_content() {
        let dir = tempfile::tempdir().unwrap();
        let registry = FsRegistry::new(dir.path());
        let desc = descriptor(b"hello");

        let mut source: &[u8] = b"goodbye";
        let err = registry
            .push_blob("repo/app:1.0.0", &desc, &mut ReaderProvider::new(&mut source))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Rejected(_)));
        assert!(!registry.blob_path("repo/app:1.0.0", &desc.digest).unwrap().exists());
    }

    #[tokio::test]
    async fn test_fetch_missing_blob() {
        let dir = tempfile::tempdir().unwrap();
        let registry = FsRegistry::new(dir.path());
        let mut sink = Vec::new();
        let err = registry
            .fetch_blob("repo/app:1.0.0", &Digest::of_bytes(b"x"), &mut sink)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::NotFound { .. }));
    }

    #[test]
    fn test_rejects_unsafe_references() {
        let registry = FsRegistry::new("/tmp/store");
        let digest = Digest::of_bytes(b"x");
        assert!(registry.blob_path("repo/app", &digest).is_err());
        assert!(registry.blob_path("../escape/app:1.0", &digest).is_err());
        assert!(registry.blob_path("/abs/app:1.0", &digest).is_err());
    }
}
