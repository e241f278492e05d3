//! Registry client contract used by uploading and downloading stages.
//!
//! The wire protocol is left to implementations; this crate ships an
//! in-memory client and a directory-backed content-addressed store.

pub mod fs;
pub mod memory;

pub use fs::FsRegistry;
pub use memory::{MemoryRegistry, PushRecord};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::descriptor::RepositoryContext;
use crate::digest::Digest;
use crate::error::RegistryResult;

/// Describes a blob pushed to or fetched from a store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectDescriptor {
    pub media_type: String,
    pub digest: Digest,
    pub size: u64,
}

/// Source of blob bytes for a push
#[async_trait]
pub trait BlobProvider: Send {
    async fn write_blob(
        &mut self,
        desc: &ObjectDescriptor,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> std::io::Result<()>;
}

/// Provides a blob by copying from a reader
pub struct ReaderProvider<'a, R: ?Sized> {
    reader: &'a mut R,
}

impl<'a, R: ?Sized> ReaderProvider<'a, R> {
    pub fn new(reader: &'a mut R) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl<R> BlobProvider for ReaderProvider<'_, R>
where
    R: AsyncRead + Unpin + Send + ?Sized,
{
    async fn write_blob(
        &mut self,
        _desc: &ObjectDescriptor,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> std::io::Result<()> {
        tokio::io::copy(&mut *self.reader, sink).await?;
        Ok(())
    }
}

#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Push a blob to `reference`, pulling its bytes from `source`
    async fn push_blob(
        &self,
        reference: &str,
        desc: &ObjectDescriptor,
        source: &mut dyn BlobProvider,
    ) -> RegistryResult<()>;

    /// Write the blob stored under `reference` with `digest` into `sink`
    async fn fetch_blob(
        &self,
        reference: &str,
        digest: &Digest,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> RegistryResult<()>;
}

/// Coordinate of a component in a repository: `<base>/<name>:<version>`.
///
/// Trailing slashes of the base are dropped, so `host/` and `host` name the same repository.
pub fn upload_reference(repository: &RepositoryContext, name: &str, version: &str) -> String {
    format!(
        "{}/{}:{}",
        repository.base_url.trim_end_matches('/'),
        name,
        version
    )
}
