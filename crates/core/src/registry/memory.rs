// In-memory registry client, used for dry runs and tests

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::debug;

use super::{BlobProvider, ObjectDescriptor, RegistryClient};
use crate::digest::Digest;
use crate::error::{RegistryError, RegistryResult};

/// A push observed by [`MemoryRegistry`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushRecord {
    pub reference: String,
    pub descriptor: ObjectDescriptor,
}

#[derive(Default)]
pub struct MemoryRegistry {
    blobs: Mutex<HashMap<(String, Digest), Vec<u8>>>,
    pushes: Mutex<Vec<PushRecord>>,
    reject_pushes: Option<String>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that refuses every push with `reason`
    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self {
            reject_pushes: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Store a blob directly, bypassing the push log
    pub async fn insert(&self, reference: impl Into<String>, data: Vec<u8>) -> Digest {
        let digest = Digest::of_bytes(&data);
        self.blobs
            .lock()
            .await
            .insert((reference.into(), digest.clone()), data);
        digest
    }

    pub async fn blob(&self, reference: &str, digest: &Digest) -> Option<Vec<u8>> {
        self.blobs
            .lock()
            .await
            .get(&(reference.to_string(), digest.clone()))
            .cloned()
    }

    pub async fn pushes(&self) -> Vec<PushRecord> {
        self.pushes.lock().await.clone()
    }
}

#[async_trait]
impl RegistryClient for MemoryRegistry {
    async fn push_blob(
        &self,
        reference: &str,
        desc: &ObjectDescriptor,
        source: &mut dyn BlobProvider,
    ) -> RegistryResult<()> {
        if let Some(reason) = &self.reject_pushes {
            return Err(RegistryError::rejected(reason.clone()));
        }

        let mut data = Vec::new();
        source.write_blob(desc, &mut data).await?;

        let digest = Digest::of_bytes(&data);
        if digest != desc.digest || data.len() as u64 != desc.size {
            return Err(RegistryError::rejected(format!(
                "content does not match descriptor {} ({} bytes)",
                desc.digest, desc.size
            )));
        }

        debug!("Stored {} ({} bytes) at {}", digest, data.len(), reference);
        self.blobs
            .lock()
            .await
            .insert((reference.to_string(), digest), data);
        self.pushes.lock().await.push(PushRecord {
            reference: reference.to_string(),
            descriptor: desc.clone(),
        });
        Ok(())
    }

    async fn fetch_blob(
        &self,
        reference: &str,
        digest: &Digest,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> RegistryResult<()> {
        let data = self
            .blob(reference, digest)
            .await
            .ok_or_else(|| RegistryError::NotFound {
                reference: reference.to_string(),
                digest: digest.to_string(),
            })?;
        sink.write_all(&data).await?;
        sink.flush().await?;
        Ok(())
    }
}
