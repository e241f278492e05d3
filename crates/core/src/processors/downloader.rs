// Fetches locally embedded blobs from the source repository

use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

use crate::descriptor::{Access, RepositoryContext};
use crate::digest::Digest;
use crate::error::{Result, TransportError};
use crate::message::{Message, read_message};
use crate::pipeline::{StageContext, StreamProcessor};
use crate::registry::{RegistryClient, upload_reference};

/// Attaches the bytes of a `localOciBlob` resource to the message.
///
/// The blob is looked up under `<source>/<component name>:<component
/// version>` by the digest recorded in the access and verified after
/// download. Any blob already attached to the input is replaced.
pub struct LocalBlobDownloader {
    client: Arc<dyn RegistryClient>,
    source: RepositoryContext,
}

impl LocalBlobDownloader {
    pub fn new(client: Arc<dyn RegistryClient>, source: RepositoryContext) -> Self {
        Self { client, source }
    }
}

#[async_trait]
impl StreamProcessor for LocalBlobDownloader {
    fn name(&self) -> String {
        "LocalBlobDownloader".to_string()
    }

    async fn process(
        &self,
        ctx: &StageContext,
        input: &mut (dyn AsyncRead + Unpin + Send),
        output: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<()> {
        let Message {
            descriptor,
            resource,
            blob,
        } = read_message(input, &ctx.scratch).await?;
        if let Some(previous) = blob {
            previous.close().await?;
        }

        let expected: Digest = match &resource.access {
            Access::LocalOciBlob(local) => local.digest.parse().map_err(|e| {
                TransportError::malformed(format!(
                    "resource '{}' has an invalid digest: {}",
                    resource.name, e
                ))
            })?,
            other => return Err(TransportError::unsupported_access(other.type_name())),
        };

        let reference = upload_reference(&self.source, &descriptor.name, &descriptor.version);
        debug!("Fetching {} of resource '{}' from {}", expected, resource.name, reference);

        let mut blob = ctx.scratch.create()?;
        if let Err(source) = self.client.fetch_blob(&reference, &expected, &mut blob).await {
            return Err(TransportError::DownloadFailed { reference, source });
        }
        blob.rewind().await?;

        let (actual, size) = Digest::from_reader(&mut blob).await?;
        if actual != expected {
            return Err(TransportError::DigestMismatch {
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }
        blob.rewind().await?;
        info!("Downloaded resource '{}' ({} bytes) from {}", resource.name, size, reference);

        let mut message = Message::new(descriptor, resource).with_blob(blob);
        message.write_to(output).await?;
        message.into_parts().await?;
        Ok(())
    }
}
