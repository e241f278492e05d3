// Content-addressed upload of locally embedded blobs

use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

use crate::descriptor::{Access, RepositoryContext};
use crate::digest::Digest;
use crate::error::{Result, TransportError};
use crate::message::{Message, read_message};
use crate::pipeline::{StageContext, StreamProcessor};
use crate::registry::{ObjectDescriptor, ReaderProvider, RegistryClient, upload_reference};

/// Pushes a `localOciBlob` resource's bytes to the target repository.
///
/// The blob is pushed under `<target>/<component name>:<component version>`
/// with a descriptor of its digest, size and the resource type as media
/// type. The outgoing message carries the unchanged resource and the blob.
pub struct LocalBlobUploader {
    client: Arc<dyn RegistryClient>,
    target: RepositoryContext,
}

impl LocalBlobUploader {
    pub fn new(client: Arc<dyn RegistryClient>, target: RepositoryContext) -> Self {
        Self { client, target }
    }
}

#[async_trait]
impl StreamProcessor for LocalBlobUploader {
    fn name(&self) -> String {
        "LocalBlobUploader".to_string()
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

        if !matches!(resource.access, Access::LocalOciBlob(_)) {
            return Err(TransportError::unsupported_access(resource.access.type_name()));
        }
        // Decoding already materialized the blob into a rewound scratch file
        let mut blob = blob.ok_or_else(|| {
            TransportError::malformed(format!("resource '{}' carries no blob", resource.name))
        })?;

        let (digest, size) = Digest::from_reader(&mut blob).await?;
        blob.rewind().await?;
        let desc = ObjectDescriptor {
            media_type: resource.resource_type.clone(),
            digest,
            size,
        };

        let reference = upload_reference(&self.target, &descriptor.name, &descriptor.version);
        debug!(
            "Pushing {} ({} bytes) of resource '{}' to {}",
            desc.digest, desc.size, resource.name, reference
        );
        let mut provider = ReaderProvider::new(&mut blob);
        if let Err(source) = self.client.push_blob(&reference, &desc, &mut provider).await {
            return Err(TransportError::UploadFailed { reference, source });
        }
        info!("Uploaded resource '{}' to {}", resource.name, reference);

        blob.rewind().await?;
        let mut message = Message::new(descriptor, resource).with_blob(blob);
        message.write_to(output).await?;
        message.into_parts().await?;
        Ok(())
    }
}
