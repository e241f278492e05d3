// Points relocated resources at their new remote coordinate

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use crate::descriptor::{Access, OciBlobAccess, RepositoryContext};
use crate::digest::Digest;
use crate::error::{Result, TransportError};
use crate::message::{Message, read_message};
use crate::pipeline::{StageContext, StreamProcessor};
use crate::registry::upload_reference;

/// Replaces a `localOciBlob` access with an `ociBlob` access in `target`.
///
/// Runs after [`LocalBlobUploader`](super::LocalBlobUploader), which leaves
/// the access untouched. Digest and size are taken from the attached blob,
/// which is forwarded unchanged.
pub struct AccessRewriter {
    target: RepositoryContext,
}

impl AccessRewriter {
    pub fn new(target: RepositoryContext) -> Self {
        Self { target }
    }
}

#[async_trait]
impl StreamProcessor for AccessRewriter {
    fn name(&self) -> String {
        "AccessRewriter".to_string()
    }

    async fn process(
        &self,
        ctx: &StageContext,
        input: &mut (dyn AsyncRead + Unpin + Send),
        output: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<()> {
        let mut message = read_message(input, &ctx.scratch).await?;

        if !matches!(message.resource.access, Access::LocalOciBlob(_)) {
            return Err(TransportError::unsupported_access(
                message.resource.access.type_name(),
            ));
        }
        let blob = message.blob.as_mut().ok_or_else(|| {
            TransportError::malformed(format!(
                "resource '{}' carries no blob",
                message.resource.name
            ))
        })?;

        let (digest, size) = Digest::from_reader(&mut *blob).await?;
        blob.rewind().await?;

        let reference = upload_reference(
            &self.target,
            &message.descriptor.name,
            &message.descriptor.version,
        );
        debug!(
            "Rewriting access of resource '{}' to {}@{}",
            message.resource.name, reference, digest
        );
        message.resource.access = Access::OciBlob(OciBlobAccess {
            reference,
            media_type: message.resource.resource_type.clone(),
            digest: digest.to_string(),
            size,
        });

        message.write_to(output).await?;
        message.into_parts().await?;
        Ok(())
    }
}
