// Processor messages: the unit exchanged between pipeline stages

pub mod codec;
pub mod scratch;

pub use codec::{read_message, write_message};
pub use scratch::{ScratchFile, ScratchSpace};

use tokio::io::{AsyncRead, AsyncWrite};

use crate::descriptor::{ComponentDescriptor, Resource};
use crate::error::Result;

/// Blob attached to a decoded message. Dropping it deletes the backing file.
pub type BlobReader = ScratchFile;

/// A decoded (descriptor, resource, optional blob) triple
#[derive(Debug)]
pub struct Message {
    pub descriptor: ComponentDescriptor,
    pub resource: Resource,
    pub blob: Option<BlobReader>,
}

impl Message {
    pub fn new(descriptor: ComponentDescriptor, resource: Resource) -> Self {
        Self {
            descriptor,
            resource,
            blob: None,
        }
    }

    pub fn with_blob(mut self, blob: BlobReader) -> Self {
        self.blob = Some(blob);
        self
    }

    /// Encode this message, streaming the blob from its current position
    pub async fn write_to<W>(&mut self, writer: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin + Send + ?Sized,
    {
        match self.blob.as_mut() {
            Some(blob) => {
                let blob: &mut (dyn AsyncRead + Unpin + Send) = blob;
                write_message(writer, &self.descriptor, &self.resource, Some(blob)).await
            }
            None => write_message(writer, &self.descriptor, &self.resource, None).await,
        }
    }

    /// Split off the metadata, closing any attached blob
    pub async fn into_parts(self) -> Result<(ComponentDescriptor, Resource)> {
        if let Some(blob) = self.blob {
            blob.close().await?;
        }
        Ok((self.descriptor, self.resource))
    }
}
