// Shared test stages and fixtures
#![allow(dead_code)]

use async_trait::async_trait;
use cdtransport_core::descriptor::{Access, ComponentDescriptor, Resource};
use cdtransport_core::error::{Result, TransportError};
use cdtransport_core::message::read_message;
use cdtransport_core::pipeline::{StageContext, StreamProcessor};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Route stage logs to the test harness, filtered by `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn descriptor_and_resource(access: Access) -> (ComponentDescriptor, Resource) {
    let resource = Resource::new("app-blob", "1.2.0", "oci-blob", access);
    let descriptor = ComponentDescriptor::new("acme/app", "1.2.0").with_resource(resource.clone());
    (descriptor, resource)
}

/// Number of entries left in a scratch directory
pub fn leftover_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

/// Attaches fixed bytes as the blob, replacing any existing one
pub struct SeedBlobStage {
    pub data: Vec<u8>,
}

#[async_trait]
impl StreamProcessor for SeedBlobStage {
    fn name(&self) -> String {
        "SeedBlob".to_string()
    }

    async fn process(
        &self,
        ctx: &StageContext,
        input: &mut (dyn AsyncRead + Unpin + Send),
        output: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<()> {
        let mut message = read_message(input, &ctx.scratch).await?;
        let mut blob = ctx.scratch.create()?;
        blob.write_all(&self.data).await?;
        blob.rewind().await?;
        if let Some(previous) = message.blob.replace(blob) {
            previous.close().await?;
        }
        message.write_to(output).await?;
        message.into_parts().await?;
        Ok(())
    }
}

/// Appends one marker byte to the blob, creating it if absent
pub struct MarkerStage {
    pub marker: u8,
}

#[async_trait]
impl StreamProcessor for MarkerStage {
    fn name(&self) -> String {
        format!("Marker-{}", self.marker as char)
    }

    async fn process(
        &self,
        ctx: &StageContext,
        input: &mut (dyn AsyncRead + Unpin + Send),
        output: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<()> {
        let mut message = read_message(input, &ctx.scratch).await?;
        let mut blob = ctx.scratch.create()?;
        if let Some(mut previous) = message.blob.take() {
            tokio::io::copy(&mut previous, &mut blob).await?;
            previous.close().await?;
        }
        blob.write_all(&[self.marker]).await?;
        blob.rewind().await?;
        message.blob = Some(blob);
        message.write_to(output).await?;
        message.into_parts().await?;
        Ok(())
    }
}

/// Passes the message through and copies the blob bytes out for inspection
#[derive(Default)]
pub struct CaptureStage {
    pub blob: Arc<Mutex<Option<Vec<u8>>>>,
    pub resource: Arc<Mutex<Option<Resource>>>,
}

#[async_trait]
impl StreamProcessor for CaptureStage {
    fn name(&self) -> String {
        "Capture".to_string()
    }

    async fn process(
        &self,
        ctx: &StageContext,
        input: &mut (dyn AsyncRead + Unpin + Send),
        output: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<()> {
        let mut message = read_message(input, &ctx.scratch).await?;
        if let Some(blob) = message.blob.as_mut() {
            let mut bytes = Vec::new();
            blob.read_to_end(&mut bytes).await?;
            blob.rewind().await?;
            *self.blob.lock().unwrap() = Some(bytes);
        }
        *self.resource.lock().unwrap() = Some(message.resource.clone());
        message.write_to(output).await?;
        message.into_parts().await?;
        Ok(())
    }
}

/// Counts invocations and passes the message through unchanged
pub struct CountingStage {
    pub calls: Arc<AtomicUsize>,
}

impl CountingStage {
    pub fn new() -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

#[async_trait]
impl StreamProcessor for CountingStage {
    fn name(&self) -> String {
        "Counting".to_string()
    }

    async fn process(
        &self,
        ctx: &StageContext,
        input: &mut (dyn AsyncRead + Unpin + Send),
        output: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut message = read_message(input, &ctx.scratch).await?;
        message.write_to(output).await?;
        message.into_parts().await?;
        Ok(())
    }
}

/// Decodes its input, then fails
pub struct FailingStage;

#[async_trait]
impl StreamProcessor for FailingStage {
    fn name(&self) -> String {
        "Failing".to_string()
    }

    async fn process(
        &self,
        ctx: &StageContext,
        input: &mut (dyn AsyncRead + Unpin + Send),
        _output: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<()> {
        let _message = read_message(input, &ctx.scratch).await?;
        Err(TransportError::unsupported_access("failing stage"))
    }
}

/// Decodes its input, then never completes
pub struct StallingStage;

#[async_trait]
impl StreamProcessor for StallingStage {
    fn name(&self) -> String {
        "Stalling".to_string()
    }

    async fn process(
        &self,
        ctx: &StageContext,
        input: &mut (dyn AsyncRead + Unpin + Send),
        _output: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<()> {
        let _message = read_message(input, &ctx.scratch).await?;
        std::future::pending::<()>().await;
        Ok(())
    }
}
