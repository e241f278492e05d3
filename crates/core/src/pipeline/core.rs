// Pipeline core - staged stream processing of one resource at a time

use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::constants::DEFAULT_STAGE_TIMEOUT;
use crate::descriptor::{ComponentDescriptor, Resource};
use crate::error::{Result, TransportError};
use crate::message::{ScratchFile, ScratchSpace, read_message, write_message};

/// Bound handed down by the caller of a pipeline run
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecContext {
    /// Absolute deadline of the whole run, if any
    pub deadline: Option<Instant>,
}

impl ExecContext {
    pub fn unbounded() -> Self {
        Self { deadline: None }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(deadline_after(Instant::now(), timeout))
    }
}

/// Stand-in for "no bound" when a timeout does not fit in an `Instant`
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// `now + timeout`, saturating to a far-future instant on overflow
fn deadline_after(now: Instant, timeout: Duration) -> Instant {
    now.checked_add(timeout).unwrap_or(now + FAR_FUTURE)
}

/// Bounded context of a single stage invocation
#[derive(Debug, Clone)]
pub struct StageContext {
    /// 1-based position of the stage in its pipeline
    pub index: usize,
    pub name: String,
    pub deadline: Instant,
    /// Where the stage should materialize blobs
    pub scratch: ScratchSpace,
}

impl StageContext {
    pub fn new(index: usize, name: impl Into<String>, deadline: Instant, scratch: ScratchSpace) -> Self {
        Self {
            index,
            name: name.into(),
            deadline,
            scratch,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

/// A pipeline stage: reads one message from `input`, writes one to `output`.
///
/// Both streams are borrowed for the duration of the call only. The
/// pipeline abandons a stage whose future has not completed by
/// `ctx.deadline`; work the stage runs outside its future is not stopped.
#[async_trait]
pub trait StreamProcessor: Send + Sync {
    fn name(&self) -> String;

    async fn process(
        &self,
        ctx: &StageContext,
        input: &mut (dyn AsyncRead + Unpin + Send),
        output: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<()>;
}

/// Pipeline - drives a resource through an ordered list of stages
pub struct Pipeline {
    name: String,
    processors: Vec<Box<dyn StreamProcessor>>,
    stage_timeout: Duration,
    scratch: ScratchSpace,
}

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            processors: Vec::new(),
            stage_timeout: DEFAULT_STAGE_TIMEOUT,
            scratch: ScratchSpace::system(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = timeout;
        self
    }

    /// Create inter-stage buffers in `scratch` instead of the system temp dir
    pub fn with_scratch(mut self, scratch: ScratchSpace) -> Self {
        self.scratch = scratch;
        self
    }

    pub fn add_processor(mut self, processor: Box<dyn StreamProcessor>) -> Self {
        debug!(
            "Adding stage '{}' to pipeline '{}' at position {}",
            processor.name(),
            self.name,
            self.processors.len() + 1
        );
        self.processors.push(processor);
        self
    }

    pub fn stage_timeout(&self) -> Duration {
        self.stage_timeout
    }

    pub fn stage_names(&self) -> Vec<String> {
        self.processors.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Run `resource` of `descriptor` through every stage in order.
    ///
    /// The inputs are never modified; on success the descriptor and resource
    /// decoded from the last stage's output are returned. Any blob attached
    /// to that output is discarded.
    pub async fn process(
        &self,
        ctx: &ExecContext,
        descriptor: &ComponentDescriptor,
        resource: &Resource,
    ) -> Result<(ComponentDescriptor, Resource)> {
        debug!(
            "Executing pipeline '{}' with {} stages for resource '{}' of {}:{}",
            self.name,
            self.processors.len(),
            resource.name,
            descriptor.name,
            descriptor.version
        );

        let mut current = self.scratch.create()?;
        write_message(&mut current, descriptor, resource, None).await?;

        for (i, processor) in self.processors.iter().enumerate() {
            current = self.run_stage(ctx, i + 1, processor.as_ref(), current).await?;
        }

        current.rewind().await?;
        let message = read_message(&mut current, &self.scratch).await?;
        let processed = message.into_parts().await?;
        current.close().await?;

        debug!("Pipeline '{}' executed successfully", self.name);
        Ok(processed)
    }

    async fn run_stage(
        &self,
        ctx: &ExecContext,
        index: usize,
        processor: &dyn StreamProcessor,
        mut input: ScratchFile,
    ) -> Result<ScratchFile> {
        let name = processor.name();
        let started = Instant::now();
        let deadline = self.stage_deadline(ctx, started);

        if started >= deadline {
            return Err(TransportError::Timeout {
                after: Duration::ZERO,
            }
            .in_stage(index, name));
        }

        if let Err(e) = input.rewind().await {
            return Err(TransportError::from(e).in_stage(index, name));
        }
        let mut output = match self.scratch.create() {
            Ok(output) => output,
            Err(e) => return Err(TransportError::from(e).in_stage(index, name)),
        };

        let stage_ctx = StageContext::new(index, name.clone(), deadline, self.scratch.clone());
        debug!(
            "Processing stage {}: '{}' (bound {:?})",
            index,
            name,
            stage_ctx.remaining()
        );

        let outcome = tokio::time::timeout_at(
            deadline,
            processor.process(&stage_ctx, &mut input, &mut output),
        )
        .await;

        if let Err(e) = input.close().await {
            warn!("Failed to remove input buffer of stage '{}': {}", name, e);
        }

        match outcome {
            Ok(Ok(())) => {
                debug!("Stage '{}' processed successfully in {:?}", name, started.elapsed());
                Ok(output)
            }
            Ok(Err(e)) => {
                debug!("Stage '{}' failed: {}", name, e);
                Err(e.in_stage(index, name))
            }
            Err(_) => {
                let after = deadline.saturating_duration_since(started);
                warn!("Stage '{}' did not finish within {:?}", name, after);
                Err(TransportError::Timeout { after }.in_stage(index, name))
            }
        }
    }

    fn stage_deadline(&self, ctx: &ExecContext, now: Instant) -> Instant {
        let bound = deadline_after(now, self.stage_timeout);
        match ctx.deadline {
            Some(parent) => parent.min(bound),
            None => bound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stage_deadline_respects_parent() {
        let pipeline = Pipeline::new("test").with_stage_timeout(Duration::from_secs(60));
        let now = Instant::now();

        let unbounded = pipeline.stage_deadline(&ExecContext::unbounded(), now);
        assert_eq!(unbounded, now + Duration::from_secs(60));

        let parent = ExecContext::with_deadline(now + Duration::from_secs(5));
        assert_eq!(pipeline.stage_deadline(&parent, now), now + Duration::from_secs(5));

        let loose = ExecContext::with_deadline(now + Duration::from_secs(600));
        assert_eq!(pipeline.stage_deadline(&loose, now), now + Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_oversized_timeouts_saturate() {
        let now = Instant::now();
        assert_eq!(deadline_after(now, Duration::MAX), now + FAR_FUTURE);

        let pipeline = Pipeline::new("test").with_stage_timeout(Duration::MAX);
        let deadline = pipeline.stage_deadline(&ExecContext::with_timeout(Duration::MAX), now);
        assert!(deadline > now + Duration::from_secs(86400 * 365));
    }

    #[test]
    fn test_default_stage_timeout() {
        let pipeline = Pipeline::new("test");
        assert_eq!(pipeline.stage_timeout(), DEFAULT_STAGE_TIMEOUT);
        assert!(pipeline.is_empty());
    }
}
