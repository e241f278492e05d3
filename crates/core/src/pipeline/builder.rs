// Pipeline builder for assembling pipelines from registered stages
use super::core::Pipeline;
use super::registry::ProcessorRegistry;
use crate::config::constants::DEFAULT_STAGE_TIMEOUT;
use crate::error::{Result, TransportError};
use crate::message::ScratchSpace;
use std::sync::Arc;
use std::time::Duration;

/// Builder for constructing pipelines with registered processors
pub struct PipelineBuilder {
    name: String,
    registry: Arc<ProcessorRegistry>,
    stage_names: Vec<String>,
    stage_timeout: Duration,
    scratch: ScratchSpace,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new(name: impl Into<String>, registry: Arc<ProcessorRegistry>) -> Self {
        Self {
            name: name.into(),
            registry,
            stage_names: Vec::new(),
            stage_timeout: DEFAULT_STAGE_TIMEOUT,
            scratch: ScratchSpace::system(),
        }
    }

    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = timeout;
        self
    }

    pub fn with_scratch(mut self, scratch: ScratchSpace) -> Self {
        self.scratch = scratch;
        self
    }

    /// Append a stage by name
    pub fn add_stage(mut self, name: impl Into<String>) -> Result<Self> {
        let stage_name = name.into();
        if !self.registry.contains(&stage_name) {
            return Err(TransportError::invalid_config(format!(
                "Stage '{}' not found in registry (available: {:?})",
                stage_name,
                self.registry.list_processors()
            )));
        }
        self.stage_names.push(stage_name);
        Ok(self)
    }

    /// Append multiple stages by name, in order
    pub fn add_stages<I, S>(mut self, names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self = self.add_stage(name)?;
        }
        Ok(self)
    }

    /// Build the pipeline
    pub fn build(self) -> Result<Pipeline> {
        let mut pipeline = Pipeline::new(self.name)
            .with_stage_timeout(self.stage_timeout)
            .with_scratch(self.scratch);

        for name in &self.stage_names {
            let processor = self.registry.create(name).ok_or_else(|| {
                TransportError::invalid_config(format!("Stage '{}' not found", name))
            })?;
            pipeline = pipeline.add_processor(processor);
        }

        Ok(pipeline)
    }
}
