//! Command line configuration for cdtransport

use std::path::{Path, PathBuf};
use std::time::Duration;

use cdtransport_core::config::constants::LOCAL_OCI_BLOB_TYPE;
use cdtransport_core::descriptor::{ComponentDescriptor, RepositoryContext};
use cdtransport_core::error::TransportError;
use cdtransport_core::filter::{AccessTypeFilter, AllOf, Filter, ResourceTypeFilter};
use cdtransport_core::message::ScratchSpace;
use cdtransport_core::pipeline::ExecContext;
use cdtransport_core::processors::{DOWNLOAD_STAGE, REWRITE_STAGE, UPLOAD_STAGE};

pub type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Stages of a `transport` run when none are given
pub const DEFAULT_STAGES: [&str; 3] = [DOWNLOAD_STAGE, UPLOAD_STAGE, REWRITE_STAGE];

/// Blob store used when `--store` is not given
pub const DEFAULT_STORE_DIR: &str = ".cdtransport/store";

/// Directory next to the executable that receives log files
pub const LOG_DIR: &str = "logs";

/// Settings of one `transport` run
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub descriptor: PathBuf,
    pub target: String,
    pub source: Option<String>,
    pub store: PathBuf,
    pub resource_types: Vec<String>,
    pub stages: Vec<String>,
    pub stage_timeout: Duration,
    pub timeout: Option<Duration>,
    pub scratch_dir: Option<PathBuf>,
    pub output_path: PathBuf,
}

impl TransportConfig {
    pub fn validate(&self) -> Result<(), TransportError> {
        if self.target.trim().is_empty() {
            return Err(TransportError::invalid_config("target repository is empty"));
        }
        if self.stages.is_empty() {
            return Err(TransportError::invalid_config("no stages given"));
        }
        if self.stage_timeout.is_zero() {
            return Err(TransportError::invalid_config("stage timeout must be positive"));
        }
        Ok(())
    }

    /// Source repository, falling back to the descriptor's current context
    pub fn source_context(
        &self,
        descriptor: &ComponentDescriptor,
    ) -> Result<RepositoryContext, TransportError> {
        match &self.source {
            Some(url) => Ok(RepositoryContext::new(url.clone())),
            None => descriptor.current_repository_context().cloned().ok_or_else(|| {
                TransportError::invalid_config(format!(
                    "{}:{} has no repository context, pass --source",
                    descriptor.name, descriptor.version
                ))
            }),
        }
    }

    pub fn target_context(&self) -> RepositoryContext {
        RepositoryContext::new(self.target.clone())
    }

    /// Local blobs only, narrowed to the requested resource types
    pub fn filter(&self) -> Box<dyn Filter> {
        let local = AccessTypeFilter::new([LOCAL_OCI_BLOB_TYPE]);
        if self.resource_types.is_empty() {
            return Box::new(local);
        }
        Box::new(AllOf::new(vec![
            Box::new(local),
            Box::new(ResourceTypeFilter::new(self.resource_types.clone())),
        ]))
    }

    pub fn scratch(&self) -> ScratchSpace {
        match &self.scratch_dir {
            Some(dir) => ScratchSpace::in_dir(dir.clone()),
            None => ScratchSpace::system(),
        }
    }

    pub fn exec_context(&self) -> ExecContext {
        match self.timeout {
            Some(timeout) => ExecContext::with_timeout(timeout),
            None => ExecContext::unbounded(),
        }
    }
}

/// Read a component descriptor. JSON is accepted as a subset of YAML.
pub fn load_descriptor(path: &Path) -> CliResult<ComponentDescriptor> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Unable to read descriptor {}: {}", path.display(), e))?;
    let descriptor = serde_yaml::from_str(&content)
        .map_err(|e| format!("Invalid descriptor {}: {}", path.display(), e))?;
    Ok(descriptor)
}

/// Write a component descriptor as JSON for `.json` paths, YAML otherwise
pub fn write_descriptor(path: &Path, descriptor: &ComponentDescriptor) -> CliResult<()> {
    let content = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::to_string_pretty(descriptor)?,
        _ => serde_yaml::to_string(descriptor)?,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}
