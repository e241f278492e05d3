//! Constants for the transport core

use std::time::Duration;

/// Default bound for a single pipeline stage
pub const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(60);

/// Leading bytes of every processor message
pub const MESSAGE_MAGIC: &[u8; 4] = b"CDTM";

/// Current message frame version
pub const MESSAGE_VERSION: u8 = 1;

/// Upper bound for a structured section or a single blob chunk
pub const MAX_SECTION_LEN: u32 = 64 * 1024 * 1024;

/// Chunk size used when writing blob bytes into a message
pub const BLOB_CHUNK_LEN: usize = 64 * 1024;

/// Prefix for scratch files created by the pipeline
pub const SCRATCH_PREFIX: &str = "cdtransport-";

/// Access type names as they appear in descriptors
pub const LOCAL_OCI_BLOB_TYPE: &str = "localOciBlob";
pub const OCI_BLOB_TYPE: &str = "ociBlob";
pub const OCI_REGISTRY_TYPE: &str = "ociRegistry";
