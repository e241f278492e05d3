use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cdtransport_core::config::constants::DEFAULT_STAGE_TIMEOUT;

use crate::config::{DEFAULT_STAGES, DEFAULT_STORE_DIR};

#[derive(Subcommand)]
#[command(version, about, long_about = None)]
pub enum Commands {
    /// Move the local blobs of a component into a target repository
    Transport {
        /// Component descriptor (YAML or JSON)
        #[arg(required = true)]
        descriptor: PathBuf,
        /// Target repository base URL
        #[clap(short = 't', long)]
        target: String,
        /// Source repository base URL, defaults to the descriptor's current context
        #[clap(short = 's', long)]
        source: Option<String>,
        /// Root directory of the blob store
        #[clap(long, default_value = DEFAULT_STORE_DIR)]
        store: PathBuf,
        /// Only transport resources of these types
        #[clap(short = 'r', long = "resource-type")]
        resource_types: Vec<String>,
        /// Stages to run, in order
        #[clap(long = "stage", value_delimiter = ',', default_values = DEFAULT_STAGES)]
        stages: Vec<String>,
        /// Per-stage timeout in seconds
        #[clap(long, default_value_t = DEFAULT_STAGE_TIMEOUT.as_secs())]
        stage_timeout: u64,
        /// Timeout for the whole run in seconds
        #[clap(long)]
        timeout: Option<u64>,
        /// Directory for scratch files, defaults to the system temp dir
        #[clap(long)]
        scratch_dir: Option<PathBuf>,
        /// Output path of the updated descriptor
        #[clap(short = 'o', long, default_value = "component-descriptor.yaml")]
        output_path: PathBuf,
    },

    /// Encode a resource of a descriptor into a processor message
    Encode {
        /// Component descriptor (YAML or JSON)
        #[arg(required = true)]
        descriptor: PathBuf,
        /// Name of the resource to encode
        #[clap(short = 'r', long)]
        resource: String,
        /// File attached as the resource blob
        #[clap(short = 'b', long)]
        blob: Option<PathBuf>,
        /// Output message path
        #[clap(short = 'o', long, default_value = "resource.cdtm")]
        output_path: PathBuf,
    },

    /// Print the contents of a processor message
    Inspect {
        /// Message file
        #[arg(required = true)]
        message: PathBuf,
    },
}

/// Component descriptor transport
#[derive(Parser)]
#[command(about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}
