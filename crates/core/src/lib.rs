//! Resource transport pipeline for component descriptors.
//!
//! A resource travels through an ordered list of [`StreamProcessor`] stages
//! as a framed [`Message`]: descriptor, resource and an optional blob. Each
//! stage reads the previous stage's message from a scratch file and writes a
//! new one; the last message is decoded and handed back to the caller.

pub mod commands;
pub mod config;
pub mod descriptor;
pub mod digest;
pub mod error;
pub mod filter;
pub mod message;
pub mod pipeline;
pub mod processors;
pub mod registry;

pub use commands::{TransportReport, transport_component};
pub use descriptor::{Access, ComponentDescriptor, RepositoryContext, Resource};
pub use digest::Digest;
pub use error::{ErrorKind, RegistryError, Result, TransportError};
pub use message::{Message, ScratchSpace};
pub use pipeline::{ExecContext, Pipeline, PipelineBuilder, StageContext, StreamProcessor};
