/// Centralized error handling for the transport core
pub mod registry;
pub mod transport;

pub use registry::{RegistryError, RegistryResult};
pub use transport::{ErrorKind, Result, TransportError};
