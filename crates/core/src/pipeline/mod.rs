// Pipeline module - staged processing of resource messages

pub mod builder;
pub mod core;
pub mod registry;

// Re-export core types
pub use self::builder::*;
pub use self::core::*;
pub use self::registry::*;
