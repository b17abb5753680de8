pub mod config;
pub mod error;
pub mod job;
pub mod replay;
pub mod window;

pub use config::{BackfillConfig, Config, RegistryConfig};
pub use error::*;
pub use job::*;
pub use replay::*;
pub use window::*;
