pub mod config;
pub mod error;
pub mod mcargument;
pub mod platform;
pub mod runtime;

pub use config::RuntimeConfig;
pub use error::LaunchError;
