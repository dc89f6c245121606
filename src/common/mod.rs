//! Common utilities and types shared across galera-init

pub mod config;
pub mod env;
pub mod error;

pub use config::InitConfig;
pub use env::{EnvSource, ObjectKey, PodEnvironment, ProcessEnv};
pub use error::{Error, Result};
