//! Node-local Galera files
//!
//! - Config and state directory access
//! - Marker file names shared with `mariadbd`
//! - Config rendering and patching

pub mod config;
pub mod files;
pub mod state;

pub use config::{ConfigRenderer, GaleraConfigRenderer};
pub use files::{FileManager, MemFileManager, StateStore};
