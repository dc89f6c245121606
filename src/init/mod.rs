//! Init coordinator
//!
//! Decides, once per Pod start, whether this node bootstraps a new Galera
//! cluster, waits for its predecessor, and which stale state must go first.

pub mod bootstrap;
pub mod cleanup;
pub mod context;
pub mod sequencer;
pub mod shutdown;
pub mod wait;

pub use context::InitContext;
pub use sequencer::{FailurePolicy, InitOutcome, InitStep, Initializer};
pub use shutdown::{install_signal_handlers, Shutdown};
