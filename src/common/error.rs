//! Error types for galera-init

use crate::init::sequencer::InitStep;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === Environment Errors ===
    #[error("Environment error: {0}")]
    Environment(String),

    #[error("Invalid Pod ordinal in '{pod}': {reason}")]
    OrdinalParse { pod: String, reason: String },

    // === Kubernetes Errors ===
    #[error("Error creating Kubernetes client: {0}")]
    ClusterClient(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Error waiting for previous Pod '{pod}' to be ready: {reason}")]
    PredecessorWait { pod: String, reason: String },

    // === File Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error accessing file {file}: {source}")]
    File {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Galera config error: {0}")]
    GaleraConfig(String),

    // === Config Errors ===
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // === Sequencing ===
    #[error("{step}: {source}")]
    Step {
        step: InitStep,
        #[source]
        source: Box<Error>,
    },

    // === Generic ===
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Did a lookup fail because the object does not exist?
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound(_) => true,
            Error::Kube(kube::Error::Api(resp)) => resp.code == 404,
            Error::Step { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Attach the sequencer step that produced this error
    pub fn in_step(self, step: InitStep) -> Self {
        Error::Step {
            step,
            source: Box::new(self),
        }
    }

    /// The step this error was raised in, if it came out of the sequencer
    pub fn step(&self) -> Option<InitStep> {
        match self {
            Error::Step { step, .. } => Some(*step),
            _ => None,
        }
    }
}

impl From<::config::ConfigError> for Error {
    fn from(e: ::config::ConfigError) -> Self {
        Error::InvalidConfig(e.to_string())
    }
}
