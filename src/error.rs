use std::io;
use std::time::Duration;
use thiserror::Error;

/// Custom error type for sysdash
#[derive(Error, Debug)]
pub enum SysdashError {
    #[error("Metric collection failed: {0}")]
    MetricCollection(String),

    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),
}

/// Result type alias for sysdash
pub type Result<T> = std::result::Result<T, SysdashError>;

impl SysdashError {
    /// Create a metric collection error
    pub fn metric_collection<S: Into<String>>(msg: S) -> Self {
        SysdashError::MetricCollection(msg.into())
    }

    pub fn resource_exhausted<S: Into<String>>(msg: S) -> Self {
        SysdashError::ResourceExhausted(msg.into())
    }
}

/// Outcome of an external vendor tool invocation that did not produce usable output.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("executable `{0}` not found")]
    Missing(String),

    #[error("`{program}` exited with status {code:?}")]
    ExitStatus { program: String, code: Option<i32> },

    #[error("`{program}` timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("malformed output from `{program}`: {detail}")]
    Malformed { program: String, detail: String },

    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl ProbeError {
    pub fn malformed<P: Into<String>, D: Into<String>>(program: P, detail: D) -> Self {
        ProbeError::Malformed {
            program: program.into(),
            detail: detail.into(),
        }
    }

    /// True when the OS refused to start the child (out of processes, file handles, memory).
    ///
    /// A missing executable or a denied permission is an ordinary probe failure instead.
    pub fn is_resource_exhaustion(&self) -> bool {
        match self {
            ProbeError::Spawn { source, .. } => !matches!(
                source.kind(),
                io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
            ),
            _ => false,
        }
    }
}
