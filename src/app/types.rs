use std::fmt;

/// Why the monitor stopped
#[derive(Debug, Clone, PartialEq)]
pub enum ShutdownReason {
    /// A shutdown event reached the session (keyboard, signal, watch duration)
    Requested(String),
    /// The orchestrator's cancellation token fired
    Cancelled,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::Requested(reason) => write!(f, "requested: {}", reason),
            ShutdownReason::Cancelled => f.write_str("cancelled"),
        }
    }
}
