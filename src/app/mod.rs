mod dispatch;
mod orchestrator;
mod runtime;
mod shutdown;
mod types;


pub use orchestrator::MonitorOrchestrator;
pub use types::ShutdownReason;
