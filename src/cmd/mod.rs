// ============================================================================
// src/cmd/mod.rs – command subsystem root
// ============================================================================
pub mod base; // core shell execution utilities (Cmd, OutputData)
pub mod devices; // mountforge devices
pub mod wizard; // mountforge [wizard]

// Re-export common types for convenience:
pub use base::{Cmd, OutputData};
