//! Backup subsystem: frequency parsing, space estimation, archiving, and the
//! per-cycle orchestrator.

pub mod archive;
pub mod estimate;
pub mod frequency;
pub mod orchestrator;
