//! Logging subsystem: the rotating plain-text cycle log.

pub mod backup_log;
