#![forbid(unsafe_code)]

//! Monika backup (mbk) — scheduled save-data backups for Monika After Story.
//!
//! The tool locates the game's persistent-data directory for the host OS,
//! estimates whether a compressed copy will fit on disk, writes a timestamped
//! zip archive, and records every attempt in a rotating log. A scheduling
//! loop repeats this at a user-chosen interval until a backup limit is
//! reached or the operator confirms a Ctrl-C.
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use monika_backup::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use monika_backup::core::config::Config;
//! use monika_backup::backup::frequency::Frequency;
//! ```

pub mod prelude;

pub mod backup;
pub mod core;
pub mod daemon;
pub mod logger;
pub mod platform;
