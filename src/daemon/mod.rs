//! Long-running side of the tool: the scheduling loop, signal handling, and
//! multi-channel notifications.

pub mod loop_main;
pub mod notifications;
pub mod signals;
