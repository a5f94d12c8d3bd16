//! Background Tasks Module
//!
//! Periodic maintenance for the simple cache tier.

mod cleanup;

pub use cleanup::spawn_cleanup_task;
