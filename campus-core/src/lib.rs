//! Campus Core
//!
//! Shared types for the Campus course-management services.
//!
//! This crate contains:
//! - Query keys: names for cached associations (`courses/42/lessons`)
//! - Poll configuration: what to refresh, how often, and when to give up
//! - Domain types: course, lesson, enrollment and discussion records

pub mod domain;
pub mod key;
pub mod poll;

pub use key::{KeyError, KeyPart, QueryKey};
pub use poll::{PollConfig, PollConfigError};
