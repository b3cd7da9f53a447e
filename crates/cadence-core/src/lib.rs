//! Core types and trait definitions for the Cadence habit tracker.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the two pieces of real logic (the occurrence indexer in [`schedule`] and
//! the streak accumulator in [`streak`]) plus the [`store::HabitStore`]
//! abstraction and the [`tracker::Tracker`] service that ties them together.

pub mod category;
pub mod error;
pub mod events;
pub mod habit;
pub mod memory;
pub mod progress;
pub mod schedule;
pub mod store;
pub mod streak;
pub mod tracker;

pub use error::{Error, Result};
