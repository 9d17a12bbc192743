//! `delf` - Find and delete files and folders by pattern, with safety checks.

#![warn(
    missing_debug_implementations,
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]

pub mod app;
pub mod classifier;
pub mod crawler;
pub mod delete;
pub mod display;
pub mod error;
pub mod exclusion;
pub mod filters;
pub mod gate;
pub mod options;
pub mod privilege;
pub mod prompt;
pub mod search;
pub mod types;
