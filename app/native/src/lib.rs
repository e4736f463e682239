//! Daywall - a fresh AI-generated wallpaper every day.
//!
//! The library holds the generation pipeline, its collaborators, and the job
//! scheduler. The `daywall` binary exposes them through the CLI.

// Core modules
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod schema;

// Generation
pub mod generator;
pub mod pipeline;
pub mod wallpaper;

// Scheduling and host integration
pub mod platform;
pub mod scheduler;
