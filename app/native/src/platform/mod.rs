//! Host platform helpers for Daywall.
//!
//! - [`path`] - Shell-like path expansion and the application data directory
//! - [`thread`] - Named worker threads

pub mod path;
pub mod thread;

pub use path::{data_dir, data_subdir, expand, expand_and_resolve};
pub use thread::spawn_named_thread;
