#![allow(clippy::uninlined_format_args)]

pub mod api;
pub mod app;
pub mod config;
pub mod data;
pub mod feed;
pub mod live;
pub mod thread;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use app::{run, Command};
