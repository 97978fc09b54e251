#![allow(clippy::uninlined_format_args)]

pub mod analysis;
pub mod api;
pub mod app;
pub mod config;
pub mod data;
pub mod debounce;
pub mod embed;
pub mod link;
pub mod logging;
pub mod product;
pub mod progress;
pub mod session;
pub mod social;
pub mod storage;
pub mod text;
pub mod trends;
pub mod ui;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use app::run;
