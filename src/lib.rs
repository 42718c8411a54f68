pub mod annotate;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod progress;
pub mod scanner;
pub mod session;
