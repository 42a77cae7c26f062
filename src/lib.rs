//! Stackscan - Repository Stack Analyzer
//!
//! Clones public repositories, detects the technologies they use and
//! reconciles the result against a catalog of known stacks.

pub mod cli;
pub mod config;
pub mod context;
pub mod di;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod models;
pub mod server;
pub mod services;
pub mod store;
pub mod workspace;

pub use di::FromRef;
