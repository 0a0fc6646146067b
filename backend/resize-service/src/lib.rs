//! Resize Service
//!
//! Accepts image uploads, resizes and re-encodes them under an optional size
//! budget, stores the result in S3 and tracks progress in a Redis job ledger.

pub mod config;
pub mod error;
pub mod handlers;
pub mod imaging;
pub mod jobs;
pub mod metrics;
pub mod models;
pub mod services;
pub mod storage;

// Public re-exports
pub use config::Config;
pub use error::{AppError, Result};
