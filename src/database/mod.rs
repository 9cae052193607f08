//! Database Module
//!
//! Database connection management and store selection.

pub mod connection;

// Re-export commonly used types
pub use connection::{DatabaseConfig, DatabasePool};
