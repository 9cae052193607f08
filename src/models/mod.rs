//! Data Models Module
//!
//! This module contains all data structures used throughout the directory
//! service: accounts, restaurants and their satellites, and request/response
//! types with their validation rules.

pub mod auth;
pub mod offering;
pub mod requests;
pub mod restaurant;
pub mod review;
pub mod user;

// Re-export commonly used types
pub use auth::*;
pub use offering::*;
pub use requests::*;
pub use restaurant::*;
pub use review::*;
pub use user::*;
