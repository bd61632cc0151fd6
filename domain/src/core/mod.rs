//! Core domain concepts shared across all subdomains.
//!
//! - [`error`]: domain-level errors (format, context, config parsing)
//! - [`string`]: UTF-8 safe string helpers

pub mod error;
pub mod string;
