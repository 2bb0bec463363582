//! Domain models
//!
//! This module contains all domain models used throughout the application.

pub mod contest;
pub mod participation;
pub mod profile;
pub mod submission;

pub use contest::*;
pub use participation::*;
pub use profile::*;
pub use submission::*;
