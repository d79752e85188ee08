//! Swaps: atomic slot replacement under rotation and warranty policies.

pub mod errors;
pub mod service;

pub use errors::SwapServiceError;
pub use service::*;
