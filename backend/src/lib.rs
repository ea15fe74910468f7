//! Client-side sync core for the recruitment back office.

pub mod config;
pub mod domain;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::RealtimeSettings;
