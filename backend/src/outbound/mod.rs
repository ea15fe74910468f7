//! Outbound adapters implementing domain ports.
//!
//! - **memory**: in-process change feed hub and row tables
//!
//! Adapters are thin translators between domain types and their backing
//! transport. They contain no reconciliation logic.

pub mod memory;
