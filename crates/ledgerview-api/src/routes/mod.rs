//! Route modules for the API server
//!
//! - view: ledger view page, HTMX fragment, user actions and JSON snapshot
//! - transactions: per-row approval toggle
//!
//! Each module follows a consistent structure:
//! - mod.rs: Module declaration and exports
//! - api.rs: JSON API and HTMX action endpoints
//! - page.rs: HTML rendering

pub mod transactions;
pub mod view;
