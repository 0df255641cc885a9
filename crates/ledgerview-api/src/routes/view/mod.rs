//! Ledger view routes - the employee select, the transaction list and
//! "View More"
//!
//! Structure:
//! - api.rs: JSON snapshot and HTMX action endpoints
//! - page.rs: Full page and fragment rendering

pub mod api;
pub mod page;

pub use api::{api_view, htmx_view, htmx_view_mount, htmx_view_more, htmx_view_select};
pub use page::{page_view, render_view};
