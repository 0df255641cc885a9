//! Transaction routes - approval toggle on a listed row
//!
//! Structure:
//! - api.rs: HTMX endpoint
//! - page.rs: Row rendering shared with the view list

pub mod api;
pub mod page;

pub use api::htmx_transaction_approval;
pub use page::render_transaction_row;
