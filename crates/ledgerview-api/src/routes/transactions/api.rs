//! Transaction endpoints
//!
//! - htmx_transaction_approval: store an approval change, return the row

use axum::extract::{Path, State};
use axum::response::Html;

use super::page::render_transaction_row;
use crate::{parse_form, ApiError, ApiResult, AppState};

/// HTMX: Toggle the approval flag of one transaction
///
/// Form field `approved` is `true`/`false` (`on`/`off` from a plain
/// checkbox). Responds with the re-rendered row, or nothing when the row is
/// no longer displayed.
pub async fn htmx_transaction_approval(
    state: State<AppState>,
    path: Path<String>,
    body: String,
) -> ApiResult<Html<String>> {
    let transaction_id = path.0;
    let params = parse_form(&body);
    let approved = match params.get("approved").map(String::as_str) {
        Some("true") | Some("on") => true,
        Some("false") | Some("off") | None => false,
        Some(other) => {
            return Err(ApiError::BadRequest {
                message: format!("approved must be true or false, got '{}'", other),
            })
        }
    };

    state.coordinator.set_transaction_approval(&transaction_id, approved).await?;

    let snapshot = state.coordinator.snapshot().await;
    let row = snapshot
        .displayed_transactions()
        .and_then(|rows| rows.iter().find(|t| t.id == transaction_id))
        .map(render_transaction_row)
        .unwrap_or_default();
    Ok(Html(row))
}
