//! Ledger view endpoints - JSON snapshot and HTMX actions
//!
//! Endpoints:
//! - api_view: current view model (JSON)
//! - htmx_view: current fragment, polled while a fetch is outstanding
//! - htmx_view_mount: startup hook
//! - htmx_view_select: employee select change
//! - htmx_view_more: "View More"
//!
//! Action endpoints apply the action's first transition before responding,
//! so the returned fragment already shows its loading state.

use axum::extract::State;
use axum::response::Html;
use axum::Json;
use ledgerview_core::{ViewAction, ViewModel};

use super::page::render_view;
use crate::{parse_form, ApiResult, AppState};

async fn render_fragment(state: &AppState) -> Html<String> {
    Html(render_view(&state.coordinator.view().await, false))
}

/// Current view model (JSON API)
pub async fn api_view(state: State<AppState>) -> Json<ViewModel> {
    Json(state.coordinator.view().await)
}

/// HTMX: Current view fragment
pub async fn htmx_view(state: State<AppState>) -> Html<String> {
    render_fragment(&state).await
}

/// HTMX: View became visible
pub async fn htmx_view_mount(state: State<AppState>) -> Html<String> {
    state.dispatch(ViewAction::Mount).await;
    render_fragment(&state).await
}

/// HTMX: Employee select changed
///
/// Form field `employee_id`; the empty value selects "All Employees", a
/// missing field is no selection at all.
pub async fn htmx_view_select(state: State<AppState>, body: String) -> ApiResult<Html<String>> {
    let params = parse_form(&body);
    let selection = state
        .coordinator
        .resolve_selection(params.get("employee_id").map(String::as_str))
        .await?;
    log::debug!("employee select changed: {:?}", selection.as_ref().map(|e| &e.id));

    state.dispatch(ViewAction::SelectEmployee(selection)).await;
    Ok(render_fragment(&state).await)
}

/// HTMX: "View More" activated
pub async fn htmx_view_more(state: State<AppState>) -> Html<String> {
    state.dispatch(ViewAction::ViewMore).await;
    render_fragment(&state).await
}
