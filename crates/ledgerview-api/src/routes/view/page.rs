//! Ledger view rendering - full page and the swappable fragment
//!
//! The fragment is a single `#ledger-view` element. Actions swap it whole;
//! while a fetch is outstanding it polls `/view` to pick up the result.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Html;
use ledgerview_core::view::{EmployeeSelect, ViewMoreControl};
use ledgerview_core::{Transaction, ViewModel, ViewPhase};
use ledgerview_utils::escape_html;

use crate::routes::transactions::render_transaction_row;
use crate::AppState;

const POLL_INTERVAL: &str = "500ms";

/// Ledger page - header plus the view fragment. A fresh view fires the
/// initial load as soon as it is shown.
pub async fn page_view(state: State<AppState>, headers: HeaderMap) -> Html<String> {
    let snapshot = state.coordinator.snapshot().await;
    let model = ViewModel::from_state(&snapshot);

    let inner_content = format!(
        r#"<div class='mb-6'><h2 class='text-2xl font-bold'>Transactions</h2></div>
        {}"#,
        render_view(&model, snapshot.needs_initial_load())
    );

    Html(crate::page_response(&headers, "Transactions", &inner_content))
}

/// Render the `#ledger-view` fragment
pub fn render_view(model: &ViewModel, mount: bool) -> String {
    let trigger = if mount {
        " hx-post='/view/mount' hx-trigger='load' hx-swap='outerHTML'".to_string()
    } else if model.is_busy() {
        format!(" hx-get='/view' hx-trigger='every {}' hx-swap='outerHTML'", POLL_INTERVAL)
    } else {
        String::new()
    };

    format!(
        r#"<div id='ledger-view' data-phase='{}'{} class='space-y-4'>
    {}
    {}
    {}
</div>"#,
        model.phase,
        trigger,
        render_employee_select(&model.employee_select),
        render_transactions(model.transactions.as_deref(), model.phase),
        render_view_more(model.view_more)
    )
}

fn render_employee_select(select: &EmployeeSelect) -> String {
    let (options, disabled) = if select.is_loading {
        (format!("<option value='' selected>{}...</option>", escape_html(select.loading_label)), " disabled")
    } else {
        let options: Vec<String> = select
            .items
            .iter()
            .map(|item| {
                format!(
                    "<option value='{}'{}>{}</option>",
                    escape_html(&item.value),
                    if item.value == select.selected_value { " selected" } else { "" },
                    escape_html(&item.label)
                )
            })
            .collect();
        (options.join(""), "")
    };

    format!(
        r#"<div class='flex items-center gap-3'>
        <label for='employee-select' class='text-sm font-medium text-gray-700'>{}</label>
        <select id='employee-select' name='employee_id'{}
            hx-post='/view/select' hx-trigger='change' hx-target='#ledger-view' hx-swap='outerHTML'
            class='px-4 py-2 border rounded-lg bg-white'>{}</select>
    </div>"#,
        escape_html(select.label),
        disabled,
        options
    )
}

fn render_transactions(rows: Option<&[Transaction]>, phase: ViewPhase) -> String {
    let Some(rows) = rows else {
        let message = if phase.is_loading() { "Loading..." } else { "No transactions loaded" };
        return format!(
            "<div class='bg-white rounded-xl shadow-sm p-6'><p class='text-gray-500 text-center'>{}</p></div>",
            message
        );
    };
    if rows.is_empty() {
        return "<div class='bg-white rounded-xl shadow-sm p-6'><p class='text-gray-500 text-center'>No transactions</p></div>"
            .to_string();
    }

    let body: String = rows.iter().map(render_transaction_row).collect();
    format!(
        r#"<div class='bg-white rounded-xl shadow-sm overflow-hidden'>
        <table class='w-full text-sm'>
            <thead class='bg-gray-50 text-left text-gray-600'>
                <tr><th class='py-2 px-3'>Merchant</th><th class='py-2 px-3'>Employee</th><th class='py-2 px-3'>Date</th><th class='py-2 px-3 text-right'>Amount</th><th class='py-2 px-3 text-center'>Approved</th></tr>
            </thead>
            <tbody>{}</tbody>
        </table>
    </div>"#,
        body
    )
}

fn render_view_more(control: Option<ViewMoreControl>) -> String {
    match control {
        None => String::new(),
        Some(control) => format!(
            r#"<button hx-post='/view/more' hx-target='#ledger-view' hx-swap='outerHTML'{}
        class='px-4 py-2 bg-indigo-600 text-white rounded-lg hover:bg-indigo-700 disabled:opacity-50'>View More</button>"#,
            if control.disabled { " disabled" } else { "" }
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerview_core::{Employee, ViewState};

    #[test]
    fn test_fresh_view_fragment() {
        let model = ViewModel::from_state(&ViewState::new());
        let html = render_view(&model, true);
        assert!(html.contains("hx-post='/view/mount'"));
        assert!(html.contains("data-phase='INITIAL'"));
        assert!(!html.contains("View More"));
        assert!(html.contains("No transactions loaded"));
    }

    #[test]
    fn test_loading_fragment_polls_and_disables_select() {
        let mut state = ViewState::new();
        state.begin_load_all();
        let html = render_view(&ViewModel::from_state(&state), false);
        assert!(html.contains("hx-get='/view' hx-trigger='every 500ms'"));
        assert!(html.contains("Loading employees..."));
        assert!(html.contains(" disabled"));
        assert!(html.contains("Loading..."));
    }

    #[test]
    fn test_select_marks_chosen_employee() {
        let mut state = ViewState::new();
        let ticket = state.begin_load_all();
        state.settle_employees(&ticket, Some(vec![Employee::new("7", "Alan", "Turing")]));
        let request = state.begin_load_by_employee("7");
        state.settle_employee_transactions(&request, Some(Vec::new()));

        let html = render_view(&ViewModel::from_state(&state), false);
        assert!(html.contains("<option value=''>All Employees</option>"));
        assert!(html.contains("<option value='7' selected>Alan Turing</option>"));
        assert!(html.contains("No transactions"));
        assert!(!html.contains("hx-trigger='every"));
    }
}
