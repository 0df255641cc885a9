//! Transaction row rendering

use ledgerview_core::Transaction;
use ledgerview_utils::{escape_html, format_amount};

/// Render one list row, including its approval checkbox
pub fn render_transaction_row(transaction: &Transaction) -> String {
    let id = escape_html(&transaction.id);
    let path_id = escape_html(&urlencoding::encode(&transaction.id));
    let (checked, next) = if transaction.approved { (" checked", "false") } else { ("", "true") };

    format!(
        r#"<tr id='tx-{id}' class='border-b hover:bg-gray-50'>
    <td class='py-2 px-3'>{merchant}</td>
    <td class='py-2 px-3 text-gray-600'>{employee}</td>
    <td class='py-2 px-3 text-gray-500'>{date}</td>
    <td class='py-2 px-3 text-right font-medium'>{amount}</td>
    <td class='py-2 px-3 text-center'>
        <input type='checkbox' aria-label='Approved'{checked}
            hx-post='/transactions/{path_id}/approval' hx-vals='{{"approved": "{next}"}}'
            hx-target='#tx-{id}' hx-swap='outerHTML'>
    </td>
</tr>"#,
        merchant = escape_html(&transaction.merchant),
        employee = escape_html(&transaction.employee.full_name()),
        date = transaction.date,
        amount = format_amount(transaction.amount),
    )
}
