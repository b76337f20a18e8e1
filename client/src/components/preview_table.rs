//! Table of staged rows with a trailing `Errors` column.
//!
//! Columns come from the first row's `raw_data` keys; rows with errors are
//! highlighted. Renders nothing for an empty row set.

use leptos::prelude::*;
use records::PreviewRow;
use records::table;

#[component]
pub fn PreviewTable(#[prop(into)] rows: Signal<Vec<PreviewRow>>) -> impl IntoView {
    move || {
        rows.with(|rows| {
            if rows.is_empty() {
                return None;
            }
            let keys = table::column_keys(rows);
            let headers = table::header_labels(rows)
                .into_iter()
                .map(|label| view! { <th>{label}</th> })
                .collect_view();
            let body = rows
                .iter()
                .map(|row| {
                    let cells = table::row_cells(row, &keys)
                        .into_iter()
                        .map(|cell| view! { <td>{cell}</td> })
                        .collect_view();
                    view! {
                        <tr style=table::row_style(row)>
                            {cells}
                            <td>{row.joined_errors()}</td>
                        </tr>
                    }
                })
                .collect_view();

            Some(view! {
                <table class="preview-table">
                    <thead>
                        <tr>{headers}</tr>
                    </thead>
                    <tbody>{body}</tbody>
                </table>
            })
        })
    }
}
