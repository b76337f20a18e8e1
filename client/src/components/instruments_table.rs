//! Listing of staged rows with an errors-only toggle.
//!
//! SYSTEM CONTEXT
//! ==============
//! Fetches `/instruments` on mount and again whenever the toggle flips.
//! Responses go through [`InstrumentsState::apply_response`], so only the
//! latest fetch is shown and a failed fetch leaves the current rows in place.
//! The whole block, toggle included, stays hidden while there are no rows.

use leptos::prelude::*;

use crate::components::preview_table::PreviewTable;
use crate::state::instruments::InstrumentsState;

#[component]
pub fn InstrumentsTable() -> impl IntoView {
    let state = RwSignal::new(InstrumentsState::default());
    let error_only = Memo::new(move |_| state.with(|s| s.error_only));
    let rows = Signal::derive(move || state.with(|s| s.rows.clone()));

    Effect::new(move || {
        let error_only = error_only.get();
        let seq = state
            .try_update_untracked(InstrumentsState::begin_request)
            .unwrap_or_default();
        #[cfg(feature = "hydrate")]
        {
            leptos::task::spawn_local(async move {
                let rows = crate::net::api::fetch_instruments(error_only).await;
                state.update(|s| {
                    s.apply_response(seq, rows);
                });
            });
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (error_only, seq);
        }
    });

    view! {
        <Show when=move || state.with(|s| !s.rows.is_empty())>
            <section class="instruments-table">
                <h2>"Instruments Preview"</h2>
                <label>
                    <input
                        type="checkbox"
                        prop:checked=move || error_only.get()
                        on:change=move |ev| {
                            let checked = event_target_checked(&ev);
                            state.update(|s| s.error_only = checked);
                        }
                    />
                    " Show only rows with errors"
                </label>
                <PreviewTable rows=rows/>
            </section>
        </Show>
    }
}
