//! First iteration of the instrument UI: PD/LGD/EAD upload and a fixed
//! seven-column table.
//!
//! SYSTEM CONTEXT
//! ==============
//! Talks to the legacy endpoints only (`POST /upload`,
//! `GET /legacy/instruments`). Results of an upload are reported with a
//! blocking alert; a successful upload refetches the table.

use leptos::prelude::*;
use records::table::LEGACY_HEADERS;

use crate::state::legacy::LegacyState;
use crate::util::browser;

/// Fetch the legacy list and apply it if it is still the latest request.
fn refresh(state: RwSignal<LegacyState, LocalStorage>) {
    let seq = state
        .try_update_untracked(LegacyState::begin_request)
        .unwrap_or_default();
    #[cfg(feature = "hydrate")]
    {
        leptos::task::spawn_local(async move {
            let instruments = crate::net::api::fetch_legacy_instruments().await;
            state.update(|s| {
                s.apply_response(seq, instruments);
            });
        });
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = seq;
    }
}

#[component]
pub fn LegacyInstruments() -> impl IntoView {
    let state = RwSignal::new_local(LegacyState::default());

    Effect::new(move || refresh(state));

    let on_change = move |ev: leptos::ev::Event| {
        let file = browser::selected_file(&ev);
        state.update(|s| s.selected = file);
    };

    let on_upload = move |_| {
        let Some(file) = state.with_untracked(|s| s.selected.clone()) else {
            return;
        };
        #[cfg(feature = "hydrate")]
        {
            leptos::task::spawn_local(async move {
                let outcome = LegacyState::upload_outcome(crate::net::api::upload_legacy(&file).await);
                browser::alert(&outcome.alert);
                if outcome.refetch {
                    refresh(state);
                }
            });
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = file;
        }
    };

    let headers = LEGACY_HEADERS
        .iter()
        .map(|label| view! { <th>{*label}</th> })
        .collect_view();

    view! {
        <section class="legacy-instruments">
            <input type="file" accept=".csv,.xlsx,.xls" on:change=on_change/>
            <button class="btn" on:click=on_upload>"Upload"</button>
            <table class="legacy-table">
                <thead>
                    <tr>{headers}</tr>
                </thead>
                <tbody>
                    {move || {
                        state
                            .with(|s| s.instruments.clone())
                            .into_iter()
                            .map(|instrument| {
                                let cells = instrument
                                    .cells()
                                    .into_iter()
                                    .map(|cell| view! { <td>{cell}</td> })
                                    .collect_view();
                                view! { <tr>{cells}</tr> }
                            })
                            .collect_view()
                    }}
                </tbody>
            </table>
        </section>
    }
}
