//! File picker + Upload button for typed instrument files.
//!
//! SYSTEM CONTEXT
//! ==============
//! Posts the picked CSV/XLSX to `/upload_instruments` and shows the returned
//! preview rows. Failures surface as a blocking alert and leave the last
//! preview on screen.

use leptos::prelude::*;

use crate::components::preview_table::PreviewTable;
use crate::state::upload::UploadState;
use crate::util::browser;

#[component]
pub fn UploadInstruments() -> impl IntoView {
    // Local: the selected `File` handle is a JS object.
    let state = RwSignal::new_local(UploadState::default());
    let preview = Signal::derive(move || state.with(|s| s.preview.clone()));

    let on_change = move |ev: leptos::ev::Event| {
        let file = browser::selected_file(&ev);
        state.update(|s| s.select_file(file));
    };

    let on_upload = move |_| {
        let Some(file) = state.with_untracked(|s| s.selected.clone()) else {
            return;
        };
        #[cfg(feature = "hydrate")]
        {
            leptos::task::spawn_local(async move {
                let result = crate::net::api::upload_instruments(&file).await;
                if let Some(message) = state.try_update(|s| s.apply_upload(result)).flatten() {
                    browser::alert(&message);
                }
            });
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = file;
        }
    };

    view! {
        <section class="upload-instruments">
            <input type="file" accept=".csv,.xlsx" on:change=on_change/>
            <button
                class="btn"
                on:click=on_upload
                disabled=move || !state.with(UploadState::can_upload)
            >
                "Upload"
            </button>
            <PreviewTable rows=preview/>
        </section>
    }
}

