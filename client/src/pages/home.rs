//! Home route: typed upload form above the staged-row listing.

use leptos::prelude::*;

use crate::components::instruments_table::InstrumentsTable;
use crate::components::upload_instruments::UploadInstruments;

#[component]
pub fn HomePage() -> impl IntoView {
    view! {
        <main class="page">
            <h1>"IFRS 9 Automation Platform"</h1>
            <UploadInstruments/>
            <InstrumentsTable/>
        </main>
    }
}
