//! `/legacy` route: the PD/LGD/EAD iteration of the UI.

use leptos::prelude::*;

use crate::components::legacy_instruments::LegacyInstruments;

#[component]
pub fn LegacyPage() -> impl IntoView {
    view! {
        <main class="page">
            <h1>"IFRS 9 Automation Platform"</h1>
            <LegacyInstruments/>
        </main>
    }
}
