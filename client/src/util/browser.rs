//! Browser glue for the upload forms.
//!
//! Blocking alerts and `<input type="file">` reads. Requires a browser
//! environment; SSR paths no-op.

#[cfg(feature = "hydrate")]
use wasm_bindgen::JsCast;

use crate::state::SelectedFile;

/// Show a blocking `window.alert`.
pub fn alert(message: &str) {
    #[cfg(feature = "hydrate")]
    {
        if let Some(window) = web_sys::window() {
            let _ = window.alert_with_message(message);
        }
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = message;
    }
}

/// First file of the input that fired `ev`, or `None` when the selection was
/// cleared.
#[cfg(feature = "hydrate")]
pub fn selected_file(ev: &leptos::ev::Event) -> Option<SelectedFile> {
    let input = ev.target()?.dyn_into::<web_sys::HtmlInputElement>().ok()?;
    let file = input.files()?.item(0)?;
    Some(SelectedFile::from_file(file))
}

#[cfg(not(feature = "hydrate"))]
pub fn selected_file(ev: &leptos::ev::Event) -> Option<SelectedFile> {
    let _ = ev;
    None
}
