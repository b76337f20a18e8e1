//! # client
//!
//! Leptos + WASM frontend for the IFRS 9 instrument intake service.
//!
//! This crate contains the upload and listing components, their pure state
//! layer, and the REST helpers they call. The server renders it through
//! `leptos_axum`; the browser hydrates it via [`hydrate`].

pub mod app;
pub mod components;
pub mod net;
pub mod pages;
pub mod state;
pub mod util;

/// WASM entry point: install the panic hook and console logger, then
/// hydrate the server-rendered body.
#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    leptos::mount::hydrate_body(app::App);
}
