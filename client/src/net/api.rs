//! REST API helpers for the instrument endpoints.
//!
//! Client-side (hydrate): real HTTP calls via `gloo-net`, multipart bodies
//! built with `web_sys::FormData`.
//! Server-side (SSR): stubs returning `None`/error since uploads and listings
//! are only meaningful in the browser.
//!
//! ERROR HANDLING
//! ==============
//! Uploads return `Result<_, String>` where the error is the text the caller
//! alerts (or, for legacy uploads, the raw body it still has to unwrap).
//! Listings return `Option` and log failures to the console; a failed
//! listing must never disturb what is already on screen.

#![allow(clippy::unused_async)]

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use records::{Instrument, InstrumentFilter, PreviewRow};

use crate::state::SelectedFile;
#[cfg(feature = "hydrate")]
use crate::state::upload::upload_failed_message;

pub const UPLOAD_INSTRUMENTS_ENDPOINT: &str = "/upload_instruments";
pub const INSTRUMENTS_ENDPOINT: &str = "/instruments";
pub const LEGACY_UPLOAD_ENDPOINT: &str = "/upload";
pub const LEGACY_INSTRUMENTS_ENDPOINT: &str = "/legacy/instruments";

#[cfg(any(test, feature = "hydrate"))]
fn instruments_endpoint(error_only: bool) -> String {
    let filter = if error_only { InstrumentFilter::errors_only() } else { InstrumentFilter::default() };
    let query = filter
        .query_pairs()
        .into_iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    if query.is_empty() { INSTRUMENTS_ENDPOINT.to_owned() } else { format!("{INSTRUMENTS_ENDPOINT}?{query}") }
}

#[cfg(any(test, feature = "hydrate"))]
fn listing_failed_message(endpoint: &str, status: u16) -> String {
    format!("GET {endpoint} failed: {status}")
}

/// Only `preview` of the upload summary is used by the page.
#[cfg(any(test, feature = "hydrate"))]
#[derive(Debug, serde::Deserialize)]
struct PreviewResponse {
    preview: Vec<PreviewRow>,
}

#[cfg(feature = "hydrate")]
fn multipart_body(file: &SelectedFile) -> Result<web_sys::FormData, String> {
    let form = web_sys::FormData::new().map_err(|e| format!("{e:?}"))?;
    form.append_with_blob_and_filename("file", &file.handle, &file.name)
        .map_err(|e| format!("{e:?}"))?;
    Ok(form)
}

/// Upload a CSV/XLSX file to `POST /upload_instruments` and return its
/// preview rows.
///
/// # Errors
///
/// Returns the alert text (`Upload failed: ...`) on transport failure or a
/// non-OK status.
pub async fn upload_instruments(file: &SelectedFile) -> Result<Vec<PreviewRow>, String> {
    #[cfg(feature = "hydrate")]
    {
        let form = multipart_body(file).map_err(|e| upload_failed_message(&e))?;
        let resp = gloo_net::http::Request::post(UPLOAD_INSTRUMENTS_ENDPOINT)
            .body(form)
            .map_err(|e| upload_failed_message(&e.to_string()))?
            .send()
            .await
            .map_err(|e| upload_failed_message(&e.to_string()))?;
        if !resp.ok() {
            let body = resp.text().await.unwrap_or_default();
            return Err(upload_failed_message(&body));
        }
        let body: PreviewResponse = resp
            .json()
            .await
            .map_err(|e| upload_failed_message(&e.to_string()))?;
        Ok(body.preview)
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = file;
        Err("not available on server".to_owned())
    }
}

/// Fetch staged rows from `/instruments`, optionally only those with errors.
/// Returns `None` on failure or on the server.
pub async fn fetch_instruments(error_only: bool) -> Option<Vec<PreviewRow>> {
    #[cfg(feature = "hydrate")]
    {
        let url = instruments_endpoint(error_only);
        let resp = match gloo_net::http::Request::get(&url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                log::warn!("GET {url} failed: {e}");
                return None;
            }
        };
        if !resp.ok() {
            log::warn!("{}", listing_failed_message(&url, resp.status()));
            return None;
        }
        resp.json::<Vec<PreviewRow>>()
            .await
            .map_err(|e| log::warn!("GET {url} returned an unreadable body: {e}"))
            .ok()
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = error_only;
        None
    }
}

/// Upload a PD/LGD/EAD file to the legacy `POST /upload`.
///
/// # Errors
///
/// Returns the response body on a non-OK status, or the transport error text.
pub async fn upload_legacy(file: &SelectedFile) -> Result<u64, String> {
    #[cfg(feature = "hydrate")]
    {
        let form = multipart_body(file)?;
        let resp = gloo_net::http::Request::post(LEGACY_UPLOAD_ENDPOINT)
            .body(form)
            .map_err(|e| e.to_string())?
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !resp.ok() {
            return Err(resp.text().await.unwrap_or_default());
        }
        let body: records::LegacyUploadResult = resp.json().await.map_err(|e| e.to_string())?;
        Ok(body.inserted)
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = file;
        Err("not available on server".to_owned())
    }
}

/// Fetch the legacy instrument list. Returns `None` on failure or on the
/// server.
pub async fn fetch_legacy_instruments() -> Option<Vec<Instrument>> {
    #[cfg(feature = "hydrate")]
    {
        let resp = gloo_net::http::Request::get(LEGACY_INSTRUMENTS_ENDPOINT)
            .send()
            .await
            .map_err(|e| log::warn!("GET {LEGACY_INSTRUMENTS_ENDPOINT} failed: {e}"))
            .ok()?;
        if !resp.ok() {
            log::warn!("{}", listing_failed_message(LEGACY_INSTRUMENTS_ENDPOINT, resp.status()));
            return None;
        }
        resp.json::<Vec<Instrument>>().await.ok()
    }
    #[cfg(not(feature = "hydrate"))]
    {
        None
    }
}
