//! Request builders shared by the route tests.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::header::CONTENT_TYPE;
use axum::http::{Request, Response};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

use crate::config::{DEFAULT_SCHEMA_VERSION, DEFAULT_UPLOAD_MAX_BYTES, ServerConfig};
use crate::state::{AppState, test_helpers};

const BOUNDARY: &str = "ifrs9-test-boundary";

pub fn test_config() -> ServerConfig {
    ServerConfig {
        database_url: "postgres://unused".into(),
        port: 0,
        db_max_connections: 1,
        upload_max_bytes: DEFAULT_UPLOAD_MAX_BYTES,
        cors_origins: Vec::new(),
        schema_version: DEFAULT_SCHEMA_VERSION.into(),
    }
}

/// API router over a fresh in-memory store, plus the state for inspection.
pub fn test_router() -> (Router, AppState) {
    let state = test_helpers::test_app_state();
    (super::api_routes(state.clone(), &test_config()), state)
}

/// One multipart part: `(name, filename, content)`.
pub type Part<'a> = (&'a str, Option<&'a str>, &'a [u8]);

pub fn multipart_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, filename, content) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes()),
        }
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .expect("valid request")
}

pub fn file_upload(uri: &str, filename: &str, content: &[u8]) -> Request<Body> {
    multipart_request(uri, &[("file", Some(filename), content)])
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).expect("valid request")
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("readable body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub async fn body_json<T: serde::de::DeserializeOwned>(response: Response<Body>) -> T {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("readable body");
    serde_json::from_slice(&bytes).expect("json body")
}

/// One cell written by [`xlsx_bytes`].
#[derive(Debug, Clone, Copy)]
pub enum Cell<'a> {
    Text(&'a str),
    Number(f64),
    Bool(bool),
    /// Year, month, day; written as a serial with a date number format.
    Date(u16, u8, u8),
    Blank,
}

/// A single-sheet workbook holding `rows`, as `.xlsx` bytes.
pub fn xlsx_bytes(rows: &[&[Cell<'_>]]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let sheet = workbook.add_worksheet();
    for (r, cells) in rows.iter().enumerate() {
        let r = u32::try_from(r).expect("row index");
        for (c, cell) in cells.iter().enumerate() {
            let c = u16::try_from(c).expect("column index");
            match *cell {
                Cell::Text(text) => {
                    sheet.write_string(r, c, text).expect("write string");
                }
                Cell::Number(n) => {
                    sheet.write_number(r, c, n).expect("write number");
                }
                Cell::Bool(flag) => {
                    sheet.write_boolean(r, c, flag).expect("write boolean");
                }
                Cell::Date(year, month, day) => {
                    let date = ExcelDateTime::from_ymd(year, month, day).expect("valid date");
                    sheet
                        .write_datetime_with_format(r, c, &date, &date_format)
                        .expect("write date");
                }
                Cell::Blank => {}
            }
        }
    }
    workbook.save_to_buffer().expect("xlsx buffer")
}
