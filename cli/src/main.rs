use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use records::table::{self, LEGACY_HEADERS};
use records::{
    ErrorDetail, Instrument, InstrumentFilter, LegacyUploadHistoryEntry, LegacyUploadResult, Page, PreviewRow,
    UploadHistoryEntry, UploadSummary,
};
use reqwest::multipart::{Form, Part};
use serde_json::Value;

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned HTTP {status}: {message}")]
    ServerError { status: u16, message: String },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "ifrs9", about = "IFRS 9 instrument intake CLI")]
struct Cli {
    #[arg(long, env = "IFRS9_BASE_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    /// Print raw JSON responses instead of tables.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone)]
struct CliContext {
    base_url: String,
    json: bool,
}

impl CliContext {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check `/healthz`.
    Ping,
    /// Upload a CSV/XLSX instrument file and print its preview.
    Upload {
        path: PathBuf,
        #[arg(long)]
        uploaded_by: Option<String>,
    },
    /// List staged instrument rows.
    List(ListArgs),
    /// List recorded uploads.
    History(PageArgs),
    /// PD/LGD/EAD endpoints of the first iteration.
    Legacy(LegacyCommand),
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Only rows with validation errors.
    #[arg(long, conflicts_with = "valid")]
    errors: bool,
    /// Only rows without validation errors.
    #[arg(long)]
    valid: bool,
    #[arg(long)]
    asset_class: Option<String>,
    #[arg(long)]
    classification_category: Option<String>,
    #[arg(long)]
    off_balance_flag: Option<bool>,
}

impl ListArgs {
    fn filter(&self) -> InstrumentFilter {
        let error = match (self.errors, self.valid) {
            (true, _) => Some(true),
            (false, true) => Some(false),
            (false, false) => None,
        };
        InstrumentFilter {
            error,
            asset_class: self.asset_class.clone(),
            classification_category: self.classification_category.clone(),
            off_balance_flag: self.off_balance_flag,
        }
    }
}

#[derive(Args, Debug)]
struct PageArgs {
    #[arg(long, default_value_t = 0)]
    skip: i64,
    #[arg(long, default_value_t = records::DEFAULT_PAGE_LIMIT)]
    limit: i64,
}

impl PageArgs {
    fn page(&self) -> Page {
        Page { skip: self.skip, limit: self.limit }
    }
}

#[derive(Args, Debug)]
struct LegacyCommand {
    #[command(subcommand)]
    command: LegacySubcommand,
}

#[derive(Subcommand, Debug)]
enum LegacySubcommand {
    /// Upload a PD/LGD/EAD file.
    Upload { path: PathBuf },
    /// List legacy instruments.
    List(PageArgs),
    /// List legacy uploads.
    History(PageArgs),
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let ctx = CliContext { base_url: cli.base_url, json: cli.json };

    match cli.command {
        Command::Ping => run_ping(&ctx).await,
        Command::Upload { path, uploaded_by } => run_upload(&ctx, &path, uploaded_by).await,
        Command::List(args) => run_list(&ctx, &args).await,
        Command::History(args) => run_history(&ctx, &args).await,
        Command::Legacy(legacy) => run_legacy(&ctx, legacy).await,
    }
}

async fn run_ping(cli: &CliContext) -> Result<(), CliError> {
    let response = reqwest::Client::new().get(cli.url("/healthz")).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(CliError::ServerError {
            status: status.as_u16(),
            message: "health check failed".to_owned(),
        });
    }
    println!("ok");
    Ok(())
}

async fn run_upload(cli: &CliContext, path: &Path, uploaded_by: Option<String>) -> Result<(), CliError> {
    let mut form = file_form(path).await?;
    if let Some(uploaded_by) = uploaded_by {
        form = form.text("uploaded_by", uploaded_by);
    }
    let request = reqwest::Client::new().post(cli.url("/upload_instruments")).multipart(form);
    let value = send(request).await?;
    if cli.json {
        return print_json(&value);
    }
    let summary: UploadSummary = serde_json::from_value(value)?;
    println!("{}", summary_line(&summary));
    print!("{}", render_preview(&summary.preview));
    Ok(())
}

async fn run_list(cli: &CliContext, args: &ListArgs) -> Result<(), CliError> {
    let request = reqwest::Client::new()
        .get(cli.url("/instruments"))
        .query(&args.filter().query_pairs());
    let value = send(request).await?;
    if cli.json {
        return print_json(&value);
    }
    let rows: Vec<PreviewRow> = serde_json::from_value(value)?;
    if rows.is_empty() {
        eprintln!("no instruments");
        return Ok(());
    }
    print!("{}", render_preview(&rows));
    Ok(())
}

async fn run_history(cli: &CliContext, args: &PageArgs) -> Result<(), CliError> {
    let request = reqwest::Client::new().get(cli.url("/upload-history")).query(&args.page());
    let value = send(request).await?;
    if cli.json {
        return print_json(&value);
    }
    let entries: Vec<UploadHistoryEntry> = serde_json::from_value(value)?;
    let headers = ["ID", "Filename", "Uploaded", "By", "Schema", "Total", "Valid", "Invalid"].map(str::to_owned);
    let rows: Vec<Vec<String>> = entries
        .into_iter()
        .map(|entry| {
            vec![
                entry.upload_id.to_string(),
                entry.filename,
                entry.upload_timestamp,
                entry.uploaded_by.unwrap_or_default(),
                entry.schema_version,
                entry.total_rows.to_string(),
                entry.valid_rows.to_string(),
                entry.invalid_rows.to_string(),
            ]
        })
        .collect();
    print!("{}", render_table(&headers, &rows));
    Ok(())
}

async fn run_legacy(cli: &CliContext, legacy: LegacyCommand) -> Result<(), CliError> {
    match legacy.command {
        LegacySubcommand::Upload { path } => {
            let form = file_form(&path).await?;
            let request = reqwest::Client::new().post(cli.url("/upload")).multipart(form);
            let value = send(request).await?;
            if cli.json {
                return print_json(&value);
            }
            let result: LegacyUploadResult = serde_json::from_value(value)?;
            println!("Inserted {} records", result.inserted);
            Ok(())
        }
        LegacySubcommand::List(args) => {
            let request = reqwest::Client::new().get(cli.url("/legacy/instruments")).query(&args.page());
            let value = send(request).await?;
            if cli.json {
                return print_json(&value);
            }
            let instruments: Vec<Instrument> = serde_json::from_value(value)?;
            print!("{}", render_legacy(&instruments));
            Ok(())
        }
        LegacySubcommand::History(args) => {
            let request = reqwest::Client::new().get(cli.url("/legacy/upload-history")).query(&args.page());
            let value = send(request).await?;
            if cli.json {
                return print_json(&value);
            }
            let entries: Vec<LegacyUploadHistoryEntry> = serde_json::from_value(value)?;
            let headers = ["ID", "Filename", "Inserted", "Uploaded"].map(str::to_owned);
            let rows: Vec<Vec<String>> = entries
                .into_iter()
                .map(|entry| vec![entry.id.to_string(), entry.filename, entry.inserted.to_string(), entry.uploaded_at])
                .collect();
            print!("{}", render_table(&headers, &rows));
            Ok(())
        }
    }
}

/// Multipart body with the file under the `file` field.
async fn file_form(path: &Path) -> Result<Form, CliError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| CliError::ReadFile { path: path.to_owned(), source })?;
    let filename = path
        .file_name()
        .map_or_else(|| "upload".to_owned(), |name| name.to_string_lossy().into_owned());
    Ok(Form::new().part("file", Part::bytes(bytes).file_name(filename)))
}

async fn send(request: reqwest::RequestBuilder) -> Result<Value, CliError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(CliError::ServerError { status: status.as_u16(), message: server_message(&body) });
    }
    Ok(serde_json::from_str(&body)?)
}

/// Error text of a failed response: `detail` of a `{ "detail": ... }` body,
/// otherwise the trimmed body.
fn server_message(body: &str) -> String {
    serde_json::from_str::<ErrorDetail>(body).map_or_else(|_| body.trim().to_owned(), |err| err.detail)
}

fn summary_line(summary: &UploadSummary) -> String {
    format!(
        "upload {} ({}): {} rows, {} valid, {} invalid, sha256 {}",
        summary.upload_id,
        summary.filename,
        summary.total_rows,
        summary.valid_rows,
        summary.invalid_rows,
        summary.checksum
    )
}

fn render_preview(rows: &[PreviewRow]) -> String {
    let keys = table::column_keys(rows);
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let mut cells = table::row_cells(row, &keys);
            cells.push(row.joined_errors());
            cells
        })
        .collect();
    render_table(&table::header_labels(rows), &body)
}

fn render_legacy(instruments: &[Instrument]) -> String {
    let headers = LEGACY_HEADERS.map(str::to_owned);
    let rows: Vec<Vec<String>> = instruments.iter().map(|i| i.cells().to_vec()).collect();
    render_table(&headers, &rows)
}

/// Left-aligned columns separated by two spaces. Empty when there are no
/// headers.
fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    if headers.is_empty() {
        return String::new();
    }
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, headers, &widths);
    for row in rows {
        push_line(&mut out, row, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let line = widths
        .iter()
        .enumerate()
        .map(|(i, &width)| {
            let cell = cells.get(i).map_or("", String::as_str);
            format!("{cell:<width$}")
        })
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
