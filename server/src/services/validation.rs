//! Row validation for typed instrument uploads.
//!
//! DESIGN
//! ======
//! Every parsed row becomes a [`PreviewRow`] whose `errors` list is built in a
//! fixed order: missing required fields, identity checks, collateral, dates,
//! floats, then booleans. A field already reported missing is not type-checked
//! again. Rows that collect no errors also yield a [`ValidatedInstrument`]
//! with typed values.

use std::collections::HashSet;

use records::{PreviewRow, RawData};
use serde_json::Value;
use time::{Date, Time, UtcOffset};
use time::macros::format_description;

use crate::db::ValidatedInstrument;

pub const REQUIRED_FIELDS: [&str; 15] = [
    "instrument_id",
    "borrower_id",
    "asset_class",
    "classification_category",
    "measurement_basis",
    "off_balance_flag",
    "pd_12m",
    "pd_lifetime",
    "lgd",
    "ead",
    "sicr_flag",
    "eir",
    "collateral_flag",
    "drawdown_date",
    "maturity_date",
];

/// Lower-cased text accepted as `true`.
pub const TRUE_SPELLINGS: [&str; 3] = ["true", "1", "yes"];
/// Lower-cased text accepted as `false`.
pub const FALSE_SPELLINGS: [&str; 3] = ["false", "0", "no"];

const COLLATERAL_DETAILS: [&str; 3] = ["collateral_type", "collateral_value", "appraisal_date"];
const UNIT_INTERVAL_FLOATS: [&str; 2] = ["pd_12m", "pd_lifetime"];
const UNBOUNDED_FLOATS: [&str; 3] = ["lgd", "ead", "eir"];

// =============================================================================
// VALUE PARSING
// =============================================================================

/// Absent, `null`, and `""` all count as missing. Whitespace does not.
#[must_use]
pub fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.is_empty(),
        Some(_) => false,
    }
}

#[must_use]
pub fn parse_bool(value: &Value) -> Option<bool> {
    let text = match value {
        Value::Bool(flag) => return Some(*flag),
        Value::String(text) => text.trim().to_lowercase(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if TRUE_SPELLINGS.contains(&text.as_str()) {
        Some(true)
    } else if FALSE_SPELLINGS.contains(&text.as_str()) {
        Some(false)
    } else {
        None
    }
}

/// Finite floats from JSON numbers or numeric strings.
#[must_use]
pub fn parse_float(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

/// ISO `YYYY-MM-DD`, optionally followed by `T` or a space and a time part
/// (`HH:MM`, `HH:MM:SS` or `HH:MM:SS.fff`, then an optional `Z` or `±HH:MM`
/// offset). The time must be valid but only the date is kept.
#[must_use]
pub fn parse_date(value: &Value) -> Option<Date> {
    let Value::String(text) = value else {
        return None;
    };
    let text = text.trim();
    let (date_part, rest) = text.split_at_checked(10)?;
    let date = Date::parse(date_part, format_description!("[year]-[month]-[day]")).ok()?;
    if rest.is_empty() {
        return Some(date);
    }
    let time_part = rest.strip_prefix('T').or_else(|| rest.strip_prefix(' '))?;
    parse_time_part(time_part).map(|_| date)
}

fn parse_time_part(text: &str) -> Option<Time> {
    let text = text.strip_suffix('Z').unwrap_or(text);
    let text = match text.rfind(['+', '-']) {
        Some(sign) => {
            UtcOffset::parse(&text[sign..], format_description!("[offset_hour sign:mandatory]:[offset_minute]")).ok()?;
            &text[..sign]
        }
        None => text,
    };
    Time::parse(text, format_description!("[hour]:[minute]:[second].[subsecond]"))
        .or_else(|_| Time::parse(text, format_description!("[hour]:[minute]:[second]")))
        .or_else(|_| Time::parse(&format!("{text}:00"), format_description!("[hour]:[minute]:[second]")))
        .ok()
}

/// Text form of an identifier or label cell.
#[must_use]
pub fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Distinct non-empty `instrument_id` values across `rows`, in first-seen order.
#[must_use]
pub fn instrument_ids(rows: &[RawData]) -> Vec<String> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter_map(|row| row.get("instrument_id").and_then(text_value))
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

// =============================================================================
// ROW VALIDATOR
// =============================================================================

/// Validates the rows of one upload in order, tracking ids seen so far.
pub struct RowValidator<'a> {
    existing: &'a HashSet<String>,
    seen: HashSet<String>,
}

impl<'a> RowValidator<'a> {
    /// `existing` holds the ids already stored as validated instruments.
    #[must_use]
    pub fn new(existing: &'a HashSet<String>) -> Self {
        Self { existing, seen: HashSet::new() }
    }

    pub fn validate(&mut self, row_number: i64, raw_data: RawData) -> (PreviewRow, Option<ValidatedInstrument>) {
        let mut errors = Vec::new();
        let mut missing: HashSet<&'static str> = HashSet::new();

        for field in REQUIRED_FIELDS {
            if is_missing(raw_data.get(field)) {
                errors.push(format!("Missing {field}"));
                missing.insert(field);
            }
        }

        if let Some(id) = raw_data.get("instrument_id").and_then(text_value) {
            if !self.seen.insert(id.clone()) {
                errors.push("Duplicate instrument_id".to_owned());
            }
            if self.existing.contains(&id) {
                errors.push("instrument_id already exists".to_owned());
            }
        }

        let check = FieldCheck { raw: &raw_data, missing: &missing };

        if let Some(true) = check.boolean("collateral_flag", &mut errors) {
            for detail in COLLATERAL_DETAILS {
                if is_missing(raw_data.get(detail)) {
                    errors.push(format!("Missing {detail} for collateral_flag"));
                }
            }
        }
        if !is_missing(raw_data.get("collateral_value")) {
            check.float("collateral_value", None, &mut errors);
        }
        if !is_missing(raw_data.get("appraisal_date")) {
            check.date("appraisal_date", &mut errors);
        }

        let drawdown = check.date("drawdown_date", &mut errors);
        let maturity = check.date("maturity_date", &mut errors);
        if let (Some(drawdown), Some(maturity)) = (drawdown, maturity) {
            if maturity <= drawdown {
                errors.push("maturity_date must be after drawdown_date".to_owned());
            }
        }

        for field in UNIT_INTERVAL_FLOATS {
            check.float(field, Some((0.0, 1.0)), &mut errors);
        }
        for field in UNBOUNDED_FLOATS {
            check.float(field, None, &mut errors);
        }
        check.boolean("sicr_flag", &mut errors);
        check.boolean("off_balance_flag", &mut errors);

        let validated = if errors.is_empty() { typed_instrument(&raw_data) } else { None };
        let mut row = PreviewRow::new(row_number, raw_data);
        row.errors = errors;
        (row, validated)
    }
}

/// Type checks that skip fields already reported missing.
struct FieldCheck<'r> {
    raw: &'r RawData,
    missing: &'r HashSet<&'static str>,
}

impl FieldCheck<'_> {
    fn value(&self, field: &'static str) -> Option<&Value> {
        if self.missing.contains(field) { None } else { self.raw.get(field) }
    }

    fn boolean(&self, field: &'static str, errors: &mut Vec<String>) -> Option<bool> {
        let value = self.value(field)?;
        let parsed = parse_bool(value);
        if parsed.is_none() {
            errors.push(format!("Invalid boolean for {field}"));
        }
        parsed
    }

    fn float(&self, field: &'static str, bounds: Option<(f64, f64)>, errors: &mut Vec<String>) -> Option<f64> {
        let value = self.value(field)?;
        let Some(parsed) = parse_float(value) else {
            errors.push(format!("Invalid float for {field}"));
            return None;
        };
        if let Some((min, max)) = bounds {
            if parsed < min || parsed > max {
                errors.push(format!("{field} out of bounds [{min},{max}]"));
            }
        }
        Some(parsed)
    }

    fn date(&self, field: &'static str, errors: &mut Vec<String>) -> Option<Date> {
        let value = self.value(field)?;
        let parsed = parse_date(value);
        if parsed.is_none() {
            errors.push(format!("Invalid date for {field}"));
        }
        parsed
    }
}

fn typed_instrument(raw: &RawData) -> Option<ValidatedInstrument> {
    let text = |field: &str| raw.get(field).and_then(text_value);
    let float = |field: &str| raw.get(field).and_then(parse_float);
    let boolean = |field: &str| raw.get(field).and_then(parse_bool);
    let date = |field: &str| raw.get(field).and_then(parse_date);

    Some(ValidatedInstrument {
        instrument_id: text("instrument_id")?,
        borrower_id: text("borrower_id")?,
        asset_class: text("asset_class")?,
        classification_category: text("classification_category")?,
        measurement_basis: text("measurement_basis")?,
        off_balance_flag: boolean("off_balance_flag")?,
        pd_12m: float("pd_12m")?,
        pd_lifetime: float("pd_lifetime")?,
        lgd: float("lgd")?,
        ead: float("ead")?,
        sicr_flag: boolean("sicr_flag")?,
        eir: float("eir")?,
        collateral_flag: boolean("collateral_flag")?,
        collateral_type: text("collateral_type"),
        collateral_value: float("collateral_value"),
        appraisal_date: date("appraisal_date"),
        drawdown_date: date("drawdown_date")?,
        maturity_date: date("maturity_date")?,
    })
}

#[cfg(test)]
#[path = "validation_test.rs"]
mod tests;
