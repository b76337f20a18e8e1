//! State of the legacy PD/LGD/EAD page.

#[cfg(test)]
#[path = "legacy_test.rs"]
mod legacy_test;

use records::{ErrorDetail, Instrument};

use super::SelectedFile;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LegacyState {
    pub selected: Option<SelectedFile>,
    pub instruments: Vec<Instrument>,
    pub request_seq: u64,
}

/// What the page does after a legacy upload settles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegacyUploadOutcome {
    pub alert: String,
    pub refetch: bool,
}

impl LegacyState {
    pub fn begin_request(&mut self) -> u64 {
        self.request_seq += 1;
        self.request_seq
    }

    /// Same latest-wins rule as the typed listing.
    pub fn apply_response(&mut self, seq: u64, instruments: Option<Vec<Instrument>>) -> bool {
        if seq != self.request_seq {
            return false;
        }
        let Some(instruments) = instruments else {
            return false;
        };
        self.instruments = instruments;
        true
    }

    /// `Ok` carries the inserted count, `Err` the failure body text.
    #[must_use]
    pub fn upload_outcome(result: Result<u64, String>) -> LegacyUploadOutcome {
        match result {
            Ok(inserted) => LegacyUploadOutcome { alert: inserted_message(inserted), refetch: true },
            Err(body) => LegacyUploadOutcome { alert: format!("Error: {}", error_detail(&body)), refetch: false },
        }
    }
}

#[must_use]
pub fn inserted_message(inserted: u64) -> String {
    format!("Inserted {inserted} records")
}

/// `detail` of a `{ "detail": ... }` body, or the body itself when it is not
/// one.
#[must_use]
pub fn error_detail(body: &str) -> String {
    serde_json::from_str::<ErrorDetail>(body).map_or_else(|_| body.to_owned(), |err| err.detail)
}
