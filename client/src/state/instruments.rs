//! State of the staged-instrument listing.
//!
//! DESIGN
//! ======
//! Every fetch takes a sequence number from [`InstrumentsState::begin_request`].
//! Only the response carrying the latest number is applied, so a slow
//! response for an old filter can never overwrite newer rows. Requests are
//! never cancelled.

#[cfg(test)]
#[path = "instruments_test.rs"]
mod instruments_test;

use records::PreviewRow;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct InstrumentsState {
    /// "Show only rows with errors" toggle.
    pub error_only: bool,
    pub rows: Vec<PreviewRow>,
    pub request_seq: u64,
}

impl InstrumentsState {
    /// Start a fetch and return its sequence number.
    pub fn begin_request(&mut self) -> u64 {
        self.request_seq += 1;
        self.request_seq
    }

    /// Apply a fetch outcome. `None` (a failed fetch) keeps the current rows.
    /// Returns whether the rows were replaced.
    pub fn apply_response(&mut self, seq: u64, rows: Option<Vec<PreviewRow>>) -> bool {
        if seq != self.request_seq {
            return false;
        }
        match rows {
            Some(rows) => {
                self.rows = rows;
                true
            }
            None => false,
        }
    }
}
