//! State of the typed upload form and its preview table.

#[cfg(test)]
#[path = "upload_test.rs"]
mod upload_test;

use records::PreviewRow;

use super::SelectedFile;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct UploadState {
    pub selected: Option<SelectedFile>,
    /// Rows of the last successful upload.
    pub preview: Vec<PreviewRow>,
}

impl UploadState {
    /// Record the input's current file. Picking a file clears the preview;
    /// clearing the input keeps it.
    pub fn select_file(&mut self, file: Option<SelectedFile>) {
        if file.is_some() {
            self.preview.clear();
        }
        self.selected = file;
    }

    #[must_use]
    pub fn can_upload(&self) -> bool {
        self.selected.is_some()
    }

    /// Apply an upload outcome. Success replaces the preview; failure leaves
    /// it untouched and returns the alert text.
    pub fn apply_upload(&mut self, result: Result<Vec<PreviewRow>, String>) -> Option<String> {
        match result {
            Ok(rows) => {
                self.preview = rows;
                None
            }
            Err(message) => Some(message),
        }
    }
}

/// Alert text for a failed typed upload.
#[must_use]
pub fn upload_failed_message(detail: &str) -> String {
    format!("Upload failed: {detail}")
}
