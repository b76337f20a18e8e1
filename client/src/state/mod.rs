//! Plain state structs behind the page components.
//!
//! DESIGN
//! ======
//! Components keep these in signals and call the methods here for every
//! transition, so the rules (what clears the preview, which response wins)
//! are testable natively without a browser.

pub mod instruments;
pub mod legacy;
pub mod upload;

/// A file picked in an `<input type="file">`.
///
/// Browser builds carry the `File` handle for the multipart body; native and
/// SSR builds only know the name.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectedFile {
    pub name: String,
    #[cfg(feature = "hydrate")]
    pub handle: web_sys::File,
}

impl SelectedFile {
    #[cfg(feature = "hydrate")]
    #[must_use]
    pub fn from_file(handle: web_sys::File) -> Self {
        Self { name: handle.name(), handle }
    }

    #[cfg(all(test, not(feature = "hydrate")))]
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
