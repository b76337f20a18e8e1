//! Reusable UI component modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! `upload_instruments` and `instruments_table` make up the home page;
//! `legacy_instruments` is the first PD/LGD/EAD iteration kept at `/legacy`.
//! `preview_table` renders staged rows for both home page components.

pub mod instruments_table;
pub mod legacy_instruments;
pub mod preview_table;
pub mod upload_instruments;
