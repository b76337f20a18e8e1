//! Utility helpers shared across client UI modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Utility modules isolate browser concerns from page and component logic so
//! the state layer stays testable natively.

pub mod browser;
