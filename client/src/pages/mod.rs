//! Page modules for route-level screens.
//!
//! ARCHITECTURE
//! ============
//! Each page lays out its route and delegates state and rendering to
//! `components`.

pub mod home;
pub mod legacy;
