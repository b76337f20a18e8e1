//! Networking for the instrument upload API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` wraps the REST endpoints; wire types come from the `records` crate
//! shared with the server.

pub mod api;
