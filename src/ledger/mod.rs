//! Append-only ledger of projects and burn events
//!
//! The ledger is the single authority for what has been processed. The
//! pipeline talks to it through the [`Ledger`] trait; the concrete client
//! speaks PostgREST.

pub mod client;
pub mod models;

pub use client::{Ledger, LedgerClient};
pub use models::{BurnRecord, NewProject, PlatformBurnRecord, Project};
