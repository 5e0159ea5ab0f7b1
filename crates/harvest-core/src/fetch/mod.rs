//! Single-page fetch protocol.
//!
//! One navigation-and-extract cycle against a [`PageDriver`](crate::driver::PageDriver):
//! apply the session and fingerprint once, navigate with a bounded wait,
//! short-circuit on challenge or login pages, wait for the data table and
//! turn its rows into [`Row`](crate::record::Row)s through an explicit field
//! rule list. Every failure comes back as a typed [`FetchFailure`].

mod detect;
mod engine;
mod extract;
mod failure;
mod fingerprint;

pub use detect::{inspect_page, PageMarkers, PageVerdict};
pub use engine::{FetchEngine, FetchSettings};
pub use extract::{extract_rows, CellSource, Extracted, Field, FieldRule, TableSchema};
pub use failure::{classify_driver_error, FailureKind, FetchFailure};
pub use fingerprint::{choose_fingerprint, DEFAULT_USER_AGENTS, DEFAULT_VIEWPORT};
