//! CSV persistence.
//!
//! Two surfaces with deliberately different semantics: [`RawStore`] is the
//! append-only archive deduplicated by `video_url`, and [`write_snapshot`]
//! is the per-run analyzed table that gets replaced wholesale.

pub mod error;
pub mod raw;
pub mod snapshot;

pub use error::{StoreError, StoreResult};
pub use raw::{AppendOutcome, RawStore};
pub use snapshot::write_snapshot;
