//! The `OutputWriter` trait implemented by all backend writers.

use crate::{CycleRow, OutputResult, RouteLegRow, SiteRow};

/// Trait implemented by the CSV and SQLite writers.
///
/// Errors are stored by the observer and retrieved with
/// [`SessionOutputObserver::take_error`][crate::SessionOutputObserver::take_error].
pub trait OutputWriter {
    /// Write one dispatch cycle row.
    fn write_cycle(&mut self, row: &CycleRow) -> OutputResult<()>;

    /// Write the legs of one cycle's route.
    fn write_legs(&mut self, rows: &[RouteLegRow]) -> OutputResult<()>;

    /// Write a batch of site rows.
    fn write_sites(&mut self, rows: &[SiteRow]) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent; safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
