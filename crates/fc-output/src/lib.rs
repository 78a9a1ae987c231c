//! `fc-output`: session output writers.
//!
//! Two backends are provided:
//!
//! | Feature   | Backend | Files created                                               |
//! |-----------|---------|-------------------------------------------------------------|
//! | *(none)*  | CSV     | `dispatch_log.csv`, `route_legs.csv`, `site_snapshots.csv`  |
//! | `sqlite`  | SQLite  | `output.db`                                                 |
//!
//! Both implement [`OutputWriter`] and are driven by
//! [`SessionOutputObserver`], which implements `fc_sim::SessionObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use fc_output::{CsvWriter, SessionOutputObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output")).unwrap();
//! let mut obs = SessionOutputObserver::new(writer, 1);
//! session.run(&mut obs).unwrap();
//! obs.take_error().map(|e| eprintln!("output error: {e}"));
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(test)]
mod tests;

pub use crate::csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::{route_leg_rows, site_rows, SessionOutputObserver};
pub use row::{CycleRow, RouteLegRow, SiteRow};
pub use writer::OutputWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;
