//! Coverage badge generation from JaCoCo XML reports.
//!
//! The pipeline reads the report-level counter of one kind, turns it into a
//! percentage, picks a color bucket and writes a shields.io endpoint badge.

pub mod app;
pub mod badge;
pub mod error;
pub mod report;

pub use badge::{write_badge, Badge, BadgeColor};
pub use error::{BadgeError, BadgeResult};
pub use report::{coverage_percentage, extract_coverage, CounterKind};
