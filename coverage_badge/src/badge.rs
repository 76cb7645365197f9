//! Endpoint badge model and writer.
//!
//! The JSON shape is the one shields.io expects from an endpoint badge:
//! `{"schemaVersion": 1, "label": "coverage", "message": "87.3%", "color": "yellowgreen"}`.

use std::{fs, io, path::Path};

use serde::Serialize;
use serde_json::ser::Formatter;
use tracing::{debug, info};

use crate::error::{BadgeError, BadgeResult};

pub const SCHEMA_VERSION: u8 = 1;
pub const LABEL: &str = "coverage";

/// Badge colors by coverage bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
#[serde(rename_all = "lowercase")]
pub enum BadgeColor {
    BrightGreen,
    YellowGreen,
    Yellow,
    Red,
}

impl BadgeColor {
    /// Lower bounds are inclusive. NaN falls through to red.
    pub fn for_coverage(percentage: f64) -> Self {
        if percentage >= 90.0 {
            BadgeColor::BrightGreen
        } else if percentage >= 75.0 {
            BadgeColor::YellowGreen
        } else if percentage >= 60.0 {
            BadgeColor::Yellow
        } else {
            BadgeColor::Red
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeColor::BrightGreen => "brightgreen",
            BadgeColor::YellowGreen => "yellowgreen",
            BadgeColor::Yellow => "yellow",
            BadgeColor::Red => "red",
        }
    }
}

impl std::fmt::Display for BadgeColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub schema_version: u8,
    pub label: String,
    pub message: String,
    pub color: BadgeColor,
}

impl Badge {
    pub fn for_coverage(percentage: f64) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            label: LABEL.to_string(),
            message: format!("{percentage:.1}%"),
            color: BadgeColor::for_coverage(percentage),
        }
    }

    /// Single-line JSON with `", "` and `": "` separators.
    pub fn to_json(&self) -> BadgeResult<String> {
        let mut buf = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
        self.serialize(&mut serializer)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Compact layout with a space after each separator.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

/// Writes `badge` to `path`, replacing any previous file and creating missing parents.
pub fn write_badge(badge: &Badge, path: &Path) -> BadgeResult<()> {
    if let Ok(cwd) = std::env::current_dir() {
        debug!(cwd = %cwd.display(), "Writing badge");
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| BadgeError::io(parent, err))?;
    }

    let json = badge.to_json()?;
    fs::write(path, json).map_err(|err| BadgeError::io(path, err))?;

    info!(
        message = %badge.message,
        color = %badge.color,
        output = %path.display(),
        "Generated badge"
    );
    Ok(())
}
