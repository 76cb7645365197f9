//! JaCoCo XML report reader.
//!
//! Only the report-level summary is consulted: the `<counter>` elements that are
//! direct children of the root element. Per-package, per-class and per-method
//! counters nested deeper in the tree are skipped.
//!
//! ```xml
//! <report name="getactivecore">
//!   <package name="com/bu/getactivecore">...</package>
//!   <counter type="INSTRUCTION" missed="120" covered="880"/>
//!   <counter type="BRANCH" missed="14" covered="36"/>
//! </report>
//! ```

use std::{fmt, fs, path::Path, str::FromStr};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tracing::{debug, info, warn};

use crate::error::{BadgeError, BadgeResult};

/// Placeholder path used for errors raised while parsing an in-memory document.
const IN_MEMORY: &str = "<memory>";

/// JaCoCo counter kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CounterKind {
    #[default]
    Instruction,
    Branch,
    Line,
    Complexity,
    Method,
    Class,
}

impl CounterKind {
    pub const ALL: [CounterKind; 6] = [
        CounterKind::Instruction,
        CounterKind::Branch,
        CounterKind::Line,
        CounterKind::Complexity,
        CounterKind::Method,
        CounterKind::Class,
    ];

    /// The `type` attribute value used in the report.
    pub fn as_str(&self) -> &'static str {
        match self {
            CounterKind::Instruction => "INSTRUCTION",
            CounterKind::Branch => "BRANCH",
            CounterKind::Line => "LINE",
            CounterKind::Complexity => "COMPLEXITY",
            CounterKind::Method => "METHOD",
            CounterKind::Class => "CLASS",
        }
    }
}

impl fmt::Display for CounterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CounterKind {
    type Err = BadgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CounterKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| BadgeError::UnknownCounterKind(s.to_string()))
    }
}

/// A top-level `<counter>` element with its attributes as written in the report.
///
/// Values stay unparsed so that malformed counters of other kinds never fail a run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CounterElement {
    pub kind: Option<String>,
    pub missed: Option<String>,
    pub covered: Option<String>,
}

impl CounterElement {
    pub fn is_kind(&self, kind: CounterKind) -> bool {
        self.kind.as_deref() == Some(kind.as_str())
    }

    /// Parses the `missed` and `covered` attributes into a [`Counter`].
    pub fn resolve(&self) -> BadgeResult<Counter> {
        let kind = self.kind.clone().unwrap_or_default();
        let missed = parse_count(&kind, "missed", self.missed.as_deref())?;
        let covered = parse_count(&kind, "covered", self.covered.as_deref())?;
        Ok(Counter {
            kind,
            missed,
            covered,
        })
    }
}

fn parse_count(kind: &str, attribute: &'static str, value: Option<&str>) -> BadgeResult<u64> {
    value
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .ok_or_else(|| BadgeError::InvalidCounter {
            kind: kind.to_string(),
            attribute,
            value: value.map(str::to_string),
        })
}

/// Missed/covered totals for one counter kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counter {
    pub kind: String,
    pub missed: u64,
    pub covered: u64,
}

impl Counter {
    pub fn percentage(&self) -> f64 {
        coverage_percentage(self.missed, self.covered)
    }
}

/// `covered / (missed + covered) * 100`, rounded to one decimal place.
///
/// Returns 0.0 when both counts are zero.
pub fn coverage_percentage(missed: u64, covered: u64) -> f64 {
    let total = u128::from(missed) + u128::from(covered);
    if total == 0 {
        return 0.0;
    }
    round_tenths(covered as f64 / total as f64 * 100.0)
}

/// Rounds to one decimal place, ties to even.
fn round_tenths(value: f64) -> f64 {
    // Float formatting is exact on the binary value and breaks ties to even.
    format!("{value:.1}").parse().unwrap_or(value)
}

/// Reads the report at `path` and returns its top-level counters in document order.
///
/// Only UTF-8 reports are accepted. A leading byte-order mark is skipped.
pub fn read_report(path: &Path) -> BadgeResult<Vec<CounterElement>> {
    let bytes = fs::read(path).map_err(|err| BadgeError::io(path, err))?;
    let xml = String::from_utf8(bytes).map_err(|err| {
        BadgeError::xml(
            path,
            err.utf8_error().valid_up_to() as u64,
            "report is not valid UTF-8",
        )
    })?;
    parse_counters(&xml).map_err(|err| err.with_path(path))
}

/// Parses a report held in memory. See [`read_report`].
pub fn parse_counters(xml: &str) -> BadgeResult<Vec<CounterElement>> {
    let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut counters = Vec::new();
    let mut depth: usize = 0;
    let mut seen_root = false;
    let mut first_event = true;

    loop {
        let event = reader
            .read_event()
            .map_err(|err| BadgeError::xml(IN_MEMORY, reader.error_position() as u64, err))?;
        let position = reader.buffer_position() as u64;

        match event {
            Event::Start(element) => {
                visit_element(&element, position, depth, &mut seen_root, &mut counters)?;
                depth += 1;
            }
            Event::Empty(element) => {
                visit_element(&element, position, depth, &mut seen_root, &mut counters)?;
            }
            Event::End(_) => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    BadgeError::xml(
                        IN_MEMORY,
                        position,
                        "closing tag without matching opening tag",
                    )
                })?;
            }
            Event::Text(_) | Event::CData(_) if depth == 0 => {
                return Err(BadgeError::xml(
                    IN_MEMORY,
                    position,
                    "text outside of the root element",
                ));
            }
            Event::Text(text) => {
                text.unescape()
                    .map_err(|err| BadgeError::xml(IN_MEMORY, position, err))?;
            }
            Event::Decl(_) if !first_event => {
                return Err(BadgeError::xml(
                    IN_MEMORY,
                    position,
                    "XML declaration not at start of document",
                ));
            }
            Event::Eof => break,
            _ => {}
        }
        first_event = false;
    }

    if !seen_root {
        return Err(BadgeError::xml(
            IN_MEMORY,
            reader.buffer_position() as u64,
            "no root element found",
        ));
    }
    if depth != 0 {
        return Err(BadgeError::xml(
            IN_MEMORY,
            reader.buffer_position() as u64,
            format!("unexpected end of input, {depth} element(s) left open"),
        ));
    }

    debug!(count = counters.len(), "Parsed top-level coverage counters");
    Ok(counters)
}

/// Checks every attribute of `element` and records it when it is a top-level counter.
fn visit_element(
    element: &BytesStart<'_>,
    position: u64,
    depth: usize,
    seen_root: &mut bool,
    counters: &mut Vec<CounterElement>,
) -> BadgeResult<()> {
    if depth == 0 {
        if *seen_root {
            return Err(BadgeError::xml(
                IN_MEMORY,
                position,
                "junk after document element",
            ));
        }
        *seen_root = true;
    }

    let mut counter = CounterElement::default();
    for attr in element.attributes() {
        let attr = attr.map_err(|err| BadgeError::xml(IN_MEMORY, position, err))?;
        let value = attr
            .unescape_value()
            .map_err(|err| BadgeError::xml(IN_MEMORY, position, err))?
            .into_owned();
        match attr.key.as_ref() {
            b"type" => counter.kind = Some(value),
            b"missed" => counter.missed = Some(value),
            b"covered" => counter.covered = Some(value),
            _ => {}
        }
    }

    if depth == 1 && element.name().as_ref() == b"counter" {
        counters.push(counter);
    }
    Ok(())
}

/// First counter of the given kind, if any.
pub fn find_counter(counters: &[CounterElement], kind: CounterKind) -> Option<&CounterElement> {
    counters.iter().find(|counter| counter.is_kind(kind))
}

/// Reads the report and returns the coverage percentage for `kind`.
///
/// A report without a matching top-level counter yields 0.0.
pub fn extract_coverage(path: &Path, kind: CounterKind) -> BadgeResult<f64> {
    if let Ok(cwd) = std::env::current_dir() {
        debug!(cwd = %cwd.display(), "Extracting coverage");
    }

    let counters = read_report(path)?;
    let Some(element) = find_counter(&counters, kind) else {
        warn!(
            counter = %kind,
            report = %path.display(),
            "No top-level counter of this kind, reporting 0.0%"
        );
        return Ok(0.0);
    };

    let counter = element.resolve()?;
    let coverage = counter.percentage();
    info!(
        coverage,
        counter = %kind,
        missed = counter.missed,
        covered = counter.covered,
        report = %path.display(),
        "Extracted coverage"
    );
    Ok(coverage)
}
