//! Diagnostic reports and the log sink interface caller-side code implements.
//!
//! `Report` is the user-visible failure/warning model (spec §7); it is
//! distinct from the `log` crate records emitted internally for operational
//! tracing (see `shaderxc::diag` for the warning-category bitmask).
use std::fmt;

use crate::position::SourceArea;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Info,
    Warning,
    Error,
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReportKind::Info => write!(f, "info"),
            ReportKind::Warning => write!(f, "warning"),
            ReportKind::Error => write!(f, "error"),
        }
    }
}

/// A single diagnostic, as described in spec §7 "User-visible failure".
#[derive(Debug, Clone)]
pub struct Report {
    pub kind: ReportKind,
    pub message: String,
    pub area: Option<SourceArea>,
    pub line_excerpt: Option<String>,
    pub marker: Option<(u32, u32)>, // (column, length) caret-underline within line_excerpt
    pub hints: Vec<String>,
}

impl Report {
    pub fn error(message: impl Into<String>) -> Self {
        Self { kind: ReportKind::Error, message: message.into(), area: None, line_excerpt: None, marker: None, hints: Vec::new() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { kind: ReportKind::Warning, message: message.into(), area: None, line_excerpt: None, marker: None, hints: Vec::new() }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self { kind: ReportKind::Info, message: message.into(), area: None, line_excerpt: None, marker: None, hints: Vec::new() }
    }

    pub fn with_area(mut self, area: SourceArea) -> Self {
        self.area = Some(area);
        self
    }

    pub fn with_excerpt(mut self, line_excerpt: impl Into<String>) -> Self {
        self.line_excerpt = Some(line_excerpt.into());
        self
    }

    pub fn with_marker(mut self, column: u32, length: u32) -> Self {
        self.marker = Some((column, length));
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }
}

/// Sink the caller injects to receive diagnostics. Does not return status;
/// the caller accumulates severities and `compile()` returns a bare success flag.
pub trait LogSink {
    fn submit(&mut self, report: Report);
}

/// A sink that collects every report into a `Vec`, for tests and simple drivers.
#[derive(Debug, Default)]
pub struct CollectingLogSink {
    pub reports: Vec<Report>,
}

impl CollectingLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        self.reports.iter().any(|r| r.kind == ReportKind::Error)
    }
}

impl LogSink for CollectingLogSink {
    fn submit(&mut self, report: Report) {
        self.reports.push(report);
    }
}

/// Warning categories, as a bitmask (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarningMask(u32);

impl WarningMask {
    pub const BASIC: Self = Self(1 << 0);
    pub const SYNTAX: Self = Self(1 << 1);
    pub const PRE_PROCESSOR: Self = Self(1 << 2);
    pub const UNUSED_VARIABLES: Self = Self(1 << 3);
    pub const EMPTY_STATEMENT_BODY: Self = Self(1 << 4);
    pub const IMPLICIT_TYPE_CONVERSIONS: Self = Self(1 << 5);
    pub const DECLARATION_SHADOWING: Self = Self(1 << 6);
    pub const UNLOCATED_OBJECTS: Self = Self(1 << 7);
    pub const REQUIRED_EXTENSIONS: Self = Self(1 << 8);
    pub const CODE_REFLECTION: Self = Self(1 << 9);
    pub const INDEX_BOUNDARY: Self = Self(1 << 10);

    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(0x7FF);

    pub const fn contains(self, flag: Self) -> bool {
        self.0 & flag.0 == flag.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl Default for WarningMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl std::ops::BitOr for WarningMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}
