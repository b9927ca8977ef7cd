//! Diagnostics — non-fatal issues recorded while loading, extracting,
//! building or transcoding a scene.
//!
//! Every best-effort operation returns its result wrapped in [`Parsed`],
//! so the caller can inspect what was dropped or defaulted. Each entry is
//! also forwarded to the `log` facade when it is recorded.

use std::fmt;

use serde::Serialize;

/// Pipeline stage that produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticStage {
    Loader,
    Extractor,
    Builder,
    Transcoder,
}

impl DiagnosticStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loader => "loader",
            Self::Extractor => "extractor",
            Self::Builder => "builder",
            Self::Transcoder => "transcoder",
        }
    }
}

/// How much attention a diagnostic deserves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Something was defaulted but nothing was lost
    Info,
    /// Input was dropped or replaced
    Warning,
}

/// One recorded issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub stage: DiagnosticStage,
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Info => "info",
            Severity::Warning => "warning",
        };
        write!(f, "[{} {}] {}", self.stage.as_str(), level, self.message)
    }
}

/// Ordered collection of diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning: something in the input was dropped or replaced
    pub fn warn(&mut self, stage: DiagnosticStage, message: impl Into<String>) {
        self.push(Diagnostic {
            stage,
            severity: Severity::Warning,
            message: message.into(),
        });
    }

    /// Record an informational note
    pub fn info(&mut self, stage: DiagnosticStage, message: impl Into<String>) {
        self.push(Diagnostic {
            stage,
            severity: Severity::Info,
            message: message.into(),
        });
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Warning => log::warn!("[LUSID {}] {}", diagnostic.stage.as_str(), diagnostic.message),
            Severity::Info => log::info!("[LUSID {}] {}", diagnostic.stage.as_str(), diagnostic.message),
        }
        self.entries.push(diagnostic);
    }

    /// Append another collection, keeping order
    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    /// Number of warnings (excluding info notes)
    pub fn warning_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    /// True if any message contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|d| d.message.contains(needle))
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// A best-effort result together with the diagnostics raised producing it
#[derive(Debug, Clone)]
pub struct Parsed<T> {
    pub value: T,
    pub diagnostics: Diagnostics,
}

impl<T> Parsed<T> {
    pub fn new(value: T, diagnostics: Diagnostics) -> Self {
        Self { value, diagnostics }
    }

    /// Split into value and diagnostics
    pub fn into_parts(self) -> (T, Diagnostics) {
        (self.value, self.diagnostics)
    }
}
