//! Image list (manifest) parser
//!
//! Turns the line-oriented image list into [`MirrorTask`]s. Malformed lines
//! never abort parsing: each one is recorded as a [`ManifestWarning`], logged,
//! and skipped.

use crate::error::{CoreError, Result};
use crate::model::{DestinationKind, MirrorTask};
use std::fmt;
use std::path::Path;

/// Why a manifest line was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningKind {
    /// Fewer than two whitespace-separated tokens
    InvalidFormat,
    /// None of the destination tags is a known destination
    InvalidDestination(String),
}

/// A rejected manifest line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestWarning {
    pub line_number: usize,
    pub kind: WarningKind,
}

impl fmt::Display for ManifestWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            WarningKind::InvalidFormat => {
                write!(f, "Line {}: Invalid format, skipping", self.line_number)
            }
            WarningKind::InvalidDestination(dest) => write!(
                f,
                "Line {}: Invalid destination '{}', skipping",
                self.line_number, dest
            ),
        }
    }
}

/// Result of parsing a manifest
#[derive(Debug, Clone, Default)]
pub struct ParsedManifest {
    pub tasks: Vec<MirrorTask>,
    pub warnings: Vec<ManifestWarning>,
}

/// Parse manifest text
pub fn parse_manifest(content: &str) -> ParsedManifest {
    let mut parsed = ParsedManifest::default();

    for (index, raw) in content.lines().enumerate() {
        let line_number = index + 1;
        match parse_line(raw, line_number) {
            LineOutcome::Skip => {}
            LineOutcome::Task(task) => parsed.tasks.push(task),
            LineOutcome::Rejected(warning) => {
                tracing::warn!("{}", warning);
                parsed.warnings.push(warning);
            }
        }
    }

    tracing::debug!(
        tasks = parsed.tasks.len(),
        rejected = parsed.warnings.len(),
        "Parsed image list"
    );

    parsed
}

/// Read and parse a manifest file
pub fn load_manifest_file(path: &Path) -> Result<ParsedManifest> {
    if !path.exists() {
        return Err(CoreError::ManifestNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|source| CoreError::ManifestRead {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(parse_manifest(&content))
}

enum LineOutcome {
    Skip,
    Task(MirrorTask),
    Rejected(ManifestWarning),
}

fn parse_line(raw: &str, line_number: usize) -> LineOutcome {
    let line = raw.trim();

    if line.is_empty() || line.starts_with('#') || line.starts_with("--") {
        return LineOutcome::Skip;
    }

    // Tokens past the source reference (e.g. trailing comments) are ignored
    let mut tokens = line.split_whitespace();
    let (Some(dest), Some(source)) = (tokens.next(), tokens.next()) else {
        return LineOutcome::Rejected(ManifestWarning {
            line_number,
            kind: WarningKind::InvalidFormat,
        });
    };

    let destinations: Vec<String> = dest.split(',').map(|d| d.trim().to_string()).collect();

    if !destinations
        .iter()
        .any(|d| DestinationKind::is_known_tag(d))
    {
        return LineOutcome::Rejected(ManifestWarning {
            line_number,
            kind: WarningKind::InvalidDestination(dest.to_string()),
        });
    }

    LineOutcome::Task(MirrorTask::new(destinations, source, line_number))
}
