//! Splits an artifact filename into (project, version, kind) or rejects it.
//!
//! A total, pure, table-driven function over suffixes — no filesystem access,
//! no normalization (see [`crate::normalize`] for that). Grounded on the
//! suffix-strip / dash-split shape of
//! `astral-sh-uv/crates/distribution-filename/src/wheel_filename.rs`,
//! generalized from "wheel only" to the sdist/wheel/egg/signature set this
//! spec requires.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Sdist,
    Wheel,
    Egg,
    Signature,
    Unknown,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArtifactKind::Sdist => "sdist",
            ArtifactKind::Wheel => "wheel",
            ArtifactKind::Egg => "egg",
            ArtifactKind::Signature => "signature",
            ArtifactKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFilename {
    pub project_raw: String,
    pub version: String,
    pub kind: ArtifactKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadFilename(pub String);

impl fmt::Display for BadFilename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bad filename: {}", self.0)
    }
}

impl std::error::Error for BadFilename {}

/// Suffix, kind-if-bare, is-signature. Checked longest-first so `.tar.gz` is
/// matched before a hypothetical bare `.gz`, and `*.asc` variants are
/// checked before their bare counterparts.
const SUFFIXES: &[(&str, ArtifactKind, bool)] = &[
    (".tar.gz.asc", ArtifactKind::Sdist, true),
    (".tar.bz2.asc", ArtifactKind::Sdist, true),
    (".zip.asc", ArtifactKind::Sdist, true),
    (".tgz.asc", ArtifactKind::Sdist, true),
    (".whl.asc", ArtifactKind::Wheel, true),
    (".egg.asc", ArtifactKind::Egg, true),
    (".tar.gz", ArtifactKind::Sdist, false),
    (".tar.bz2", ArtifactKind::Sdist, false),
    (".zip", ArtifactKind::Sdist, false),
    (".tgz", ArtifactKind::Sdist, false),
    (".whl", ArtifactKind::Wheel, false),
    (".egg", ArtifactKind::Egg, false),
];

pub fn parse_filename(filename: &str) -> Result<ParsedFilename, BadFilename> {
    if filename.contains('/') || filename.contains('\\') {
        return Err(BadFilename(filename.to_string()));
    }

    let lower = filename.to_ascii_lowercase();
    let Some(&(suffix, inner_kind, is_sig)) =
        SUFFIXES.iter().find(|(suffix, _, _)| lower.ends_with(suffix))
    else {
        return Err(BadFilename(filename.to_string()));
    };

    let stem = &filename[..filename.len() - suffix.len()];
    let parts: Vec<&str> = stem.split('-').collect();

    let split = (1..parts.len())
        .rev()
        .find(|&i| starts_with_ascii_digit(parts[i]));
    let Some(split) = split else {
        return Err(BadFilename(filename.to_string()));
    };

    let project_raw = parts[..split].join("-");
    let version = parts[split].to_string();
    if project_raw.is_empty() || version.is_empty() {
        return Err(BadFilename(filename.to_string()));
    }

    let kind = if is_sig { ArtifactKind::Signature } else { inner_kind };
    Ok(ParsedFilename { project_raw, version, kind })
}

fn starts_with_ascii_digit(s: &str) -> bool {
    s.as_bytes().first().is_some_and(u8::is_ascii_digit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(name: &str) -> ParsedFilename {
        parse_filename(name).unwrap_or_else(|e| panic!("expected {name} to parse: {e}"))
    }

    #[test]
    fn simple_sdist() {
        let p = parse_ok("test-1.0.tar.gz");
        assert_eq!(p.project_raw, "test");
        assert_eq!(p.version, "1.0");
        assert_eq!(p.kind, ArtifactKind::Sdist);
    }

    #[test]
    fn project_name_with_embedded_dash() {
        let p = parse_ok("test-test-2.0.1.tar.gz");
        assert_eq!(p.project_raw, "test-test");
        assert_eq!(p.version, "2.0.1");
    }

    #[test]
    fn wheel_with_platform_tags() {
        let p = parse_ok("test-2.0-py2.py3-none-any.whl");
        assert_eq!(p.project_raw, "test");
        assert_eq!(p.version, "2.0");
        assert_eq!(p.kind, ArtifactKind::Wheel);
    }

    #[test]
    fn underscore_in_project_name_preserved_raw() {
        let p = parse_ok("foo_bar-1.0.tar.gz");
        assert_eq!(p.project_raw, "foo_bar");
        assert_eq!(p.version, "1.0");
    }

    #[test]
    fn egg() {
        let p = parse_ok("foo-1.0-py2.7.egg");
        assert_eq!(p.project_raw, "foo");
        assert_eq!(p.version, "1.0");
        assert_eq!(p.kind, ArtifactKind::Egg);
    }

    #[test]
    fn signature_reports_inner_kind() {
        let p = parse_ok("test-1.0.tar.gz.asc");
        assert_eq!(p.project_raw, "test");
        assert_eq!(p.version, "1.0");
        assert_eq!(p.kind, ArtifactKind::Signature);
    }

    #[test]
    fn other_suffixes() {
        assert_eq!(parse_ok("test-1.0.zip").kind, ArtifactKind::Sdist);
        assert_eq!(parse_ok("test-1.0.tgz").kind, ArtifactKind::Sdist);
        assert_eq!(parse_ok("test-1.0.tar.bz2").kind, ArtifactKind::Sdist);
    }

    #[test]
    fn rejects_path_separators() {
        assert!(parse_filename("../test-1.0.tar.gz").is_err());
        assert!(parse_filename("sub/test-1.0.tar.gz").is_err());
    }

    #[test]
    fn rejects_unknown_suffix() {
        assert!(parse_filename("test-1.0.exe").is_err());
        assert!(parse_filename("README.md").is_err());
    }

    #[test]
    fn rejects_missing_version() {
        assert!(parse_filename("noversion.tar.gz").is_err());
    }

    #[test]
    fn rejects_empty_project() {
        assert!(parse_filename("-1.0.tar.gz").is_err());
    }

    #[test]
    fn bad_filename_message() {
        let err = parse_filename("whatever.exe").unwrap_err();
        assert_eq!(err.to_string(), "Bad filename: whatever.exe");
    }
}
