//! Canonical project name normalization.
//!
//! This is the only function that defines project identity: lookups,
//! redirects, and JSON URLs all key off [`canonical`]. There is no separate
//! case map — canonical form is computed on demand from the raw name.

/// Lowercase `name` and collapse every maximal run of `-`, `_`, `.` into a
/// single `-`.
///
/// `canonical(canonical(name)) == canonical(name)` for every `name`.
pub fn canonical(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;
    for c in name.chars() {
        if c == '-' || c == '_' || c == '.' {
            if !in_run {
                out.push('-');
                in_run = true;
            }
        } else {
            out.push(c.to_ascii_lowercase());
            in_run = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases() {
        assert_eq!(canonical("FooBar"), "foobar");
    }

    #[test]
    fn collapses_runs_of_separators() {
        assert_eq!(canonical("foo__bar..baz"), "foo-bar-baz");
        assert_eq!(canonical("foo---bar"), "foo-bar");
        assert_eq!(canonical("foo_-.bar"), "foo-bar");
    }

    #[test]
    fn idempotent() {
        for name in ["FooBar", "foo_bar-1.0", "A.B_C-D"] {
            let once = canonical(name);
            assert_eq!(canonical(&once), once);
        }
    }

    #[test]
    fn matches_pypi_examples() {
        // PEP 503 normalization examples.
        assert_eq!(canonical("friendly-bard"), "friendly-bard");
        assert_eq!(canonical("Friendly-Bard"), "friendly-bard");
        assert_eq!(canonical("FRIENDLY-BARD"), "friendly-bard");
        assert_eq!(canonical("friendly.bard"), "friendly-bard");
        assert_eq!(canonical("friendly_bard"), "friendly-bard");
        assert_eq!(canonical("friendly--bard"), "friendly-bard");
        assert_eq!(canonical("FrIeNdLy-._.-bArD"), "friendly-bard");
    }
}
