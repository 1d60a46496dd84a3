//! Reference name validation.
//!
//! Valid reference names:
//! - Must be non-empty
//! - Must not contain whitespace, `~`, `^`, `:`, `?`, `*`, `[`, `\`
//! - Must not contain `..` (double dot) or `@{`
//! - Must not start or end with `.` or `/`
//! - Must not end with `.lock`
//! - Must not contain consecutive slashes (`//`)
//! - Components between slashes must be non-empty and must not start with `.`

use crate::error::{RefdbError, RefdbResult};

/// Characters that are forbidden anywhere in a reference name.
const FORBIDDEN_CHARS: &[char] = &[' ', '\t', '\n', '\r', '~', '^', ':', '?', '*', '[', '\\'];

fn invalid(name: &str, reason: impl Into<String>) -> RefdbError {
    RefdbError::InvalidName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Validate a reference name, returning `Ok(())` if valid.
///
/// Applies to full canonical names (`refs/heads/main`, `refs/tags/v1`) and
/// top-level names (`HEAD`).
///
/// # Examples
///
/// ```
/// use arbor_refdb::names::validate_ref_name;
///
/// assert!(validate_ref_name("refs/heads/main").is_ok());
/// assert!(validate_ref_name("HEAD").is_ok());
/// assert!(validate_ref_name("").is_err());
/// assert!(validate_ref_name("refs/heads/bad..name").is_err());
/// ```
pub fn validate_ref_name(name: &str) -> RefdbResult<()> {
    if name.is_empty() {
        return Err(invalid(name, "reference name must not be empty"));
    }

    for ch in FORBIDDEN_CHARS {
        if name.contains(*ch) {
            return Err(invalid(name, format!("contains forbidden character: {ch:?}")));
        }
    }

    if name.contains("..") {
        return Err(invalid(name, "must not contain '..'"));
    }

    if name.contains("@{") {
        return Err(invalid(name, "must not contain '@{'"));
    }

    if name.starts_with('.') || name.ends_with('.') {
        return Err(invalid(name, "must not start or end with '.'"));
    }

    if name.starts_with('/') || name.ends_with('/') {
        return Err(invalid(name, "must not start or end with '/'"));
    }

    if name.ends_with(".lock") {
        return Err(invalid(name, "must not end with '.lock'"));
    }

    if name.contains("//") {
        return Err(invalid(name, "must not contain consecutive slashes '//'"));
    }

    for component in name.split('/') {
        if component.is_empty() {
            return Err(invalid(name, "path components must not be empty"));
        }
        if component.starts_with('.') {
            return Err(invalid(
                name,
                format!("component must not start with '.': {component:?}"),
            ));
        }
        if component.ends_with(".lock") {
            return Err(invalid(
                name,
                format!("component must not end with '.lock': {component:?}"),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_names() {
        assert!(validate_ref_name("HEAD").is_ok());
        assert!(validate_ref_name("refs/heads/main").is_ok());
        assert!(validate_ref_name("refs/heads/feature/auth").is_ok());
        assert!(validate_ref_name("refs/tags/v1.0.0").is_ok());
        assert!(validate_ref_name("refs/remotes/origin/main").is_ok());
    }

    #[test]
    fn rejects_empty() {
        assert!(validate_ref_name("").is_err());
    }

    #[test]
    fn rejects_forbidden_characters() {
        for bad in ["refs/heads/a b", "refs/heads/a~b", "refs/heads/a^b",
                    "refs/heads/a:b", "refs/heads/a?b", "refs/heads/a*b",
                    "refs/heads/a[b", "refs/heads/a\\b"] {
            assert!(validate_ref_name(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn rejects_double_dot_and_reflog_syntax() {
        assert!(validate_ref_name("refs/heads/a..b").is_err());
        assert!(validate_ref_name("refs/heads/a@{b").is_err());
    }

    #[test]
    fn rejects_boundary_dots_and_slashes() {
        assert!(validate_ref_name(".refs/heads/a").is_err());
        assert!(validate_ref_name("refs/heads/a.").is_err());
        assert!(validate_ref_name("/refs/heads/a").is_err());
        assert!(validate_ref_name("refs/heads/a/").is_err());
        assert!(validate_ref_name("refs//heads/a").is_err());
        assert!(validate_ref_name("refs/.hidden/a").is_err());
    }

    #[test]
    fn rejects_lock_suffix() {
        assert!(validate_ref_name("refs/heads/main.lock").is_err());
        assert!(validate_ref_name("refs/heads.lock/main").is_err());
    }
}
