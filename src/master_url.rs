//! C1 — `MasterUrlResolver` (spec.md §4.1).

use crate::constants::MASTER_URL_PREFIX;
use crate::error::SubmitError;

/// Normalizes a user-supplied `k8s://…` master string into an https(s) URL.
///
/// `resolve("k8s://host")` → `"https://host"`; a scheme already present in
/// the remainder (`http://` or `https://`) is preserved as-is.
pub fn resolve(raw: &str) -> Result<String, SubmitError> {
    let rest = raw
        .strip_prefix(MASTER_URL_PREFIX)
        .ok_or_else(|| SubmitError::InvalidMasterUrl(raw.to_string()))?;

    if rest.starts_with("http://") || rest.starts_with("https://") {
        Ok(rest.to_string())
    } else {
        Ok(format!("https://{rest}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_prefix_and_defaults_to_https() {
        assert_eq!(
            resolve("k8s://cluster.example:6443").unwrap(),
            "https://cluster.example:6443"
        );
    }

    #[test]
    fn preserves_explicit_http_scheme() {
        assert_eq!(resolve("k8s://http://h:8080").unwrap(), "http://h:8080");
    }

    #[test]
    fn preserves_explicit_https_scheme() {
        assert_eq!(resolve("k8s://https://h:8080").unwrap(), "https://h:8080");
    }

    #[test]
    fn rejects_missing_prefix() {
        assert!(matches!(
            resolve("cluster"),
            Err(SubmitError::InvalidMasterUrl(s)) if s == "cluster"
        ));
    }
}
