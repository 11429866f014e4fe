//! Version strings for packages.

/// Version reported by every linked package, whatever its manifest says.
pub const LINKED_VERSION: &str = "dev-linked";

/// Version substituted when a manifest does not declare one.
pub const DEFAULT_MANIFEST_VERSION: &str = "dev-main";

/// Normalize a version for comparison.
///
/// - `v1.2.3` and `V1.2.3` drop the prefix
/// - numeric versions are padded to four components (`1.2` -> `1.2.0.0`)
/// - branch versions (`dev-main`) and anything non-numeric are kept as-is
pub fn normalize_version(version: &str) -> String {
    let trimmed = version.trim();
    if trimmed.starts_with("dev-") {
        return trimmed.to_string();
    }

    let stripped = match trimmed.strip_prefix(['v', 'V']) {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
        _ => trimmed,
    };

    let (numeric, suffix) = match stripped.find('-') {
        Some(idx) => (&stripped[..idx], &stripped[idx..]),
        None => (stripped, ""),
    };

    let parts: Vec<&str> = numeric.split('.').collect();
    let all_numeric = !parts.is_empty()
        && parts.len() <= 4
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));
    if !all_numeric {
        return stripped.to_string();
    }

    let mut padded: Vec<&str> = parts;
    while padded.len() < 4 {
        padded.push("0");
    }
    format!("{}{}", padded.join("."), suffix)
}

/// Stability flag derived from a version string.
pub fn stability_of(version: &str) -> &'static str {
    let lower = version.to_ascii_lowercase();
    if lower.starts_with("dev-") || lower.ends_with("-dev") {
        "dev"
    } else if lower.contains("alpha") {
        "alpha"
    } else if lower.contains("beta") {
        "beta"
    } else if lower.contains("rc") {
        "RC"
    } else {
        "stable"
    }
}
