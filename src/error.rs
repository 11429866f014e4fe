//! Domain errors for the link lifecycle.
//!
//! These travel inside `anyhow::Error`; callers that need to branch on them
//! use `err.downcast_ref::<LinkError>()`.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// No manifest file at the given source path.
    #[error("No manifest found at {path:?}")]
    ManifestNotFound { path: PathBuf },

    /// The manifest exists but cannot be read as a package record.
    #[error("Invalid manifest {path:?}: {reason}")]
    ManifestInvalid { path: PathBuf, reason: String },

    /// No registry entry for the given package name or path.
    #[error("Package {0} is not linked")]
    EntryNotFound(String),

    /// Unlink was requested but there is no resolved package to restore.
    #[error(
        "Package {0} has no original package to restore. Run your dependency installer first, then unlink again."
    )]
    NoOriginalPackage(String),
}

impl LinkError {
    /// True if `err` wraps a [`LinkError::EntryNotFound`].
    pub fn is_entry_not_found(err: &anyhow::Error) -> bool {
        matches!(err.downcast_ref::<LinkError>(), Some(LinkError::EntryNotFound(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_subject() {
        let err = LinkError::ManifestNotFound {
            path: PathBuf::from("/work/foo/manifest.json"),
        };
        assert!(err.to_string().contains("/work/foo/manifest.json"));

        let err = LinkError::NoOriginalPackage("acme/foo".into());
        assert!(err.to_string().contains("acme/foo"));
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let err: anyhow::Error = LinkError::EntryNotFound("acme/foo".into()).into();
        assert!(LinkError::is_entry_not_found(&err));

        let err = anyhow::anyhow!("something else");
        assert!(!LinkError::is_entry_not_found(&err));
    }
}
