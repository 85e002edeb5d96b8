use thiserror::Error;

/// Failure reported by a host-environment operation (storage, cookies, DOM,
/// workers, caches). Carries the operation name so logs stay readable.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{operation} failed: {message}")]
pub struct EnvError {
    pub operation: String,
    pub message: String,
}

impl EnvError {
    pub fn new(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// Errors surfaced by the public clearing entry points.
///
/// Step-local failures never show up here; they are absorbed into the
/// per-step outcomes of a `ClearReport`.
#[derive(Debug, Error)]
pub enum ClearError {
    /// The UI mount element does not exist. Raised before any storage is touched.
    #[error("mount point not found: #{0}")]
    MountNotFound(String),

    /// The version marker could not be persisted, so the pass does not count.
    #[error("failed to record version marker '{version}': {source}")]
    MarkerWrite {
        version: String,
        #[source]
        source: EnvError,
    },

    /// Progress or result markup could not be written into the mount element.
    #[error("failed to render into #{mount}: {source}")]
    Render {
        mount: String,
        #[source]
        source: EnvError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_error_display() {
        let err = EnvError::new("localStorage.setItem", "QuotaExceededError");
        assert_eq!(err.to_string(), "localStorage.setItem failed: QuotaExceededError");
    }

    #[test]
    fn test_marker_write_keeps_source() {
        let err = ClearError::MarkerWrite {
            version: "V2.1".into(),
            source: EnvError::new("setItem", "denied"),
        };
        assert!(err.to_string().contains("V2.1"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
