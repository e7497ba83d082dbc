//! Storage error types.

/// Errors from gateway fetches and storage-node uploads.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Client could not be configured.
    #[error("invalid storage configuration: {0}")]
    Config(String),

    /// The gateway did not return the object.
    #[error("gateway fetch failed for {cid}: {reason}")]
    UpstreamFetch { cid: String, reason: String },

    /// HTTP transport error talking to the storage node.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },

    /// The storage node returned a non-2xx status.
    #[error("storage node {endpoint} returned {status}: {body}")]
    UploadRejected {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// Upload response could not be parsed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },

    /// Upload succeeded but the response carried no content id.
    #[error("storage node response from {endpoint} has no Hash")]
    MissingHash { endpoint: String },

    /// The storage node returned a hash that is not a usable content id.
    #[error("storage node returned an unusable content id {hash:?}")]
    InvalidHash { hash: String },
}

impl StorageError {
    pub(crate) fn fetch(cid: &str, reason: impl Into<String>) -> Self {
        Self::UpstreamFetch {
            cid: cid.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_fetch_display() {
        let err = StorageError::fetch("Qm123", "HTTP 500");
        assert_eq!(err.to_string(), "gateway fetch failed for Qm123: HTTP 500");
    }
}
