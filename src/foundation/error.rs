/// Convenience result type used across memekit.
pub type MemeResult<T> = Result<T, MemeError>;

/// Top-level error taxonomy used by editor and rasterizer APIs.
#[derive(thiserror::Error, Debug)]
pub enum MemeError {
    /// Invalid caller-provided data (catalog entries, scene files, settings).
    #[error("validation error: {0}")]
    Validation(String),

    /// An image source could not be resolved, read, or decoded.
    #[error("asset error: {0}")]
    Asset(String),

    /// The capture capability failed to produce an image.
    #[error("capture error: {0}")]
    Capture(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MemeError {
    /// Build a [`MemeError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MemeError::Asset`] value.
    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    /// Build a [`MemeError::Capture`] value.
    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture(msg.into())
    }

    /// Build a [`MemeError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for MemeError {
    fn from(err: serde_json::Error) -> Self {
        Self::serde(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            MemeError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(MemeError::asset("x").to_string().contains("asset error:"));
        assert!(
            MemeError::capture("x")
                .to_string()
                .contains("capture error:")
        );
        assert!(
            MemeError::serde("x")
                .to_string()
                .contains("serialization error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = MemeError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn json_errors_map_to_serde_variant() {
        let err: MemeError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, MemeError::Serde(_)));
    }
}
