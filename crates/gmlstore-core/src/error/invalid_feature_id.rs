use super::Error;

/// Error when an externally visible feature id cannot be decomposed into a
/// feature type and an id kernel.
#[derive(Debug)]
pub(super) struct InvalidFeatureId {
    id: Box<str>,
    reason: Box<str>,
}

impl std::error::Error for InvalidFeatureId {}

impl core::fmt::Display for InvalidFeatureId {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid feature id `{}`: {}", self.id, self.reason)
    }
}

impl Error {
    /// Creates an invalid feature id error.
    pub fn invalid_feature_id(id: impl Into<String>, reason: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidFeatureId(InvalidFeatureId {
            id: id.into().into(),
            reason: reason.into().into(),
        }))
    }

    /// Returns `true` if this error is an invalid feature id error.
    pub fn is_invalid_feature_id(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::InvalidFeatureId(_))
    }
}
