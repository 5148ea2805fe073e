use super::Error;

/// Error when a geometry cannot be transformed into the storage CRS.
#[derive(Debug)]
pub(super) struct TransformFailed {
    from: Box<str>,
    to: Box<str>,
    message: Box<str>,
}

impl std::error::Error for TransformFailed {}

impl core::fmt::Display for TransformFailed {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "cannot transform geometry from {} to {}: {}",
            self.from, self.to, self.message
        )
    }
}

impl Error {
    /// Creates a coordinate transformation error.
    pub fn transform_failed(
        from: impl Into<String>,
        to: impl Into<String>,
        message: impl Into<String>,
    ) -> Error {
        Error::from(super::ErrorKind::TransformFailed(TransformFailed {
            from: from.into().into(),
            to: to.into().into(),
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is a coordinate transformation failure.
    pub fn is_transform_failed(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::TransformFailed(_))
    }
}
