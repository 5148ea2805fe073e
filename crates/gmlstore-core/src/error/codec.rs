use super::Error;

/// Error while encoding or decoding a feature payload.
#[derive(Debug)]
pub(super) struct CodecError {
    pub(super) inner: Box<dyn std::error::Error + Send + Sync>,
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.inner.as_ref())
    }
}

impl core::fmt::Display for CodecError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "feature codec failed: {}", self.inner)
    }
}

impl Error {
    /// Creates an error from a failing feature codec.
    pub fn codec(err: impl std::error::Error + Send + Sync + 'static) -> Error {
        Error::from(super::ErrorKind::Codec(CodecError {
            inner: Box::new(err),
        }))
    }

    /// Returns `true` if this error was raised by a feature codec.
    pub fn is_codec(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::Codec(_))
    }
}
