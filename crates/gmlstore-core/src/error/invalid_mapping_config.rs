use super::Error;

/// Error when an explicit mapping configuration cannot be used.
///
/// This occurs when:
/// - a feature type declaration has no table
/// - the FID generator is unknown or incomplete (sequence without a name)
/// - the configuration document is not valid TOML or misses required keys
///
/// These abort the schema build; they are reported before the store is usable.
#[derive(Debug)]
pub(super) struct InvalidMappingConfig {
    message: Box<str>,
}

impl std::error::Error for InvalidMappingConfig {}

impl core::fmt::Display for InvalidMappingConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid mapping configuration: {}", self.message)
    }
}

impl Error {
    /// Creates an invalid mapping configuration error.
    pub fn invalid_mapping_config(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidMappingConfig(InvalidMappingConfig {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error is an invalid mapping configuration error.
    pub fn is_invalid_mapping_config(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::InvalidMappingConfig(_))
    }
}
