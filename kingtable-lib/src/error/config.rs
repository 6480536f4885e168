//! Configuration error types

/// Errors caused by missing or contradictory table configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Neither a fetch endpoint nor a local collection was supplied.
    #[error("Missing data, or url option to fetch data")]
    MissingUrl,

    /// No column looks like an identifier and no id property was configured.
    #[error("Cannot guess which property should be used as id; set the id property explicitly")]
    AmbiguousIdProperty,

    /// An option holds a value outside its accepted range.
    #[error("Invalid option '{option}': {reason}")]
    InvalidOption {
        /// Name of the offending option.
        option: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The requested page size is not one of the configured choices.
    #[error("Page size {0} is not one of the allowed sizes")]
    PageSizeNotAllowed(usize),

    /// A column name does not match any known column.
    #[error("Unknown column '{0}'")]
    UnknownColumn(String),
}

impl ConfigError {
    /// Creates a new invalid option error.
    pub fn invalid(option: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            option,
            reason: reason.into(),
        }
    }
}
