//! Fetch protocol error types

/// Errors raised when a fetch response does not follow the catalog contract.
///
/// A response must be either a JSON array holding the whole collection, or an
/// object shaped like `{ "subset": [...], "total": <number>, "search"?: <string> }`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The response is an object without a `subset` array, or not an object at all.
    #[error("The returned object is not a catalog")]
    NotACatalog,

    /// The catalog does not carry a usable total rows count.
    #[error("Missing total items count in response object")]
    MissingTotal,

    /// A collection element is not a JSON object.
    #[error("Row {index} is not an object")]
    InvalidRow {
        /// Position of the offending element.
        index: usize,
    },
}
