//! Loaded data wrapper with origin information

/// Rows (or anything derived from them) together with where they came from.
///
/// Rendering code branches on the origin: data resolved synchronously from the
/// held collection needs no loading indicator, freshly fetched data does.
///
/// # Example
///
/// ```
/// use kingtable_lib::Loaded;
///
/// let loaded = Loaded::synchronous(vec![1, 2, 3]);
/// assert!(loaded.is_synchronous());
///
/// let count = loaded.map(|rows| rows.len());
/// assert_eq!(*count.data(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
    data: T,
    /// Where the data came from.
    pub origin: Origin,
}

impl<T> Loaded<T> {
    /// Wraps data resolved from the collection already held by the table.
    pub fn synchronous(data: T) -> Self {
        Self {
            data,
            origin: Origin::Synchronous,
        }
    }

    /// Wraps data that was just returned by the transport.
    pub fn fetched(data: T) -> Self {
        Self {
            data,
            origin: Origin::Fetched,
        }
    }

    /// Returns `true` if no request was needed.
    pub fn is_synchronous(&self) -> bool {
        self.origin == Origin::Synchronous
    }

    /// Returns a reference to the inner data.
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Consumes the wrapper and returns the inner data.
    pub fn into_inner(self) -> T {
        self.data
    }

    /// Maps the inner data, keeping the origin.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Loaded<U> {
        Loaded {
            data: f(self.data),
            origin: self.origin,
        }
    }
}

/// Where loaded data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Resolved from the fixed collection without a request.
    Synchronous,
    /// Returned by an accepted network fetch.
    Fetched,
}

/// Result of a fetch cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    /// The response was accepted and applied.
    Loaded(Loaded<T>),
    /// A newer fetch was started before this one finished; nothing was applied.
    Stale,
}

impl<T> FetchOutcome<T> {
    /// Returns the loaded data, or `None` if the response was discarded.
    pub fn loaded(self) -> Option<Loaded<T>> {
        match self {
            FetchOutcome::Loaded(loaded) => Some(loaded),
            FetchOutcome::Stale => None,
        }
    }

    /// Returns `true` if the response was discarded.
    pub fn is_stale(&self) -> bool {
        matches!(self, FetchOutcome::Stale)
    }
}
