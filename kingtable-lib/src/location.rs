//! URL query parameters and navigation notifications

use std::sync::PoisonError;
use std::sync::RwLock;

use tokio::sync::broadcast;
use url::Url;

use crate::error::ConfigError;

/// Read/write access to the current URL's query parameters.
///
/// Writes replace the current entry in place; they never count as a
/// navigation. Setting an empty value removes the key.
pub trait UrlParams: Send + Sync {
    /// Reads a query parameter.
    fn get(&self, key: &str) -> Option<String>;

    /// Writes a query parameter; an empty `value` removes it.
    fn set(&self, key: &str, value: &str);
}

/// The current location, shared between the tables that sync with it.
///
/// Also the navigation event source: [`navigate`](Self::navigate) stands in
/// for back/forward/hash changes and wakes every [`subscribe`](Self::subscribe)r
/// with a payload-less notification.
///
/// # Example
///
/// ```
/// use kingtable_lib::location::{LocationQuery, UrlParams};
///
/// let location = LocationQuery::parse("https://example.com/people?page=2").unwrap();
/// location.set("size", "50");
/// assert_eq!(location.get("page").as_deref(), Some("2"));
/// assert_eq!(location.href(), "https://example.com/people?page=2&size=50");
/// ```
#[derive(Debug)]
pub struct LocationQuery {
    url: RwLock<Url>,
    changes: broadcast::Sender<()>,
}

impl LocationQuery {
    /// Wraps an already parsed URL.
    pub fn new(url: Url) -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            url: RwLock::new(url),
            changes,
        }
    }

    /// Parses an absolute URL.
    pub fn parse(href: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(href).map_err(|e| ConfigError::invalid("location", e.to_string()))?;
        Ok(Self::new(url))
    }

    /// Returns the full current URL.
    pub fn href(&self) -> String {
        self.url
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .to_string()
    }

    /// Replaces the current URL as a navigation would and notifies subscribers.
    pub fn navigate(&self, href: &str) -> Result<(), ConfigError> {
        let url = Url::parse(href).map_err(|e| ConfigError::invalid("location", e.to_string()))?;
        *self.url.write().unwrap_or_else(PoisonError::into_inner) = url;
        log::debug!("navigated to {}", href);
        // Nobody listening is fine.
        let _ = self.changes.send(());
        Ok(())
    }

    /// Subscribes to navigation notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.changes.subscribe()
    }
}

impl UrlParams for LocationQuery {
    fn get(&self, key: &str) -> Option<String> {
        self.url
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    fn set(&self, key: &str, value: &str) {
        let mut url = self.url.write().unwrap_or_else(PoisonError::into_inner);
        let mut pairs: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != key)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        if !value.is_empty() {
            let at = url
                .query_pairs()
                .position(|(k, _)| k == key)
                .unwrap_or(pairs.len())
                .min(pairs.len());
            pairs.insert(at, (key.to_string(), value.to_string()));
        }

        if pairs.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(pairs);
        }
    }
}
