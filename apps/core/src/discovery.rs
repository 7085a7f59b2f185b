use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::model::Item;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// The backing API, tool or endpoint is not present. Expected on many setups.
    Unavailable,
    Timeout,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    kind: ProviderErrorKind,
    message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Failed,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Unavailable,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Timeout,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ProviderErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ProviderError {}

/// One source of activatable items feeding the inventory cache.
pub trait DiscoveryProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;
    fn discover(&self) -> Result<Vec<Item>, ProviderError>;
}

/// Returns a fixed item list. Counts calls so callers can assert on refresh traffic.
pub struct StaticProvider {
    name: &'static str,
    items: Vec<Item>,
    calls: AtomicUsize,
}

impl StaticProvider {
    pub fn from_items(name: &'static str, items: Vec<Item>) -> Self {
        Self {
            name,
            items,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DiscoveryProvider for StaticProvider {
    fn provider_name(&self) -> &'static str {
        self.name
    }

    fn discover(&self) -> Result<Vec<Item>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.items.clone())
    }
}

pub struct FailingProvider {
    name: &'static str,
    message: String,
}

impl FailingProvider {
    pub fn new(name: &'static str, message: &str) -> Self {
        Self {
            name,
            message: message.to_string(),
        }
    }
}

impl DiscoveryProvider for FailingProvider {
    fn provider_name(&self) -> &'static str {
        self.name
    }

    fn discover(&self) -> Result<Vec<Item>, ProviderError> {
        Err(ProviderError::unavailable(self.message.clone()))
    }
}
