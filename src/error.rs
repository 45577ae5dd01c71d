//! Error types shared by the price cache, the fetchers and the orchestrator.

use std::fmt;
use std::sync::Arc;

use crate::hcloud::ApiError;

/// Errors raised while computing cost metrics.
///
/// Cloneable so that one failed price catalog fetch can be handed to every
/// caller that was waiting on it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExporterError {
    /// Listing resources of one kind from the provider failed.
    #[error("failed to list {kind}: {source}")]
    UpstreamList {
        kind: &'static str,
        #[source]
        source: Arc<ApiError>,
    },

    /// Fetching or parsing the price catalog failed.
    #[error("failed to fetch pricing from API: {0}")]
    PricingFetch(#[source] Arc<ApiError>),

    /// The catalog holds no entry for this exact (variant, location) pair.
    #[error("no {kind} pricing found for type {variant} in location {location}")]
    PriceNotFound {
        kind: &'static str,
        variant: String,
        location: String,
    },

    /// Pricing a single resource instance failed.
    #[error("could not get {kind} pricing for {name}: {source}")]
    Resource {
        kind: &'static str,
        name: String,
        #[source]
        source: Box<ExporterError>,
    },

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ExporterError {
    pub(crate) fn list(kind: &'static str, source: ApiError) -> Self {
        ExporterError::UpstreamList {
            kind,
            source: Arc::new(source),
        }
    }

    /// Adds the failing resource instance as context.
    pub(crate) fn for_resource(self, kind: &'static str, name: &str) -> Self {
        ExporterError::Resource {
            kind,
            name: name.to_string(),
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, skipping resource context.
    pub fn root(&self) -> &ExporterError {
        match self {
            ExporterError::Resource { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_price_not_found(&self) -> bool {
        matches!(self.root(), ExporterError::PriceNotFound { .. })
    }
}

/// A single fetcher failure within one fetch cycle.
#[derive(Debug, Clone)]
pub struct FetcherFailure {
    pub fetcher: &'static str,
    pub error: ExporterError,
}

/// Aggregated failures of one fetch cycle, in fetcher registration order.
#[derive(Debug, Clone)]
pub struct CycleError {
    failures: Vec<FetcherFailure>,
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let first = self.first();
        write!(
            f,
            "{} of the fetchers failed, first: {}: {}",
            self.failures.len(),
            first.fetcher,
            first.error
        )
    }
}

impl std::error::Error for CycleError {}

impl CycleError {
    /// Builds a cycle error; `None` when nothing failed.
    pub fn from_failures(failures: Vec<FetcherFailure>) -> Option<Self> {
        if failures.is_empty() {
            None
        } else {
            Some(Self { failures })
        }
    }

    pub fn failures(&self) -> &[FetcherFailure] {
        &self.failures
    }

    /// The first failure encountered in registration order.
    pub fn first(&self) -> &FetcherFailure {
        &self.failures[0]
    }
}
