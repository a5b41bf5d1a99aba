use std::time::Duration;

use jsonwebtoken::Algorithm;

use crate::codec::is_rsa_family;
use crate::error::Error;
use crate::error::Result;

/// Default period between background key refreshes (15 minutes)
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Default validity window of issued tokens (15 minutes)
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(15 * 60);

/// Default upper bound on a single fetch from the key source
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Algorithms a validator accepts unless configured otherwise
pub const DEFAULT_ACCEPTED_ALGORITHMS: [Algorithm; 3] =
    [Algorithm::RS256, Algorithm::RS384, Algorithm::RS512];

/// Configuration for the token generator
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Subject placed in tokens issued by `generate()`
    pub(crate) subject: String,
    /// Validity window of issued tokens (default: 15 minutes)
    pub(crate) token_ttl: Duration,
    /// Period between signing key refreshes (default: 15 minutes)
    pub(crate) refresh_interval: Duration,
    /// Bound on each fetch, including the initial one (default: 10 seconds)
    pub(crate) fetch_timeout: Option<Duration>,
}

impl GeneratorConfig {
    /// Create a new configuration issuing tokens for the given subject
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            token_ttl: DEFAULT_TOKEN_TTL,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            fetch_timeout: Some(DEFAULT_FETCH_TIMEOUT),
        }
    }

    /// Set how long issued tokens stay valid
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Set the period between signing key refreshes
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Set the bound on each fetch from the key source
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Let fetches run for as long as the key source takes
    pub fn without_fetch_timeout(mut self) -> Self {
        self.fetch_timeout = None;
        self
    }
}

/// Configuration for the token validator
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Period between trusted key set refreshes (default: 15 minutes)
    pub(crate) refresh_interval: Duration,
    /// Bound on each fetch, including the initial one (default: 10 seconds)
    pub(crate) fetch_timeout: Option<Duration>,
    /// Header algorithms tokens may declare (default: RS256, RS384, RS512)
    pub(crate) accepted_algorithms: Vec<Algorithm>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidatorConfig {
    pub fn new() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            fetch_timeout: Some(DEFAULT_FETCH_TIMEOUT),
            accepted_algorithms: DEFAULT_ACCEPTED_ALGORITHMS.to_vec(),
        }
    }

    /// Set the period between trusted key set refreshes
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Set the bound on each fetch from the key source
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Let fetches run for as long as the key source takes
    pub fn without_fetch_timeout(mut self) -> Self {
        self.fetch_timeout = None;
        self
    }

    /// Set the header algorithms tokens may declare
    ///
    /// # Errors
    /// - `Error::NoAlgorithmsConfigured` if the list is empty
    /// - `Error::AlgorithmMismatch` if an algorithm is outside the RSA family
    pub fn with_algorithms(mut self, algorithms: Vec<Algorithm>) -> Result<Self> {
        if algorithms.is_empty() {
            return Err(Error::NoAlgorithmsConfigured);
        }
        if let Some(other) = algorithms.iter().find(|alg| !is_rsa_family(**alg)) {
            return Err(Error::AlgorithmMismatch(format!("{other:?}")));
        }
        self.accepted_algorithms = algorithms;
        Ok(self)
    }
}
