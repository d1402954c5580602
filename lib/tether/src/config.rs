//! Transport configuration.
//!
//! Everything [`HyperTransport`](crate::HyperTransport) needs to know before
//! its first exchange: how long to wait, how many connections to keep, and
//! what to do with redirects.

use std::sync::Arc;
use std::time::Duration;

use crate::redirect::{CheckRedirect, default_redirect_policy};

/// What the transport does with a 3xx response carrying a `Location` header.
#[derive(Clone)]
pub enum RedirectPolicy {
    /// Return the 3xx response to the caller.
    Stop,
    /// Follow it, asking the hook before every hop.
    Follow(CheckRedirect),
}

impl RedirectPolicy {
    /// Follow with [`default_redirect_policy`].
    #[must_use]
    pub fn follow() -> Self {
        Self::Follow(Arc::new(default_redirect_policy))
    }

    /// The hook consulted before each hop, or `None` when redirects stop.
    #[must_use]
    pub fn hook(&self) -> Option<&CheckRedirect> {
        match self {
            Self::Stop => None,
            Self::Follow(hook) => Some(hook),
        }
    }
}

impl Default for RedirectPolicy {
    fn default() -> Self {
        Self::follow()
    }
}

impl std::fmt::Debug for RedirectPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stop => f.write_str("Stop"),
            Self::Follow(_) => f.write_str("Follow(..)"),
        }
    }
}

/// Connection pool limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Idle connections kept per host.
    pub max_idle_per_host: usize,
    /// How long an idle connection is kept.
    pub idle_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: 32,
            idle_timeout: Duration::from_secs(90),
        }
    }
}

/// Configuration for [`HyperTransport`](crate::HyperTransport).
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Timeout of one network exchange; each redirect hop gets its own.
    pub timeout: Duration,
    /// Time allowed to open a connection.
    pub connect_timeout: Duration,
    /// Connection pool limits.
    pub pool: PoolConfig,
    /// Redirect handling.
    pub redirect: RedirectPolicy,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool: PoolConfig::default(),
            redirect: RedirectPolicy::default(),
        }
    }
}

impl TransportConfig {
    /// Start from the defaults.
    #[must_use]
    pub fn builder() -> TransportConfigBuilder {
        TransportConfigBuilder::default()
    }

    /// Whether redirects are followed at all.
    #[must_use]
    pub const fn follows_redirects(&self) -> bool {
        matches!(self.redirect, RedirectPolicy::Follow(_))
    }
}

/// Builder for [`TransportConfig`], starting from the defaults.
#[derive(Debug, Clone, Default)]
pub struct TransportConfigBuilder {
    config: TransportConfig,
}

impl TransportConfigBuilder {
    /// Set the timeout of one network exchange.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the idle connections kept per host.
    #[must_use]
    pub const fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.config.pool.max_idle_per_host = count;
        self
    }

    /// Set how long idle connections are kept.
    #[must_use]
    pub const fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.pool.idle_timeout = timeout;
        self
    }

    /// Stop at redirects, or follow them.
    ///
    /// Turning following back on keeps a hook installed with
    /// [`check_redirect`](Self::check_redirect) if there is one.
    #[must_use]
    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.config.redirect = match (follow, self.config.redirect) {
            (false, _) => RedirectPolicy::Stop,
            (true, RedirectPolicy::Stop) => RedirectPolicy::follow(),
            (true, policy @ RedirectPolicy::Follow(_)) => policy,
        };
        self
    }

    /// Follow redirects, asking `hook` before every hop.
    #[must_use]
    pub fn check_redirect(mut self, hook: CheckRedirect) -> Self {
        self.config.redirect = RedirectPolicy::Follow(hook);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> TransportConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use tether_core::HttpRequest;

    use super::*;

    #[test]
    fn defaults() {
        let config = TransportConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.pool, PoolConfig::default());
        assert_eq!(config.pool.max_idle_per_host, 32);
        assert!(config.follows_redirects());
    }

    #[test]
    fn builder_keeps_unset_defaults() {
        let config = TransportConfig::builder()
            .timeout(Duration::from_secs(60))
            .pool_idle_timeout(Duration::from_secs(5))
            .build();

        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.pool.idle_timeout, Duration::from_secs(5));
        assert_eq!(config.pool.max_idle_per_host, 32);
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn stop_drops_the_hook() {
        let config = TransportConfig::builder().follow_redirects(false).build();
        assert!(!config.follows_redirects());
        assert!(config.redirect.hook().is_none());
    }

    #[test]
    fn custom_hook_survives_follow_toggle() {
        let hook: CheckRedirect = Arc::new(|_: &mut HttpRequest, _: &[HttpRequest]| {
            Err(tether_core::Error::InvalidRedirect("refused".to_string()))
        });
        let config = TransportConfig::builder()
            .check_redirect(Arc::clone(&hook))
            .follow_redirects(true)
            .build();

        let installed = config.redirect.hook().expect("following");
        assert!(Arc::ptr_eq(installed, &hook));
    }
}
