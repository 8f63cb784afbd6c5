//! HTTP sessions with proxy binding and user-agent rotation
//!
//! One session per proxy; sessions are shared across concurrently running
//! wallets when there are fewer proxies than wallets.

use rand::seq::SliceRandom;
use std::time::Duration;

use crate::error::{RegistrarError, RegistrarResult};

/// Browser user agents rotated across sessions
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36 Edg/119.0.2151.97",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
];

/// One HTTP session, optionally bound to a proxy
///
/// Cheap to clone; the underlying client is reference-counted.
#[derive(Clone)]
pub struct Session {
    http: reqwest::Client,
    proxy: Option<String>,
}

impl Session {
    fn build(proxy: Option<&str>, timeout: Duration) -> RegistrarResult<Self> {
        let user_agent = USER_AGENTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(USER_AGENTS[0]);

        let mut builder = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent);
        if let Some(url) = proxy {
            let proxy = reqwest::Proxy::all(url).map_err(|e| {
                RegistrarError::Config(format!("invalid proxy url {}: {}", url, e))
            })?;
            builder = builder.proxy(proxy);
        }

        Ok(Self {
            http: builder.build()?,
            proxy: proxy.map(str::to_string),
        })
    }

    /// Get the HTTP client for this session
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Proxy URL this session routes through, if any
    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }
}

/// Rotating pool of sessions shared across wallet tasks
pub struct SessionPool {
    sessions: Vec<Session>,
}

impl SessionPool {
    /// Build one session per proxy, or a single direct session when the
    /// proxy list is empty
    pub fn build(proxies: &[String], timeout: Duration) -> RegistrarResult<Self> {
        let sessions = if proxies.is_empty() {
            vec![Session::build(None, timeout)?]
        } else {
            proxies
                .iter()
                .map(|proxy| Session::build(Some(proxy), timeout))
                .collect::<RegistrarResult<Vec<_>>>()?
        };

        Ok(Self { sessions })
    }

    /// Session for a wallet index, assigned round-robin
    pub fn assign(&self, index: usize) -> &Session {
        &self.sessions[index % self.sessions.len()]
    }

    /// Number of sessions in the pool
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
