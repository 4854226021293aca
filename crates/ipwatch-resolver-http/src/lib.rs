// # HTTP IP Resolver
//
// This crate provides the HTTP echo-endpoint implementation of the
// `IpResolver` seam.
//
// ## Architecture
//
// Several independent public IP-echo services are queried in random order;
// the first syntactically valid IPv4 answer wins. Randomizing the order
// spreads load across the services and keeps the job from depending on any
// single one being up.
//
// Each attempt is bounded by the per-endpoint timeout, so a full failure
// costs at most (endpoints x timeout).

use std::net::Ipv4Addr;
use std::time::Duration;

use ipwatch_core::{Error, IpResolver, Result};
use rand::seq::SliceRandom;
use tracing::{debug, warn};

pub mod diagnostics;

/// Default per-endpoint timeout
const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Default IP echo services, all answering plain text
const DEFAULT_ENDPOINTS: &[&str] = &[
    "https://api.ipify.org",  // 43KB/day free, returns plain text IP
    "https://ifconfig.me/ip", // No rate limit documented
    "https://icanhazip.com",  // No rate limit documented
];

/// HTTP-based public IP resolver
pub struct HttpIpResolver {
    /// Endpoints to query, tried in random order each resolve
    endpoints: Vec<String>,

    /// HTTP client, carries the per-endpoint timeout
    client: reqwest::Client,
}

impl HttpIpResolver {
    /// Create a resolver over the built-in endpoint list
    pub fn new() -> Self {
        Self::with_endpoints(
            DEFAULT_ENDPOINTS.iter().map(|s| s.to_string()).collect(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Create a resolver over a custom endpoint list and timeout
    ///
    /// An empty `endpoints` list falls back to the built-in defaults.
    pub fn with_endpoints(endpoints: Vec<String>, timeout: Duration) -> Self {
        let endpoints = if endpoints.is_empty() {
            DEFAULT_ENDPOINTS.iter().map(|s| s.to_string()).collect()
        } else {
            endpoints
        };
        Self {
            endpoints,
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    /// The endpoints this resolver will query
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Fetch and validate one endpoint's answer
    async fn fetch_one(&self, url: &str) -> std::result::Result<Ipv4Addr, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("http status {}", response.status()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| format!("failed to read response: {}", e))?;

        parse_ipv4_answer(&body)
    }
}

impl Default for HttpIpResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IpResolver for HttpIpResolver {
    async fn resolve(&self) -> Result<Ipv4Addr> {
        let mut order: Vec<&String> = self.endpoints.iter().collect();
        order.shuffle(&mut rand::thread_rng());

        let mut failures = Vec::with_capacity(order.len());
        for url in order {
            debug!("querying ip echo endpoint {}", url);
            match self.fetch_one(url).await {
                Ok(ip) => {
                    debug!("endpoint {} answered {}", url, ip);
                    return Ok(ip);
                }
                Err(e) => {
                    warn!("endpoint {} failed: {}", url, e);
                    failures.push(format!("{}: {}", url, e));
                }
            }
        }

        Err(Error::resolution(format!(
            "all {} endpoints failed: {}",
            failures.len(),
            failures.join("; ")
        )))
    }
}

/// Validate one endpoint's plain-text answer as an IPv4 address.
/// IPv6 answers are rejected: the tracker records IPv4 history only.
fn parse_ipv4_answer(body: &str) -> std::result::Result<Ipv4Addr, String> {
    let text = body.trim();
    text.parse::<Ipv4Addr>()
        .map_err(|_| format!("not an IPv4 address: {:?}", text))
}
