// # IP Resolver Trait
//
// Defines the interface for determining the caller's current public
// IPv4 address.
//
// ## Implementations
//
// - HTTP echo-endpoint based: `ipwatch-resolver-http` crate
// - Test doubles live next to the engine contract tests
//
// ## Usage
//
// ```rust,ignore
// use ipwatch_core::IpResolver;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let resolver = /* IpResolver implementation */;
//     let ip = resolver.resolve().await?;
//     println!("public ip: {ip}");
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for public-IP resolver implementations
///
/// Resolvers are **observers**: they answer "what is my public IPv4 address
/// right now" and nothing else. They must not touch the history store and
/// must not make continuation/change decisions; that is the tick engine's
/// job.
///
/// A resolver call may block up to its own bounded timeout per upstream
/// attempt. Overall resolution time is bounded by
/// (number of endpoints x per-endpoint timeout) in the worst case.
#[async_trait]
pub trait IpResolver: Send + Sync {
    /// Resolve the current public IPv4 address
    ///
    /// # Returns
    ///
    /// - `Ok(Ipv4Addr)`: the first syntactically valid IPv4 answer
    /// - `Err(Error::Resolution)`: every upstream attempt failed or
    ///   returned a non-IPv4 answer
    async fn resolve(&self) -> Result<Ipv4Addr, crate::Error>;
}
