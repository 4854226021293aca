//! Test doubles and common utilities for tick contract tests
//!
//! This module provides a scripted resolver double so tests control exactly
//! what each tick observes, without any network.

use std::net::Ipv4Addr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use ipwatch_core::error::{Error, Result};
use ipwatch_core::traits::IpResolver;

/// One scripted resolver answer
#[derive(Debug, Clone)]
pub enum Answer {
    Ip(Ipv4Addr),
    Failure(String),
}

/// A resolver that replays a preset script of answers
pub struct ScriptedResolver {
    /// Remaining answers, consumed front to back; the last one repeats
    script: Mutex<Vec<Answer>>,
    /// Call counter for resolve()
    resolve_call_count: AtomicUsize,
}

impl ScriptedResolver {
    pub fn new(script: Vec<Answer>) -> Self {
        assert!(!script.is_empty(), "script must not be empty");
        Self {
            script: Mutex::new(script),
            resolve_call_count: AtomicUsize::new(0),
        }
    }

    /// Resolver that always answers the same address
    pub fn fixed(ip: &str) -> Self {
        Self::new(vec![Answer::Ip(ip.parse().expect("valid ipv4 literal"))])
    }

    /// Resolver that always fails
    pub fn failing(message: &str) -> Self {
        Self::new(vec![Answer::Failure(message.to_string())])
    }

    /// Get the number of times resolve() was called
    pub fn resolve_call_count(&self) -> usize {
        self.resolve_call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpResolver for ScriptedResolver {
    async fn resolve(&self) -> Result<Ipv4Addr> {
        self.resolve_call_count.fetch_add(1, Ordering::SeqCst);

        let mut script = self.script.lock().unwrap();
        let answer = if script.len() > 1 {
            script.remove(0)
        } else {
            script[0].clone()
        };

        match answer {
            Answer::Ip(ip) => Ok(ip),
            Answer::Failure(message) => Err(Error::resolution(message)),
        }
    }
}

/// Parse an IPv4 literal, panicking loudly on typos in test data
pub fn ip(s: &str) -> Ipv4Addr {
    s.parse().expect("valid ipv4 literal")
}
