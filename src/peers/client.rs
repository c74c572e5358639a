use anyhow::{Context, Result};
use std::time::Duration;

use crate::protocol::types::{ENDPOINT_MESSAGE, Message};

/// Retry discipline for peer calls.
///
/// `max_attempts: None` retries forever, which preserves the bootstrap
/// contract of blocking until the transport connects. Tests use bounded
/// policies instead.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: Option<u32>,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn unbounded(backoff: Duration) -> Self {
        Self {
            max_attempts: None,
            backoff,
        }
    }

    pub fn bounded(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            backoff,
        }
    }
}

/// Request/reply handle to a single peer.
///
/// Wraps the process-wide pooled HTTP client plus the peer's address, so
/// repeated calls reuse one persistent connection. Calls carry no explicit
/// timeout: a stalled peer blocks its caller until the transport gives up.
#[derive(Debug, Clone)]
pub struct PeerClient {
    http: reqwest::Client,
    url: String,
}

impl PeerClient {
    pub fn new(http: reqwest::Client, addr: &str) -> Self {
        Self {
            http,
            url: format!("http://{}{}", addr, ENDPOINT_MESSAGE),
        }
    }

    /// One synchronous request/reply exchange.
    pub async fn call(&self, msg: &Message) -> Result<Message> {
        let response = self
            .http
            .post(&self.url)
            .json(msg)
            .send()
            .await
            .with_context(|| format!("Peer unreachable at {}", self.url))?;

        if !response.status().is_success() {
            anyhow::bail!("Peer rejected message: {}", response.status());
        }

        let reply: Message = response
            .json()
            .await
            .context("Peer reply did not decode as a Message")?;

        Ok(reply)
    }

    /// `call`, repeated under `policy` until a reply decodes.
    ///
    /// Any failed exchange counts as one attempt; a decoded reply is
    /// returned as-is for the caller to judge.
    pub async fn call_with_retry(&self, msg: &Message, policy: RetryPolicy) -> Result<Message> {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            match self.call(msg).await {
                Ok(reply) => return Ok(reply),
                Err(e) => {
                    if let Some(max) = policy.max_attempts
                        && attempt >= max
                    {
                        return Err(e.context(format!("Gave up after {} attempts", attempt)));
                    }

                    tracing::debug!("Call attempt {} failed: {:#}", attempt, e);
                    tokio::time::sleep(policy.backoff).await;
                }
            }
        }
    }
}
