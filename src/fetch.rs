//! Page acquisition with retry, randomized backoff and user-agent rotation.
//!
//! # Architecture
//!
//! - [`PageSource`]: one GET, no retries. [`HttpPageSource`] implements it
//!   with `reqwest`; tests substitute scripted stubs.
//! - [`Fetcher`]: wraps any `PageSource` with the retry policy and owns the
//!   browser-like header set sent with every request.
//!
//! # Retry Strategy
//!
//! - Up to `max_attempts` GETs per URL; the first fires immediately
//! - Before attempt `n` the fetcher sleeps `uniform(min, max) * (n - 1)`
//! - Any transport error or non-2xx status is retryable
//! - A 403 additionally swaps the user agent for a fresh random one
//!
//! Exhausted attempts produce [`FetchResult::Failure`], never an error; the
//! caller decides how to degrade.

use crate::errors::FetchError;
use rand::{Rng, rng};
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONNECTION, REFERER, USER_AGENT};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml";
const ACCEPT_LANGUAGE_EN: &str = "en-US,en;q=0.9";

/// A successfully downloaded page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub body: String,
    /// URL after redirects.
    pub final_url: String,
}

/// Outcome of [`Fetcher::fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    Html(Page),
    Failure { reason: String },
}

/// Headers sent with every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserHeaders {
    pub user_agent: String,
    pub referer: String,
    /// Agents already burned by a 403; never handed out again.
    retired: HashSet<String>,
}

impl BrowserHeaders {
    pub fn new(referer: &str) -> Self {
        BrowserHeaders {
            user_agent: random_user_agent(),
            referer: referer.to_string(),
            retired: HashSet::new(),
        }
    }

    /// Replace the user agent with a random one not used before.
    pub fn rotate_user_agent(&mut self) {
        self.retired.insert(std::mem::take(&mut self.user_agent));
        loop {
            let candidate = random_user_agent();
            if !self.retired.contains(&candidate) {
                self.user_agent = candidate;
                return;
            }
        }
    }
}

/// A single-shot GET.
pub trait PageSource {
    async fn get(&self, url: &str, headers: &BrowserHeaders) -> Result<Page, FetchError>;
}

/// [`PageSource`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: Client,
}

impl HttpPageSource {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(HttpPageSource { client })
    }
}

impl PageSource for HttpPageSource {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn get(&self, url: &str, headers: &BrowserHeaders) -> Result<Page, FetchError> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, headers.user_agent.as_str())
            .header(ACCEPT, ACCEPT_HTML)
            .header(ACCEPT_LANGUAGE, ACCEPT_LANGUAGE_EN)
            .header(REFERER, headers.referer.as_str())
            .header(CONNECTION, "keep-alive")
            .send()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::from_status(status.as_u16()));
        }

        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(FetchError::from_reqwest_error)?;
        Ok(Page { body, final_url })
    }
}

/// Retry policy wrapped around a [`PageSource`].
#[derive(Debug)]
pub struct Fetcher<S> {
    source: S,
    headers: BrowserHeaders,
    max_attempts: usize,
    backoff_min: Duration,
    backoff_max: Duration,
}

impl<S> Fetcher<S>
where
    S: PageSource,
{
    /// # Arguments
    ///
    /// * `source` - The transport to retry
    /// * `referer` - Sent as the `Referer` header, normally the site root
    /// * `max_attempts` - GETs per URL including the first
    pub fn new(source: S, referer: &str, max_attempts: usize) -> Self {
        Fetcher {
            source,
            headers: BrowserHeaders::new(referer),
            max_attempts,
            backoff_min: Duration::from_millis(1000),
            backoff_max: Duration::from_millis(3000),
        }
    }

    /// Set the window of the randomized delay. A zero maximum disables it.
    pub fn with_backoff(mut self, min: Duration, max: Duration) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        self.backoff_min = min;
        self.backoff_max = max;
        self
    }

    pub fn user_agent(&self) -> &str {
        &self.headers.user_agent
    }

    #[cfg(test)]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// GET `url`, retrying until success or `max_attempts` is exhausted.
    ///
    /// A user agent that got past a 403 is kept for subsequent fetches.
    #[instrument(level = "info", skip(self), fields(max_attempts = self.max_attempts))]
    pub async fn fetch(&mut self, url: &str) -> FetchResult {
        let total_t0 = Instant::now();
        let mut last_error: Option<FetchError> = None;

        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                let delay = self.retry_delay(attempt);
                if !delay.is_zero() {
                    debug!(attempt, ?delay, "Sleeping before retry");
                    sleep(delay).await;
                }
            }

            let attempt_t0 = Instant::now();
            debug!(attempt, user_agent = %self.headers.user_agent, "Issuing GET");
            match self.source.get(url, &self.headers).await {
                Ok(page) => {
                    info!(
                        attempt,
                        bytes = page.body.len(),
                        final_url = %page.final_url,
                        elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                        "Fetched page"
                    );
                    return FetchResult::Html(page);
                }
                Err(e) => {
                    warn!(
                        attempt,
                        max = self.max_attempts,
                        status = ?e.status(),
                        elapsed_ms_attempt = attempt_t0.elapsed().as_millis() as u64,
                        error = %e,
                        "Fetch attempt failed"
                    );
                    if e.is_blocked() {
                        self.headers.rotate_user_agent();
                        warn!(user_agent = %self.headers.user_agent, "Blocked; rotated user agent");
                    }
                    last_error = Some(e);
                }
            }
        }

        let reason = match last_error {
            Some(e) => format!("gave up after {} attempts: {}", self.max_attempts, e),
            None => "no attempts configured".to_string(),
        };
        error!(
            elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
            %reason,
            "Fetch exhausted retries"
        );
        FetchResult::Failure { reason }
    }

    /// Randomized delay before `attempt` (2-based), growing with each retry.
    fn retry_delay(&self, attempt: usize) -> Duration {
        if self.backoff_max.is_zero() {
            return Duration::ZERO;
        }
        let min_ms = self.backoff_min.as_millis() as u64;
        let max_ms = self.backoff_max.as_millis() as u64;
        let base = rng().random_range(min_ms..=max_ms);
        Duration::from_millis(base.saturating_mul(attempt.saturating_sub(1) as u64))
    }
}

const PLATFORMS: &[&str] = &[
    "Windows NT 10.0; Win64; x64",
    "Macintosh; Intel Mac OS X 10_15_7",
    "X11; Linux x86_64",
];

/// A plausible desktop browser user agent with randomized version numbers.
pub fn random_user_agent() -> String {
    let mut r = rng();
    let platform = PLATFORMS[r.random_range(0..PLATFORMS.len())];
    match r.random_range(0..4u8) {
        0 => {
            let major = r.random_range(118..=131);
            let build = r.random_range(5000..=6800);
            let patch = r.random_range(10..=220);
            format!(
                "Mozilla/5.0 ({platform}) AppleWebKit/537.36 (KHTML, like Gecko) \
                 Chrome/{major}.0.{build}.{patch} Safari/537.36"
            )
        }
        1 => {
            let major = r.random_range(115..=133);
            format!("Mozilla/5.0 ({platform}; rv:{major}.0) Gecko/20100101 Firefox/{major}.0")
        }
        2 => {
            let major = r.random_range(15..=18);
            let minor = r.random_range(0..=6);
            format!(
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 \
                 (KHTML, like Gecko) Version/{major}.{minor} Safari/605.1.15"
            )
        }
        _ => {
            let major = r.random_range(118..=131);
            let build = r.random_range(2000..=2900);
            let patch = r.random_range(10..=120);
            format!(
                "Mozilla/5.0 ({platform}) AppleWebKit/537.36 (KHTML, like Gecko) \
                 Chrome/{major}.0.0.0 Safari/537.36 Edg/{major}.0.{build}.{patch}"
            )
        }
    }
}
