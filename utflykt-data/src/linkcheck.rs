//! Bounded-concurrency validation of outbound links.
//!
//! Each URL gets a header-only probe first; servers that reject or fail it
//! get one full fetch before the URL is declared unreachable. Probes run
//! concurrently but never more than the configured limit in flight, and the
//! output stays positionally aligned with the input regardless of
//! completion order.

use futures_util::{StreamExt as _, stream};
use reqwest::{Client, Response};
use utflykt_core::LinkCheck;

use crate::{ClientBuildError, build_client};

/// Default cap on simultaneous in-flight probes.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Probes external URLs for reachability.
pub struct LinkChecker {
    client: Client,
}

impl LinkChecker {
    /// Create a checker with the shared client configuration.
    pub fn new() -> Result<Self, ClientBuildError> {
        Ok(Self {
            client: build_client()?,
        })
    }

    /// Create a checker over an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Probe every URL, at most `concurrency` in flight at once.
    ///
    /// The result vector is positionally aligned with `urls`; a failed
    /// probe is a value in its slot, never an error for the batch.
    ///
    /// # Examples
    /// ```no_run
    /// # async fn example() -> Result<(), utflykt_data::ClientBuildError> {
    /// use utflykt_data::LinkChecker;
    ///
    /// let checker = LinkChecker::new()?;
    /// let urls = vec!["https://example.se".to_owned()];
    /// let outcomes = checker.check_all(&urls, 10).await;
    /// assert_eq!(outcomes.len(), urls.len());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn check_all(&self, urls: &[String], concurrency: usize) -> Vec<LinkCheck> {
        stream::iter(urls.iter().map(|url| self.check_one(url)))
            .buffered(concurrency.max(1))
            .collect()
            .await
    }

    /// Probe a single URL: HEAD with redirects, then one GET fallback.
    pub async fn check_one(&self, url: &str) -> LinkCheck {
        if let Ok(response) = self.client.head(url).send().await {
            let outcome = outcome_from(url, &response);
            if outcome.ok {
                return outcome;
            }
            // The server answered but not usefully; some reject HEAD with
            // 405 or an error page. Retry once with a full fetch, keeping
            // the HEAD outcome if the GET fails outright.
            return match self.client.get(url).send().await {
                Ok(response) => outcome_from(url, &response),
                Err(_) => outcome,
            };
        }
        match self.client.get(url).send().await {
            Ok(response) => outcome_from(url, &response),
            Err(err) => {
                log::debug!("link probe failed for {url}: {err}");
                LinkCheck {
                    ok: false,
                    status: None,
                    final_url: None,
                }
            }
        }
    }
}

/// Build an outcome from the final response after redirects.
///
/// Reachable means a final status in `[200, 400)`; the effective URL is
/// reported only when it differs from the probed one.
fn outcome_from(input: &str, response: &Response) -> LinkCheck {
    let status = response.status().as_u16();
    let final_url = response.url().as_str();
    LinkCheck {
        ok: (200..400).contains(&status),
        status: Some(status),
        final_url: (final_url != input).then(|| final_url.to_owned()),
    }
}
