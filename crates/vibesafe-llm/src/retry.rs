//! Bounded exponential-backoff retry for transient provider failures
//! (`spec.md` §4.4: 3 attempts).

use std::time::Duration;

use vibesafe_utils::error::{ProviderError, ProviderErrorCategory};

const MAX_ATTEMPTS: u32 = 3;
const INITIAL_DELAY: Duration = Duration::from_millis(200);

/// Only network/quota failures are worth retrying; auth/protocol/malformed
/// failures will not resolve themselves on a second attempt.
fn is_retryable(err: &ProviderError) -> bool {
    matches!(
        err.category,
        ProviderErrorCategory::Network | ProviderErrorCategory::Quota
    )
}

/// Run `attempt` up to `MAX_ATTEMPTS` times with exponential backoff,
/// stopping early on a non-retryable error category.
pub async fn with_retry<F, Fut>(mut attempt: F) -> Result<String, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<String, ProviderError>>,
{
    let mut delay = INITIAL_DELAY;
    let mut last_err = None;

    for attempt_number in 1..=MAX_ATTEMPTS {
        match attempt().await {
            Ok(text) => return Ok(text),
            Err(err) => {
                let retryable = is_retryable(&err);
                last_err = Some(err);
                if !retryable || attempt_number == MAX_ATTEMPTS {
                    break;
                }
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }
    }

    Err(last_err.expect("loop runs at least once"))
}
