//! Rate-limit friendly request sending for the lookup client.

use crate::debug::{self, cat};
use rand::{thread_rng, Rng};
use std::time::Duration;

/// HTTP statuses worth another attempt.
pub fn is_transient(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Send `rb`, retrying transient statuses and connection errors up to `max_retries` times.
///
/// Timeouts are returned immediately; they already cost the caller a full request budget.
pub async fn send_with_backoff(
    rb: reqwest::RequestBuilder,
    label: &str,
    max_retries: u8,
) -> Result<reqwest::Response, reqwest::Error> {
    let mut attempt = 0u8;
    loop {
        // Streaming bodies cannot be cloned; those get exactly one attempt.
        let Some(this_try) = rb.try_clone() else {
            return rb.send().await;
        };
        match this_try.send().await {
            Ok(r) => {
                if is_transient(r.status().as_u16()) && attempt < max_retries {
                    attempt += 1;
                    let back_ms = backoff_delay_ms(attempt);
                    log::warn!(
                        "{} {} retry={} backoff={}ms",
                        r.status().as_u16(),
                        label,
                        attempt,
                        back_ms
                    );
                    tokio::time::sleep(Duration::from_millis(back_ms)).await;
                    continue;
                }
                if debug::is(cat::NET) {
                    debug::log(cat::NET, format!("{label} -> {}", r.status()));
                }
                return Ok(r);
            }
            Err(e) => {
                if !e.is_timeout() && attempt < max_retries {
                    attempt += 1;
                    let back_ms = backoff_delay_ms(attempt);
                    log::warn!("err {label} retry={attempt} backoff={back_ms}ms : {e}");
                    tokio::time::sleep(Duration::from_millis(back_ms)).await;
                    continue;
                }
                return Err(e);
            }
        }
    }
}

fn backoff_delay_ms(attempt: u8) -> u64 {
    let base = 300u64.saturating_mul(1u64 << (attempt.clamp(1, 6) - 1)); // 300,600,1200,2400,4800,9600
    let jitter: u64 = thread_rng().gen_range(0..=250);
    base + jitter
}
