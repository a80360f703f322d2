use std::time::Duration;

use reqwest::Client;
use tracing::warn;

const RETRY_DELAY: Duration = Duration::from_millis(250);

/// Download one remote segment, making up to `attempts` tries.
///
/// Transport errors, 5xx responses and body read failures are retried.
/// Any other non-success status fails straight away.
pub async fn fetch_segment(client: &Client, url: &str, attempts: u32) -> Result<Vec<u8>, String> {
    let attempts = attempts.max(1);

    for attempt in 1..=attempts {
        let last = attempt == attempts;

        if attempt > 1 {
            tokio::time::sleep(RETRY_DELAY).await;
        }

        let resp = match client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                let err_msg = format!("Request error (attempt #{attempt}): {e}");
                if last {
                    return Err(err_msg);
                }
                warn!("{err_msg}, retrying {url}");
                continue;
            }
        };

        let status = resp.status();
        if !status.is_success() {
            let err_msg = format!("Fetch failed (attempt #{attempt}): {status}");
            if last || !status.is_server_error() {
                return Err(err_msg);
            }
            warn!("{err_msg}, retrying {url}");
            continue;
        }

        match resp.bytes().await {
            Ok(bytes) => return Ok(bytes.to_vec()),
            Err(e) => {
                let err_msg = format!("Unable to read response body (attempt #{attempt}): {e}");
                if last {
                    return Err(err_msg);
                }
                warn!("{err_msg}, retrying {url}");
            }
        }
    }

    Err(format!("Ran out of attempts fetching {url}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_segment_server;

    #[actix_web::test]
    async fn downloads_body_bytes() {
        let server = spawn_segment_server(vec![("a.mp3", vec![1, 2, 3, 4])]);
        let bytes = fetch_segment(&Client::new(), &server.url("a.mp3"), 1)
            .await
            .unwrap();
        assert_eq!(bytes, vec![1, 2, 3, 4]);
    }

    #[actix_web::test]
    async fn client_errors_are_not_retried() {
        let server = spawn_segment_server(vec![]);
        let err = fetch_segment(&Client::new(), &server.url("missing.mp3"), 3)
            .await
            .unwrap_err();
        assert!(err.contains("404"), "{err}");
        assert!(err.contains("attempt #1"), "{err}");
    }

    #[actix_web::test]
    async fn server_errors_are_retried() {
        let server = spawn_segment_server(vec![("flaky", vec![9, 9])]);
        let client = Client::new();

        let bytes = fetch_segment(&client, &server.url("flaky"), 2).await.unwrap();
        assert_eq!(bytes, vec![9, 9]);
        assert_eq!(server.hits(), 2);
    }

    #[actix_web::test]
    async fn single_attempt_gives_up_on_server_error() {
        let server = spawn_segment_server(vec![("flaky", vec![9, 9])]);
        let err = fetch_segment(&Client::new(), &server.url("flaky"), 1)
            .await
            .unwrap_err();
        assert!(err.contains("503"), "{err}");
    }
}
