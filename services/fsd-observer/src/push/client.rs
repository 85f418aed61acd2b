//! HTTP client for the collector ingestion endpoint

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::TOKEN_HEADER;

use super::relay::LiveUpdate;

#[derive(Debug, Error)]
pub enum PushError {
    #[error("collector request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("collector returned HTTP {0}")]
    Status(u16),
}

/// Destination for table snapshots
#[async_trait]
pub trait Collector: Send + Sync + 'static {
    async fn deliver(&self, update: &LiveUpdate) -> Result<(), PushError>;
}

/// Posts snapshots as JSON with the shared-secret header
pub struct HttpCollector {
    client: reqwest::Client,
    url: String,
    token: String,
}

impl HttpCollector {
    pub fn new(url: &str, token: &str, timeout: Duration) -> Result<Self, PushError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.to_string(),
            token: token.to_string(),
        })
    }
}

#[async_trait]
impl Collector for HttpCollector {
    async fn deliver(&self, update: &LiveUpdate) -> Result<(), PushError> {
        let response = self
            .client
            .post(&self.url)
            .header(TOKEN_HEADER, &self.token)
            .json(update)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PushError::Status(status.as_u16()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StatusSnapshot;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::Value;
    use std::sync::{Arc, Mutex};

    type Received = Arc<Mutex<Vec<(Option<String>, Value)>>>;

    async fn spawn_collector(reply: StatusCode) -> (String, Received) {
        let received: Received = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route(
                "/api/live_update",
                post(
                    move |State(received): State<Received>, headers: HeaderMap, Json(body): Json<Value>| async move {
                        let token = headers
                            .get("x-fsd-token")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        received.lock().unwrap().push((token, body));
                        reply
                    },
                ),
            )
            .with_state(received.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}/api/live_update"), received)
    }

    fn empty_update() -> LiveUpdate {
        LiveUpdate {
            clients: Vec::new(),
            ts: 1_700_000_000,
            bot: StatusSnapshot {
                connected: false,
                since: None,
            },
        }
    }

    #[tokio::test]
    async fn test_posts_json_with_token() {
        let (url, received) = spawn_collector(StatusCode::OK).await;
        let collector = HttpCollector::new(&url, "s3cret", Duration::from_secs(3)).unwrap();

        collector.deliver(&empty_update()).await.unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        let (token, body) = &received[0];
        assert_eq!(token.as_deref(), Some("s3cret"));
        assert_eq!(
            body,
            &serde_json::json!({
                "clients": [],
                "ts": 1_700_000_000,
                "bot": {"connected": false, "since": null}
            })
        );
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let (url, _) = spawn_collector(StatusCode::UNAUTHORIZED).await;
        let collector = HttpCollector::new(&url, "wrong", Duration::from_secs(3)).unwrap();

        let err = collector.deliver(&empty_update()).await.unwrap_err();
        assert!(matches!(err, PushError::Status(401)));
    }

    #[tokio::test]
    async fn test_unreachable_collector_is_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = format!("http://{addr}/api/live_update");
        let collector = HttpCollector::new(&url, "t", Duration::from_secs(1)).unwrap();
        let err = collector.deliver(&empty_update()).await.unwrap_err();
        assert!(matches!(err, PushError::Http(_)));
    }
}
