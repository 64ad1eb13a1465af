use crate::{
    client::transport::{ReqwestTransport, Transport},
    config::FirestoreConfig,
    error::{ImageGenError, Result},
    feed::traits::{ImageFeed, SnapshotStream},
    models::{FeedOrder, GeneratedImage},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;

/// Reads the history collection through the Firestore REST `runQuery`
/// endpoint. Live updates are emulated by polling and only emitting
/// snapshots that differ from the previous one.
#[derive(Clone)]
pub struct FirestoreFeed {
    config: FirestoreConfig,
    transport: Arc<dyn Transport>,
    query_url: String,
}

impl FirestoreFeed {
    pub fn new(config: FirestoreConfig) -> Result<Self> {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(config: FirestoreConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        if config.poll_interval.is_zero() {
            return Err(ImageGenError::ConfigError(
                "Firestore poll interval must be greater than zero".into(),
            ));
        }
        let query_url = config.run_query_url()?;
        Ok(Self {
            config,
            transport,
            query_url,
        })
    }

    fn build_query(&self, order: &FeedOrder) -> Value {
        json!({
            "structuredQuery": {
                "from": [{ "collectionId": self.config.collection }],
                "orderBy": [{
                    "field": { "fieldPath": order.field },
                    "direction": order.direction.as_str()
                }]
            }
        })
    }

    async fn fetch(
        transport: &dyn Transport,
        url: &str,
        query: &Value,
    ) -> Result<Vec<GeneratedImage>> {
        let response = transport.post_json(url, query).await?;

        if !response.is_success() {
            return Err(ImageGenError::NetworkError(format!(
                "Firestore query failed: HTTP {}: {}",
                response.status, response.body
            )));
        }

        parse_run_query(&response.body)
    }
}

#[async_trait]
impl ImageFeed for FirestoreFeed {
    fn subscribe(&self, order: FeedOrder) -> Result<SnapshotStream> {
        let query = self.build_query(&order);
        let url = self.query_url.clone();
        let transport = self.transport.clone();
        let interval = self.config.poll_interval;

        let (tx, rx) = tokio::sync::mpsc::channel(16);

        tokio::spawn(async move {
            let mut last: Option<Vec<GeneratedImage>> = None;
            loop {
                let item = match Self::fetch(transport.as_ref(), &url, &query).await {
                    Ok(snapshot) if last.as_ref() == Some(&snapshot) => None,
                    Ok(snapshot) => {
                        log::debug!("Firestore snapshot changed: {} records", snapshot.len());
                        last = Some(snapshot.clone());
                        Some(Ok(snapshot))
                    }
                    Err(e) => {
                        log::warn!("Firestore poll failed: {}", e);
                        Some(Err(e))
                    }
                };

                if let Some(item) = item {
                    if tx.send(item).await.is_err() {
                        break;
                    }
                }

                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = tx.closed() => break,
                }
            }
            log::debug!("Firestore subscription closed");
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }

    async fn snapshot(&self, order: FeedOrder) -> Result<Vec<GeneratedImage>> {
        let query = self.build_query(&order);
        Self::fetch(self.transport.as_ref(), &self.query_url, &query).await
    }
}

/// Decodes a `runQuery` response body. Results keep the server's order;
/// entries without a document (e.g. a bare `readTime`) and documents missing
/// a field are skipped.
pub fn parse_run_query(body: &str) -> Result<Vec<GeneratedImage>> {
    let results: Vec<Value> = serde_json::from_str(body)
        .map_err(|e| ImageGenError::ResponseError(format!("Invalid Firestore response: {}", e)))?;

    let mut images = Vec::with_capacity(results.len());
    for result in &results {
        let Some(document) = result.get("document") else {
            continue;
        };
        match parse_document(document) {
            Some(image) => images.push(image),
            None => log::warn!(
                "Skipping malformed Firestore document: {}",
                document["name"].as_str().unwrap_or("unknown")
            ),
        }
    }
    Ok(images)
}

fn parse_document(document: &Value) -> Option<GeneratedImage> {
    let fields = document.get("fields")?;
    let image = fields["image"]["stringValue"].as_str()?;
    let prompt = fields["prompt"]["stringValue"].as_str()?;
    let timestamp = fields["timestamp"]["timestampValue"].as_str()?;
    let timestamp = DateTime::parse_from_rfc3339(timestamp)
        .ok()?
        .with_timezone(&Utc);

    Some(GeneratedImage::new(image, prompt, timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::transport::testing::StubTransport;
    use futures::StreamExt;
    use std::time::Duration;

    const RUN_QUERY_BODY: &str = r#"[
        {
            "document": {
                "name": "projects/p/databases/d/documents/generated-images/c",
                "fields": {
                    "image": { "stringValue": "https://storage.googleapis.com/b/generated-images/c.png" },
                    "prompt": { "stringValue": "third" },
                    "timestamp": { "timestampValue": "2025-03-01T10:00:03.000Z" }
                }
            },
            "readTime": "2025-03-01T10:05:00Z"
        },
        {
            "document": {
                "name": "projects/p/databases/d/documents/generated-images/b",
                "fields": {
                    "image": { "stringValue": "https://storage.googleapis.com/b/generated-images/b.png" },
                    "prompt": { "stringValue": "second" },
                    "timestamp": { "timestampValue": "2025-03-01T10:00:02.000Z" }
                }
            }
        },
        {
            "document": {
                "name": "projects/p/databases/d/documents/generated-images/broken",
                "fields": {
                    "prompt": { "stringValue": "no image" }
                }
            }
        },
        {
            "document": {
                "name": "projects/p/databases/d/documents/generated-images/a",
                "fields": {
                    "image": { "stringValue": "https://storage.googleapis.com/b/generated-images/a.png" },
                    "prompt": { "stringValue": "first" },
                    "timestamp": { "timestampValue": "2025-03-01T10:00:01.000Z" }
                }
            }
        }
    ]"#;

    fn config() -> FirestoreConfig {
        FirestoreConfig::new()
            .with_project("p")
            .with_database("d")
            .with_poll_interval(Duration::from_millis(10))
    }

    #[test]
    fn test_parse_run_query_keeps_server_order() {
        let images = parse_run_query(RUN_QUERY_BODY).unwrap();
        let prompts: Vec<&str> = images.iter().map(|i| i.prompt.as_str()).collect();
        assert_eq!(prompts, vec!["third", "second", "first"]);
        assert!(images[0].timestamp > images[1].timestamp);
        assert!(images[1].timestamp > images[2].timestamp);
    }

    #[test]
    fn test_parse_empty_collection() {
        let images = parse_run_query(r#"[{"readTime":"2025-03-01T10:05:00Z"}]"#).unwrap();
        assert!(images.is_empty());
    }

    #[test]
    fn test_parse_invalid_body() {
        assert!(matches!(
            parse_run_query("not json"),
            Err(ImageGenError::ResponseError(_))
        ));
    }

    #[test]
    fn test_missing_project_is_config_error() {
        let result = FirestoreFeed::new(FirestoreConfig::new());
        assert!(matches!(result, Err(ImageGenError::ConfigError(_))));
    }

    #[test]
    fn test_zero_poll_interval_is_config_error() {
        let transport = Arc::new(StubTransport::responding(200, "[]"));
        let result = FirestoreFeed::with_transport(
            config().with_poll_interval(Duration::ZERO),
            transport.clone(),
        );

        assert!(matches!(result, Err(ImageGenError::ConfigError(_))));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_snapshot_requests_descending_timestamp() {
        let transport = Arc::new(StubTransport::responding(200, RUN_QUERY_BODY));
        let feed = FirestoreFeed::with_transport(config(), transport.clone()).unwrap();

        let images = feed.snapshot(FeedOrder::newest_first()).await.unwrap();
        assert_eq!(images.len(), 3);

        let (url, body) = transport.last_request().unwrap();
        assert_eq!(
            url,
            "https://firestore.googleapis.com/v1/projects/p/databases/d/documents:runQuery"
        );
        assert_eq!(
            body["structuredQuery"]["orderBy"][0]["direction"],
            "DESCENDING"
        );
        assert_eq!(
            body["structuredQuery"]["orderBy"][0]["field"]["fieldPath"],
            "timestamp"
        );
        assert_eq!(
            body["structuredQuery"]["from"][0]["collectionId"],
            "generated-images"
        );
    }

    #[tokio::test]
    async fn test_subscription_emits_first_snapshot_and_skips_duplicates() {
        let transport = Arc::new(StubTransport::responding(200, RUN_QUERY_BODY));
        let feed = FirestoreFeed::with_transport(config(), transport.clone()).unwrap();

        let mut stream = feed.subscribe(FeedOrder::newest_first()).unwrap();
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first[0].prompt, "third");

        // Unchanged results produce no further items.
        let next = tokio::time::timeout(Duration::from_millis(80), stream.next()).await;
        assert!(next.is_err());
        assert!(transport.call_count() >= 2);
    }

    #[tokio::test]
    async fn test_subscription_surfaces_errors() {
        let transport = Arc::new(StubTransport::responding(503, "unavailable"));
        let feed = FirestoreFeed::with_transport(config(), transport).unwrap();

        let mut stream = feed.subscribe(FeedOrder::newest_first()).unwrap();
        let item = stream.next().await.unwrap();
        assert!(matches!(item, Err(ImageGenError::NetworkError(_))));
    }
}
