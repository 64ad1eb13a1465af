use crate::{
    error::{ImageGenError, Result},
    feed::traits::{ImageFeed, SnapshotStream},
    models::{FeedOrder, GeneratedImage, SortDirection},
};
use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// In-process feed. Records are kept newest first and every subscriber sees
/// each change as a fresh snapshot.
#[derive(Clone)]
pub struct MemoryFeed {
    records: Arc<watch::Sender<Vec<GeneratedImage>>>,
}

impl Default for MemoryFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFeed {
    pub fn new() -> Self {
        let (records, _) = watch::channel(Vec::new());
        Self {
            records: Arc::new(records),
        }
    }

    pub fn push(&self, record: GeneratedImage) {
        self.records.send_modify(|records| {
            // Stays after existing records with the same timestamp.
            let index = records.partition_point(|existing| existing.timestamp >= record.timestamp);
            records.insert(index, record);
        });
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}

fn ordered(records: &[GeneratedImage], order: &FeedOrder) -> Vec<GeneratedImage> {
    let mut snapshot = records.to_vec();
    if order.direction == SortDirection::Ascending {
        snapshot.reverse();
    }
    snapshot
}

fn check_order(order: &FeedOrder) -> Result<()> {
    if order.field != "timestamp" {
        return Err(ImageGenError::FeedError(format!(
            "In-memory feed can only order by timestamp, not '{}'",
            order.field
        )));
    }
    Ok(())
}

#[async_trait]
impl ImageFeed for MemoryFeed {
    fn subscribe(&self, order: FeedOrder) -> Result<SnapshotStream> {
        check_order(&order)?;
        let stream = WatchStream::new(self.records.subscribe())
            .map(move |records| Ok::<_, ImageGenError>(ordered(&records, &order)));
        Ok(Box::pin(stream))
    }

    async fn snapshot(&self, order: FeedOrder) -> Result<Vec<GeneratedImage>> {
        check_order(&order)?;
        let snapshot = ordered(&self.records.borrow(), &order);
        Ok(snapshot)
    }
}
