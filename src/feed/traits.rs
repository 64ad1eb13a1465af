use crate::{
    error::Result,
    models::{FeedOrder, GeneratedImage},
};
use async_trait::async_trait;
use futures::stream::Stream;
use std::pin::Pin;

/// Successive snapshots of the collection, each already in the requested order.
pub type SnapshotStream = Pin<Box<dyn Stream<Item = Result<Vec<GeneratedImage>>> + Send>>;

/// A live, externally maintained collection of past generations.
#[async_trait]
pub trait ImageFeed: Send + Sync {
    /// Starts a new subscription. The first item is the current snapshot;
    /// later items arrive whenever the collection changes. Dropping the
    /// stream ends the subscription, and calling this again starts over.
    fn subscribe(&self, order: FeedOrder) -> Result<SnapshotStream>;

    /// One-off read of the current contents.
    async fn snapshot(&self, order: FeedOrder) -> Result<Vec<GeneratedImage>>;
}
