//! Client for a prompt-to-image generation endpoint.
//!
//! [`SubmissionHandler`] drives a single generation at a time and exposes its
//! state through a watch channel. [`ImageClient`] performs the HTTP call and
//! resolves the returned filename into a storage URL. Past generations are
//! read through an [`ImageFeed`].

pub mod client;
pub mod config;
pub mod error;
pub mod feed;
pub mod handler;
pub mod logger;
pub mod models;

pub use client::{HttpResponse, ImageClient, ReqwestTransport, Transport};
pub use config::{FirestoreConfig, GeneratorConfig};
pub use error::{ImageGenError, Result};
pub use feed::{FirestoreFeed, ImageFeed, MemoryFeed, SnapshotStream};
pub use handler::{SubmissionHandler, SubmissionState, SubmitOutcome};
pub use models::{
    storage_url, FeedOrder, GeneratedImage, GenerationRequest, GenerationResponse, SortDirection,
};
