use crate::error::{ImageGenError, Result};
use reqwest::Url;
use std::env;
use std::time::Duration;

pub const DEFAULT_STORAGE_HOST: &str = "storage.cloud.google.com";
pub const DEFAULT_FIRESTORE_DATABASE: &str = "(default)";
pub const DEFAULT_FIRESTORE_COLLECTION: &str = "generated-images";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Settings for the generation endpoint and for turning returned filenames
/// into storage URLs.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub endpoint_url: Option<String>,
    pub bucket_name: Option<String>,
    pub bucket_path: Option<String>,
    pub storage_host: String,
    pub rewrite_filenames: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            endpoint_url: None,
            bucket_name: None,
            bucket_path: None,
            storage_host: DEFAULT_STORAGE_HOST.to_string(),
            rewrite_filenames: true,
        }
    }
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let endpoint_url = lookup("GENERATE_URL");
        let bucket_name = lookup("BUCKET_NAME");
        let bucket_path = lookup("BUCKET_IMAGES_PATH");
        let storage_host =
            lookup("STORAGE_HOST").unwrap_or_else(|| DEFAULT_STORAGE_HOST.to_string());
        let rewrite_filenames = lookup("REWRITE_FILENAMES").map_or(true, |val| val != "false");

        GeneratorConfig {
            endpoint_url,
            bucket_name,
            bucket_path,
            storage_host,
            rewrite_filenames,
        }
    }

    pub fn with_endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    pub fn with_bucket(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.bucket_name = Some(name.into());
        self.bucket_path = Some(path.into());
        self
    }

    pub fn with_storage_host(mut self, host: impl Into<String>) -> Self {
        self.storage_host = host.into();
        self
    }

    pub fn with_rewrite(mut self, enabled: bool) -> Self {
        self.rewrite_filenames = enabled;
        self
    }

    pub fn endpoint(&self) -> Result<&str> {
        self.endpoint_url
            .as_deref()
            .ok_or_else(|| ImageGenError::ConfigError("Endpoint URL (GENERATE_URL) is required".into()))
    }

    /// Returns `(bucket_name, bucket_path)`, both required for rewriting.
    pub fn bucket(&self) -> Result<(&str, &str)> {
        let name = self
            .bucket_name
            .as_deref()
            .ok_or_else(|| ImageGenError::ConfigError("Bucket name (BUCKET_NAME) is required".into()))?;
        let path = self.bucket_path.as_deref().ok_or_else(|| {
            ImageGenError::ConfigError("Bucket path (BUCKET_IMAGES_PATH) is required".into())
        })?;
        Ok((name, path))
    }

    /// Fails on the first missing setting this configuration needs.
    pub fn validate(&self) -> Result<()> {
        self.endpoint()?;
        if self.rewrite_filenames {
            self.bucket()?;
        }
        Ok(())
    }
}

/// Settings for reading past generations from Firestore.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    pub project_id: Option<String>,
    pub database: String,
    pub collection: String,
    pub api_key: Option<String>,
    pub poll_interval: Duration,
    pub base_url: String,
}

impl Default for FirestoreConfig {
    fn default() -> Self {
        FirestoreConfig {
            project_id: None,
            database: DEFAULT_FIRESTORE_DATABASE.to_string(),
            collection: DEFAULT_FIRESTORE_COLLECTION.to_string(),
            api_key: None,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            base_url: "https://firestore.googleapis.com/v1".to_string(),
        }
    }
}

impl FirestoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let defaults = Self::default();
        let poll_interval = match lookup("FIRESTORE_POLL_INTERVAL_SECS").map(|s| s.parse::<u64>()) {
            Some(Ok(secs)) if secs > 0 => Duration::from_secs(secs),
            Some(_) => {
                log::warn!(
                    "Ignoring FIRESTORE_POLL_INTERVAL_SECS, expected a positive number of seconds"
                );
                defaults.poll_interval
            }
            None => defaults.poll_interval,
        };

        FirestoreConfig {
            project_id: lookup("FIRESTORE_PROJECT_ID"),
            database: lookup("FIRESTORE_DATABASE").unwrap_or(defaults.database),
            collection: lookup("FIRESTORE_COLLECTION").unwrap_or(defaults.collection),
            api_key: lookup("FIRESTORE_API_KEY"),
            poll_interval,
            base_url: defaults.base_url,
        }
    }

    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.project_id.is_some()
    }

    /// `.../projects/{project}/databases/{database}/documents:runQuery`
    pub fn run_query_url(&self) -> Result<String> {
        let project = self.project_id.as_deref().ok_or_else(|| {
            ImageGenError::ConfigError("Firestore project (FIRESTORE_PROJECT_ID) is required".into())
        })?;
        let mut url = Url::parse(&format!(
            "{}/projects/{}/databases/{}/documents:runQuery",
            self.base_url.trim_end_matches('/'),
            project,
            self.database
        ))
        .map_err(|e| ImageGenError::ConfigError(format!("Invalid Firestore URL: {}", e)))?;
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }
        Ok(url.to_string())
    }
}
