use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

/// Body returned by the generation endpoint. Extra fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub filename: String,
}

impl GenerationResponse {
    /// Rewrites `filename` into an absolute storage URL.
    ///
    /// Values that are already absolute URLs are left alone, so calling this
    /// more than once on the same response is harmless.
    pub fn rewrite_filename(&mut self, storage_host: &str, bucket: &str, path: &str) {
        if is_absolute_url(&self.filename) {
            log::debug!("Filename already absolute, not rewriting: {}", self.filename);
            return;
        }
        self.filename = storage_url(storage_host, bucket, path, &self.filename);
    }
}

/// `https://<host>/<bucket>/<path>/<filename>`, with no escaping.
pub fn storage_url(storage_host: &str, bucket: &str, path: &str, filename: &str) -> String {
    format!("https://{}/{}/{}/{}", storage_host, bucket, path, filename)
}

fn is_absolute_url(value: &str) -> bool {
    value.starts_with("https://") || value.starts_with("http://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_url() {
        assert_eq!(
            storage_url("storage.cloud.google.com", "b", "p", "x.png"),
            "https://storage.cloud.google.com/b/p/x.png"
        );
    }

    #[test]
    fn test_storage_url_does_not_escape() {
        assert_eq!(
            storage_url("host", "b", "p", "a b?.png"),
            "https://host/b/p/a b?.png"
        );
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let mut response = GenerationResponse {
            filename: "fox123.png".into(),
        };
        response.rewrite_filename("storage.cloud.google.com", "imgs", "out");
        response.rewrite_filename("storage.cloud.google.com", "imgs", "out");
        assert_eq!(
            response.filename,
            "https://storage.cloud.google.com/imgs/out/fox123.png"
        );
    }

    #[test]
    fn test_response_ignores_extra_fields() {
        let response: GenerationResponse =
            serde_json::from_str(r#"{"filename":"a.png","success":true}"#).unwrap();
        assert_eq!(response.filename, "a.png");
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(GenerationRequest::new("a red fox")).unwrap();
        assert_eq!(body, serde_json::json!({ "prompt": "a red fox" }));
    }
}
