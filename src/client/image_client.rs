use crate::{
    client::transport::{ReqwestTransport, Transport},
    config::GeneratorConfig,
    error::{ImageGenError, Result},
    models::{GenerationRequest, GenerationResponse},
};
use std::sync::Arc;

#[derive(Clone)]
pub struct ImageClient {
    config: GeneratorConfig,
    transport: Arc<dyn Transport>,
}

impl ImageClient {
    pub fn new(config: GeneratorConfig) -> Self {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(config: GeneratorConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Sends the prompt to the generation endpoint.
    ///
    /// Configuration is checked first; a missing endpoint (or missing bucket
    /// settings while rewriting is enabled) fails without touching the network.
    /// Any non-success status is a [`ImageGenError::NetworkError`].
    pub async fn generate_image(&self, prompt: &str) -> Result<GenerationResponse> {
        self.config.validate()?;
        let endpoint = self.config.endpoint()?;

        let payload = serde_json::to_value(GenerationRequest::new(prompt))?;

        log::info!("Requesting image generation from {}", endpoint);
        log::debug!("Generation request payload: {}", payload);

        let response = self.transport.post_json(endpoint, &payload).await?;

        if !response.is_success() {
            log::error!(
                "Generation endpoint returned HTTP {}: {}",
                response.status,
                response.body
            );
            return Err(ImageGenError::NetworkError(format!(
                "Failed to generate image: HTTP {}",
                response.status
            )));
        }

        let mut generated: GenerationResponse = serde_json::from_str(&response.body)
            .map_err(|e| ImageGenError::ResponseError(format!("Invalid generation response: {}", e)))?;

        if self.config.rewrite_filenames {
            let (bucket, path) = self.config.bucket()?;
            generated.rewrite_filename(&self.config.storage_host, bucket, path);
        }

        log::info!("Image generated: {}", generated.filename);
        Ok(generated)
    }
}
