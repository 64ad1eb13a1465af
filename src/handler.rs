use crate::{client::ImageClient, logger};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

/// Observable state of the submission surface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionState {
    pub loading: bool,
    pub last_image_url: String,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Completed { image_url: String },
    Failed { error: String },
    /// Another submission was still in flight; nothing was sent.
    Busy,
}

/// Owns the submission state. Only this type writes to it; observers get a
/// [`watch::Receiver`] through [`SubmissionHandler::subscribe`].
pub struct SubmissionHandler {
    client: ImageClient,
    state: watch::Sender<SubmissionState>,
}

impl SubmissionHandler {
    pub fn new(client: ImageClient) -> Self {
        let (state, _) = watch::channel(SubmissionState::default());
        Self { client, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SubmissionState {
        self.state.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Submits a prompt and folds the result into the observable state.
    ///
    /// Errors never escape: on failure `loading` is cleared, the previous
    /// image URL is kept and `last_error` records what went wrong.
    pub async fn submit(&self, prompt: &str) -> SubmitOutcome {
        // Check-and-set in one update so overlapping calls cannot both start.
        let started = self.state.send_if_modified(|state| {
            if state.loading {
                false
            } else {
                state.loading = true;
                true
            }
        });
        if !started {
            log::warn!("Submission ignored, a generation is already in progress");
            return SubmitOutcome::Busy;
        }
        let loading = LoadingGuard::new(&self.state);

        let request_id = Uuid::new_v4().to_string();
        log::info!("[req:{}] Submitting prompt ({} chars)", request_id, prompt.len());
        let timer = logger::timer(&format!("generation {}", request_id));

        let result = self.client.generate_image(prompt).await;
        drop(timer);

        match result {
            Ok(response) => {
                let image_url = response.filename;
                loading.finish(|state| {
                    state.last_image_url = image_url.clone();
                    state.last_error = None;
                });
                log::info!("[req:{}] Generation completed: {}", request_id, image_url);
                SubmitOutcome::Completed { image_url }
            }
            Err(e) => {
                let error = e.to_string();
                loading.finish(|state| state.last_error = Some(error.clone()));
                log::error!("[req:{}] Generation failed: {}", request_id, error);
                SubmitOutcome::Failed { error }
            }
        }
    }
}

/// Clears `loading` when a submission ends, including when its future is
/// dropped before the response arrives.
struct LoadingGuard<'a> {
    state: &'a watch::Sender<SubmissionState>,
    armed: bool,
}

impl<'a> LoadingGuard<'a> {
    fn new(state: &'a watch::Sender<SubmissionState>) -> Self {
        Self { state, armed: true }
    }

    /// Applies the final update and clears `loading` in the same send.
    fn finish<F>(mut self, update: F)
    where
        F: FnOnce(&mut SubmissionState),
    {
        self.armed = false;
        self.state.send_modify(|state| {
            update(state);
            state.loading = false;
        });
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            log::warn!("Submission dropped before completion");
            self.state.send_modify(|state| state.loading = false);
        }
    }
}
