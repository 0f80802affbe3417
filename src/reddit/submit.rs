//! Post submission for the Reddit API.
//!
//! This module creates text, link and media posts through `/api/submit`.
//! Each operation authenticates first if no token is held, and reports its
//! outcome as a [`SubmissionResult`] instead of an error.

use log::{debug, error, info, warn};
use reqwest::StatusCode;

use super::api::{parse_submission_envelope, sanitize_for_logging};
use super::media::media_kind;
use super::post::{PostKind, PostRequest, SubmissionResult};
use super::{RedditClient, SUBMIT_TIMEOUT};
use crate::error::GatewayError;

type SubmitForm = Vec<(&'static str, String)>;

fn base_form(subreddit: &str, title: &str, kind: &str) -> SubmitForm {
    vec![
        ("api_type", "json".to_string()),
        ("sr", subreddit.to_string()),
        ("title", title.to_string()),
        ("kind", kind.to_string()),
    ]
}

fn push_flair(form: &mut SubmitForm, flair_id: Option<&str>) {
    if let Some(flair_id) = flair_id.filter(|f| !f.is_empty()) {
        form.push(("flair_id", flair_id.to_string()));
    }
}

impl RedditClient {
    /// Posts a text (`kind=self`) post.
    pub async fn post_text(
        &self,
        subreddit: &str,
        title: &str,
        text: &str,
        flair_id: Option<&str>,
    ) -> SubmissionResult {
        let mut form = base_form(subreddit, title, "self");
        form.push(("text", text.to_string()));
        push_flair(&mut form, flair_id);

        self.submit(form, "post_text").await.into()
    }

    /// Posts a link. `text` is only sent when non-empty.
    pub async fn post_link(
        &self,
        subreddit: &str,
        title: &str,
        url: &str,
        text: Option<&str>,
        flair_id: Option<&str>,
    ) -> SubmissionResult {
        let mut form = base_form(subreddit, title, "link");
        form.push(("url", url.to_string()));
        if let Some(text) = text.filter(|t| !t.is_empty()) {
            form.push(("text", text.to_string()));
        }
        push_flair(&mut form, flair_id);

        self.submit(form, "post_link").await.into()
    }

    /// Posts an image or video.
    ///
    /// The media is first uploaded to Reddit; the submission's `url` is the
    /// uploaded location, not `media_url`. Nothing is submitted if the upload
    /// fails.
    pub async fn post_media(
        &self,
        subreddit: &str,
        title: &str,
        media_url: &str,
        text: Option<&str>,
        flair_id: Option<&str>,
    ) -> SubmissionResult {
        self.upload_and_submit(subreddit, title, media_url, text, flair_id)
            .await
            .into()
    }

    async fn upload_and_submit(
        &self,
        subreddit: &str,
        title: &str,
        media_url: &str,
        text: Option<&str>,
        flair_id: Option<&str>,
    ) -> Result<SubmissionResult, GatewayError> {
        self.ensure_authenticated().await?;

        let uploaded_url = self.upload_media(media_url).await?;
        let kind = media_kind(media_url);

        let mut form = base_form(subreddit, title, kind.as_str());
        form.push(("url", uploaded_url));
        form.push(("text", text.unwrap_or_default().to_string()));
        push_flair(&mut form, flair_id);

        self.submit(form, "post_media").await
    }

    /// Dispatches a [`PostRequest`] to the operation matching its kind.
    pub async fn submit_post(&self, request: &PostRequest) -> SubmissionResult {
        let text = request.text.as_deref().unwrap_or_default();
        let flair_id = request.flair_id.as_deref();

        match request.kind() {
            PostKind::Media { media_url } => {
                self.post_media(
                    &request.subreddit,
                    &request.title,
                    &media_url,
                    Some(text),
                    flair_id,
                )
                .await
            }
            PostKind::Link { url } => {
                self.post_link(&request.subreddit, &request.title, &url, Some(text), flair_id)
                    .await
            }
            PostKind::SelfPost => {
                self.post_text(&request.subreddit, &request.title, text, flair_id)
                    .await
            }
        }
    }

    async fn submit(
        &self,
        form: SubmitForm,
        operation_name: &str,
    ) -> Result<SubmissionResult, GatewayError> {
        self.ensure_authenticated().await?;
        let headers = self.tokens.headers().await?;
        let url = self.endpoints.submit_url();

        info!("Submitting post for operation: {}", operation_name);
        debug!(
            "Submit fields: {:?}",
            form.iter().map(|(name, _)| *name).collect::<Vec<_>>()
        );

        let response = self
            .http
            .post(&url)
            .headers(headers)
            .form(&form)
            .timeout(SUBMIT_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                error!("Submit request failed for '{}': {}", operation_name, e);
                GatewayError::SubmissionFailure(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::SubmissionFailure(e.to_string()))?;

        if status == StatusCode::UNAUTHORIZED {
            warn!(
                "Received 401 Unauthorized for '{}' - access token expired, next call will reauthenticate",
                operation_name
            );
            self.tokens.invalidate().await;
        }

        if status != StatusCode::OK {
            error!("Error publishing ({}): {}", operation_name, status);
            error!("Response: {}", sanitize_for_logging(&body, 200));
            return Err(GatewayError::SubmissionFailure(format!(
                "submit endpoint returned {}",
                status
            )));
        }

        let result = parse_submission_envelope(&body)?;
        info!(
            "Post successfully published: {}",
            result.post_name.as_deref().unwrap_or("<unnamed>")
        );
        Ok(result)
    }
}
