//! Media upload exchange.
//!
//! A media post needs its file hosted by Reddit first. The upload runs in
//! four steps, each short-circuiting the rest on failure:
//!
//! 1. request an upload lease from `/api/media/asset`
//! 2. download the source media
//! 3. post the bytes with the lease fields to the storage endpoint
//! 4. read the final asset location out of the XML response

use log::{debug, error, info, warn};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::Deserialize;

use super::api::sanitize_for_logging;
use super::{RedditClient, FETCH_TIMEOUT, SUBMIT_TIMEOUT, UPLOAD_TIMEOUT};
use crate::error::GatewayError;

const DEFAULT_FILENAME: &str = "media.jpg";
const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// Extensions and the MIME types they map to.
const MIME_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("jpe", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("bmp", "image/bmp"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("svg", "image/svg+xml"),
    ("ico", "image/vnd.microsoft.icon"),
    ("mp4", "video/mp4"),
    ("m4v", "video/mp4"),
    ("mov", "video/quicktime"),
    ("webm", "video/webm"),
    ("avi", "video/x-msvideo"),
    ("mkv", "video/x-matroska"),
    ("mpeg", "video/mpeg"),
    ("mpg", "video/mpeg"),
];

/// Whether a media post is submitted as `kind=image` or `kind=video`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

/// Derives the upload file name from the last path segment of `media_url`.
///
/// Query strings and fragments are ignored. Falls back to `media.jpg` when
/// the URL has no usable last segment.
pub fn media_filename(media_url: &str) -> String {
    let path = match url::Url::parse(media_url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => media_url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    match path.rsplit('/').next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => DEFAULT_FILENAME.to_string(),
    }
}

fn extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Guesses the MIME type from the file extension.
///
/// Unknown or missing extensions fall back to `image/jpeg`, except names
/// ending in `.mp4` which fall back to `video/mp4`.
pub fn guess_mime_type(filename: &str) -> &'static str {
    let known = extension(filename).and_then(|ext| {
        MIME_TYPES
            .iter()
            .find(|(candidate, _)| *candidate == ext)
            .map(|(_, mime)| *mime)
    });

    match known {
        Some(mime) => mime,
        None if filename.to_ascii_lowercase().ends_with(".mp4") => "video/mp4",
        None => DEFAULT_MIME_TYPE,
    }
}

/// Decides between an image and a video post from the source URL.
///
/// The URL counts as a video when it ends in a known video extension or
/// contains `video` anywhere (case-insensitive).
pub fn media_kind(media_url: &str) -> MediaKind {
    let lowered = media_url.to_lowercase();
    let video_extension = MIME_TYPES
        .iter()
        .filter(|(_, mime)| mime.starts_with("video/"))
        .any(|(ext, _)| lowered.ends_with(&format!(".{}", ext)));

    if video_extension || lowered.contains("video") {
        MediaKind::Video
    } else {
        MediaKind::Image
    }
}

/// Extracts the text between the first `<Location>` and the next
/// `</Location>` of a storage upload response.
///
/// This is a narrow text search, not an XML parse.
pub fn extract_location(body: &str) -> Option<String> {
    const OPEN: &str = "<Location>";
    const CLOSE: &str = "</Location>";

    let start = body.find(OPEN)? + OPEN.len();
    let len = body[start..].find(CLOSE)?;
    Some(body[start..start + len].to_string())
}

/// Temporary authorization to upload one file to Reddit's storage backend.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadLease {
    /// Protocol-relative upload URL, e.g. `//bucket.s3.amazonaws.com`.
    pub action: String,
    /// Signed form fields, in the order the backend expects them.
    pub fields: Vec<(String, String)>,
}

#[derive(Deserialize)]
struct LeaseResponse {
    args: Option<LeaseArgs>,
}

#[derive(Deserialize)]
struct LeaseArgs {
    action: Option<String>,
    #[serde(default)]
    fields: Vec<LeaseField>,
}

#[derive(Deserialize)]
struct LeaseField {
    name: String,
    value: String,
}

impl UploadLease {
    /// Parses the `{args: {action, fields}}` lease response.
    ///
    /// Fails when the action is missing or empty, or the field list is empty.
    pub fn from_response(body: &str) -> Result<Self, GatewayError> {
        let response: LeaseResponse = serde_json::from_str(body)
            .map_err(|e| GatewayError::UploadLeaseFailure(format!("invalid response: {}", e)))?;
        let args = response.args.ok_or_else(|| {
            GatewayError::UploadLeaseFailure("response has no args".to_string())
        })?;

        let action = args.action.filter(|action| !action.is_empty());
        match action {
            Some(action) if !args.fields.is_empty() => Ok(UploadLease {
                action,
                fields: args
                    .fields
                    .into_iter()
                    .map(|field| (field.name, field.value))
                    .collect(),
            }),
            _ => Err(GatewayError::UploadLeaseFailure(
                "invalid response format: missing action or fields".to_string(),
            )),
        }
    }
}

impl RedditClient {
    /// Uploads the media at `media_url` to Reddit and returns its final
    /// location, to be used as the `url` of a media submission.
    ///
    /// Requires a token; the caller authenticates first.
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The asset location from the storage response
    /// - `Err(GatewayError)`: The step that failed (lease, fetch, upload or location)
    pub async fn upload_media(&self, media_url: &str) -> Result<String, GatewayError> {
        let filename = media_filename(media_url);
        let mime_type = guess_mime_type(&filename);
        info!("Uploading media {} ({})", filename, mime_type);

        let lease = self.request_upload_lease(&filename, mime_type).await?;
        let bytes = self.fetch_media(media_url).await?;
        let body = self
            .upload_to_storage(&lease, &filename, mime_type, bytes)
            .await?;

        match extract_location(&body) {
            Some(location) => {
                info!("Media uploaded: {}", location);
                Ok(location)
            }
            None => {
                error!("Failed to find Location in upload response");
                debug!("Upload response: {}", sanitize_for_logging(&body, 200));
                Err(GatewayError::LocationParseFailure)
            }
        }
    }

    async fn request_upload_lease(
        &self,
        filename: &str,
        mime_type: &str,
    ) -> Result<UploadLease, GatewayError> {
        let headers = self.tokens.headers().await?;
        let url = self.endpoints.media_asset_url();
        debug!("Requesting upload lease from {}", url);

        let response = self
            .http
            .post(&url)
            .headers(headers)
            .form(&[("filepath", filename), ("mimetype", mime_type)])
            .timeout(SUBMIT_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                error!("Upload lease request failed: {}", e);
                GatewayError::UploadLeaseFailure(e.to_string())
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!("Received 401 Unauthorized for upload lease - access token expired, next call will reauthenticate");
            self.tokens.invalidate().await;
        }

        if status != StatusCode::OK {
            error!("Error getting upload lease: {}", status);
            return Err(GatewayError::UploadLeaseFailure(format!(
                "lease endpoint returned {}",
                status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::UploadLeaseFailure(e.to_string()))?;
        let lease = UploadLease::from_response(&body).map_err(|e| {
            error!("{}", e);
            e
        })?;
        debug!(
            "Upload lease granted: action {}, {} fields",
            lease.action,
            lease.fields.len()
        );
        Ok(lease)
    }

    async fn fetch_media(&self, media_url: &str) -> Result<Vec<u8>, GatewayError> {
        info!("Downloading media: {}", media_url);

        let response = self
            .http
            .get(media_url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                error!("Media download failed: {}", e);
                GatewayError::MediaFetchFailure(e.to_string())
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            error!("Error downloading media file: {}", status);
            return Err(GatewayError::MediaFetchFailure(format!(
                "media source returned {}",
                status
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::MediaFetchFailure(e.to_string()))?;
        debug!("Downloaded {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }

    async fn upload_to_storage(
        &self,
        lease: &UploadLease,
        filename: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, GatewayError> {
        let file = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(mime_type)
            .map_err(|e| GatewayError::MediaUploadFailure(e.to_string()))?;

        // The storage backend expects the signed fields before the file.
        let form = lease
            .fields
            .iter()
            .fold(Form::new(), |form, (name, value)| {
                form.text(name.clone(), value.clone())
            })
            .part("file", file);

        let url = self.endpoints.upload_url(&lease.action);
        info!("Uploading to {}", url);

        let response = self
            .http
            .post(&url)
            .multipart(form)
            .timeout(UPLOAD_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                error!("Upload request failed: {}", e);
                GatewayError::MediaUploadFailure(e.to_string())
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            error!("Error uploading to Reddit: {}", status);
            return Err(GatewayError::MediaUploadFailure(format!(
                "storage endpoint returned {}",
                status
            )));
        }

        response
            .text()
            .await
            .map_err(|e| GatewayError::MediaUploadFailure(e.to_string()))
    }
}
