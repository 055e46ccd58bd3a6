/// Media attached to a post or message: an existing reference or an inline upload
use crate::ObjectStore;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use error_types::{Result, ServiceError};
use serde::Deserialize;

/// Inline upload as sent by clients
#[derive(Debug, Clone, Deserialize)]
pub struct MediaUpload {
    pub filename: String,
    /// Base64-encoded file contents
    pub data: String,
}

#[derive(Debug, Clone)]
pub enum MediaInput {
    /// Already stored object, used as-is
    Ref(String),
    Upload(MediaUpload),
}

impl MediaInput {
    /// Pick the upload when both are given; empty references count as absent.
    pub fn from_parts(media_ref: Option<String>, upload: Option<MediaUpload>) -> Option<Self> {
        match (upload, media_ref) {
            (Some(upload), _) => Some(MediaInput::Upload(upload)),
            (None, Some(reference)) if !reference.trim().is_empty() => {
                Some(MediaInput::Ref(reference.trim().to_string()))
            }
            _ => None,
        }
    }

    /// Turn the input into a stored reference.
    ///
    /// Undecodable uploads are a validation error. A store that declines the
    /// upload yields `Ok(None)`.
    pub async fn resolve(self, store: &dyn ObjectStore) -> Result<Option<String>> {
        match self {
            MediaInput::Ref(reference) => Ok(Some(reference)),
            MediaInput::Upload(upload) => {
                let bytes = STANDARD
                    .decode(upload.data.trim())
                    .map_err(|e| ServiceError::Validation(format!("media is not valid base64: {e}")))?;
                if bytes.is_empty() {
                    return Err(ServiceError::Validation("media upload is empty".into()));
                }
                Ok(store.store(bytes, &upload.filename).await)
            }
        }
    }
}
