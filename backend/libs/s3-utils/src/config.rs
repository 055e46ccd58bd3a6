/// S3 configuration shared across services
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// S3 bucket name
    pub bucket: String,
    /// AWS region
    pub region: String,
    /// Base URL for public access (CDN domain)
    pub base_url: String,
    /// Whether to use path-style URLs (false = virtual-hosted-style)
    pub path_style: bool,
    /// Key prefix for uploaded media
    pub key_prefix: String,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket: "social-media".to_string(),
            region: "us-east-1".to_string(),
            base_url: "https://s3.amazonaws.com".to_string(),
            path_style: false,
            key_prefix: "media".to_string(),
        }
    }
}

impl S3Config {
    /// Load S3 configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bucket: std::env::var("S3_BUCKET").unwrap_or(defaults.bucket),
            region: std::env::var("AWS_REGION").unwrap_or(defaults.region),
            base_url: std::env::var("S3_BASE_URL").unwrap_or(defaults.base_url),
            path_style: std::env::var("S3_PATH_STYLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.path_style),
            key_prefix: std::env::var("S3_KEY_PREFIX").unwrap_or(defaults.key_prefix),
        }
    }

    /// Build S3 object URL
    pub fn object_url(&self, key: &str) -> String {
        if self.path_style {
            format!("{}/{}/{}", self.base_url, self.bucket, key)
        } else {
            format!("https://{}.s3.amazonaws.com/{}", self.bucket, key)
        }
    }

    /// Get CDN URL for object
    pub fn cdn_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    /// Unique object key for an uploaded file
    pub fn object_key(&self, filename: &str) -> String {
        format!(
            "{}/{}-{}",
            self.key_prefix,
            Uuid::new_v4(),
            sanitize_filename(filename)
        )
    }
}

/// Keep ASCII alphanumerics, dots, dashes and underscores.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(filename);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

pub fn content_type_for(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(path_style: bool) -> S3Config {
        S3Config {
            bucket: "test-bucket".to_string(),
            path_style,
            ..Default::default()
        }
    }

    #[test]
    fn test_object_url_virtual_hosted_style() {
        let url = config(false).object_url("test/image.jpg");
        assert_eq!(url, "https://test-bucket.s3.amazonaws.com/test/image.jpg");
    }

    #[test]
    fn test_object_url_path_style() {
        let url = config(true).object_url("test/image.jpg");
        assert_eq!(url, "https://s3.amazonaws.com/test-bucket/test/image.jpg");
    }

    #[test]
    fn test_object_key_is_unique_and_prefixed() {
        let config = config(false);
        let first = config.object_key("cat photo.png");
        let second = config.object_key("cat photo.png");

        assert!(first.starts_with("media/"));
        assert!(first.ends_with("-cat_photo.png"));
        assert_ne!(first, second);
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("héllo.jpg"), "h_llo.jpg");
        assert_eq!(sanitize_filename(""), "upload");
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("a.JPG"), "image/jpeg");
        assert_eq!(content_type_for("clip.mp4"), "video/mp4");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }
}
