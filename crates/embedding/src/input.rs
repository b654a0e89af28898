use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use reqwest::Url;

use crate::error::EmbeddingError;

/// Upload limit applied when no other is configured (5 MiB).
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// The image a query embedding is computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageInput {
    /// Encoded image file contents (JPEG, PNG, ...).
    Bytes(Bytes),
    /// Absolute http(s) URL the inference service fetches itself.
    Url(String),
}

impl ImageInput {
    pub fn bytes(data: impl Into<Bytes>) -> Self {
        ImageInput::Bytes(data.into())
    }

    pub fn url(url: impl Into<String>) -> Self {
        ImageInput::Url(url.into())
    }

    /// Decode a standard base64 payload, tolerating a `data:...;base64,` prefix.
    pub fn from_base64(encoded: &str) -> Result<Self, EmbeddingError> {
        let payload = match encoded.split_once(";base64,") {
            Some((prefix, rest)) if prefix.starts_with("data:") => rest,
            _ => encoded,
        };
        let data = STANDARD
            .decode(payload.trim())
            .map_err(|e| EmbeddingError::InvalidInput(format!("image_base64 is not valid base64: {e}")))?;
        Ok(ImageInput::Bytes(Bytes::from(data)))
    }

    /// Reject inputs that can never produce an embedding.
    pub fn validate(&self, max_bytes: usize) -> Result<(), EmbeddingError> {
        match self {
            ImageInput::Bytes(data) if data.is_empty() => {
                Err(EmbeddingError::InvalidInput("image is empty".into()))
            }
            ImageInput::Bytes(data) if data.len() > max_bytes => Err(EmbeddingError::InvalidInput(
                format!("image is {} bytes, limit is {max_bytes}", data.len()),
            )),
            ImageInput::Bytes(_) => Ok(()),
            ImageInput::Url(raw) => {
                let url = Url::parse(raw.trim())
                    .map_err(|e| EmbeddingError::InvalidInput(format!("image_url is not a valid URL: {e}")))?;
                match url.scheme() {
                    "http" | "https" if url.host_str().is_some() => Ok(()),
                    scheme => Err(EmbeddingError::InvalidInput(format!(
                        "image_url must be an absolute http(s) URL, got scheme `{scheme}`"
                    ))),
                }
            }
        }
    }

    /// Short description for logs and responses; never includes raw bytes.
    pub fn describe(&self) -> String {
        match self {
            ImageInput::Bytes(data) => format!("<{} bytes>", data.len()),
            ImageInput::Url(url) => url.clone(),
        }
    }

    pub fn as_url(&self) -> Option<&str> {
        match self {
            ImageInput::Url(url) => Some(url),
            ImageInput::Bytes(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_urls() {
        assert!(ImageInput::url("https://cdn.example.com/shoe.jpg").validate(10).is_ok());
        assert!(ImageInput::url("http://localhost:8080/a.png").validate(10).is_ok());
    }

    #[test]
    fn rejects_relative_and_non_http_urls() {
        for bad in ["/images/shoe.jpg", "ftp://example.com/a.jpg", "not a url", "file:///etc/passwd", ""] {
            assert!(
                matches!(ImageInput::url(bad).validate(10), Err(EmbeddingError::InvalidInput(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn rejects_empty_and_oversized_bytes() {
        assert!(ImageInput::bytes(Vec::<u8>::new()).validate(10).is_err());
        assert!(ImageInput::bytes(vec![0u8; 11]).validate(10).is_err());
        assert!(ImageInput::bytes(vec![0u8; 10]).validate(10).is_ok());
    }

    #[test]
    fn decodes_base64_with_and_without_data_prefix() {
        let plain = ImageInput::from_base64("aGVsbG8=").unwrap();
        assert_eq!(plain, ImageInput::bytes(&b"hello"[..]));

        let data_url = ImageInput::from_base64("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(data_url, plain);

        assert!(ImageInput::from_base64("%%%").is_err());
    }

    #[test]
    fn describe_hides_bytes() {
        assert_eq!(ImageInput::bytes(vec![1u8, 2, 3]).describe(), "<3 bytes>");
        assert_eq!(ImageInput::url("https://x.io/a.jpg").describe(), "https://x.io/a.jpg");
    }
}
