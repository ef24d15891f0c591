use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Movie record returned by the metadata provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MovieDetails {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
}

/// Raw image bytes fetched from the provider, undecoded
#[derive(Clone, PartialEq)]
pub struct Image {
    /// Provider path the image was fetched from (e.g. `/rhIRbceoE9lR4veEXuwCC2wARtG.jpg`)
    pub path: String,
    pub bytes: Arc<[u8]>,
}

impl Image {
    pub fn new(path: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            bytes: bytes.into(),
        }
    }

    /// Best-effort MIME type derived from the path extension
    pub fn content_type(&self) -> &'static str {
        let ext = self
            .path
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase());
        match ext.as_deref() {
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("png") => "image/png",
            Some("webp") => "image/webp",
            Some("svg") => "image/svg+xml",
            _ => "application/octet-stream",
        }
    }
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("path", &self.path)
            .field("len", &self.bytes.len())
            .finish()
    }
}
