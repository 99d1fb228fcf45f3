use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

const FALLBACK_MIME: &str = "application/octet-stream";

/// An image asset held in memory: raw bytes plus their MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Wrap bytes whose type is unknown, sniffing it from the magic number.
    pub fn sniffed(bytes: Vec<u8>) -> Self {
        let mime_type = sniff_mime(&bytes).unwrap_or(FALLBACK_MIME).to_string();
        Self { mime_type, bytes }
    }

    /// Parse a `data:<mime>;base64,<payload>` URI.
    pub fn from_data_uri(uri: &str) -> Result<Self, ArtifactError> {
        let rest = uri
            .trim()
            .strip_prefix("data:")
            .ok_or(ArtifactError::NotDataUri)?;
        let (header, payload) = rest.split_once(',').ok_or(ArtifactError::NotDataUri)?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or(ArtifactError::NotBase64)?;

        let bytes = BASE64.decode(payload.trim())?;
        if bytes.is_empty() {
            return Err(ArtifactError::Empty);
        }

        let mime_type = if mime.is_empty() {
            sniff_mime(&bytes).unwrap_or(FALLBACK_MIME).to_string()
        } else if is_mime_type(mime) {
            mime.to_string()
        } else {
            return Err(ArtifactError::InvalidMime(mime.to_string()));
        };
        Ok(Self { mime_type, bytes })
    }

    /// Accept either a `data:` URI or bare base64 (type sniffed).
    pub fn from_base64(value: &str) -> Result<Self, ArtifactError> {
        let value = value.trim();
        if value.starts_with("data:") {
            return Self::from_data_uri(value);
        }
        let bytes = BASE64.decode(value)?;
        if bytes.is_empty() {
            return Err(ArtifactError::Empty);
        }
        Ok(Self::sniffed(bytes))
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }

    /// Render as an embeddable `data:` URI.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    /// File extension matching the MIME type, for multipart uploads.
    pub fn extension(&self) -> &'static str {
        image::ImageFormat::from_mime_type(&self.mime_type)
            .and_then(|format| format.extensions_str().first().copied())
            .unwrap_or("bin")
    }

    /// Whether the image decodes with an alpha channel. `None` when the bytes
    /// are not a decodable image.
    pub fn has_alpha(&self) -> Option<bool> {
        image::load_from_memory(&self.bytes)
            .ok()
            .map(|img| img.color().has_alpha())
    }
}

/// `type/subtype` made of RFC 7230 token characters, parameters excluded.
fn is_mime_type(value: &str) -> bool {
    let token = |part: &str| {
        !part.is_empty()
            && part
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c))
    };
    matches!(value.split_once('/'), Some((kind, subtype)) if token(kind) && token(subtype))
}

fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes).ok().map(|format| format.to_mime_type())
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Expected a data URI")]
    NotDataUri,

    #[error("Only base64 data URIs are supported")]
    NotBase64,

    #[error("Invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Image data is empty")]
    Empty,

    #[error("Invalid MIME type: {0}")]
    InvalidMime(String),
}
