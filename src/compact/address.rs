//! Content addressing of packed artifacts

use crate::compact::pack::PackedDocument;
use crate::error::{ErrorCode, Result, ScreenpackError};
use crate::model::MetaRecord;
use sha2::{Digest, Sha256};

/// Label used in the metadata artifact's file name
pub const META_LABEL: &str = MetaRecord::SELF_ENTRY;
pub const ARTIFACT_EXTENSION: &str = "json";

/// Serialized bytes of one artifact and the name they are stored under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Artifact {
    /// Serialize a packed document and derive its content-addressed name
    pub fn from_packed(label: &str, doc: &PackedDocument, digest_len: usize) -> Result<Self> {
        let bytes = serde_json::to_vec(doc).map_err(|e| {
            ScreenpackError::encoding_with_code(ErrorCode::ENCODING_SERIALIZE, e.to_string())
                .with_source(e)
        })?;
        Ok(Self::from_bytes(label, bytes, digest_len))
    }

    pub fn from_bytes(label: &str, bytes: Vec<u8>, digest_len: usize) -> Self {
        let digest = short_digest(&bytes, digest_len);
        Self {
            file_name: artifact_name(label, &digest),
            bytes,
        }
    }
}

/// Lowercase hex SHA-256 of `bytes`, truncated to `len` characters
pub fn short_digest(bytes: &[u8], len: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(len);
    hex
}

pub fn artifact_name(label: &str, digest: &str) -> String {
    format!("{}.{}.{}", label, digest, ARTIFACT_EXTENSION)
}

pub fn bucket_label(bucket: usize) -> String {
    bucket.to_string()
}

/// Split an artifact file name into its label and digest
///
/// Returns `None` for names that do not follow `label.digest.json` with a
/// lowercase hex digest.
pub fn parse_artifact_name(file_name: &str) -> Option<(&str, &str)> {
    let stem = file_name.strip_suffix(ARTIFACT_EXTENSION)?.strip_suffix('.')?;
    let (label, digest) = stem.rsplit_once('.')?;
    let is_label = label == META_LABEL
        || (!label.is_empty() && label.bytes().all(|b| b.is_ascii_digit()));
    let is_digest = !digest.is_empty()
        && digest
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    (is_label && is_digest).then_some((label, digest))
}
