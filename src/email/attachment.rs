//! Module related to email attachments.

use base64::{
    alphabet,
    engine::{
        general_purpose::{GeneralPurpose, GeneralPurposeConfig},
        DecodePaddingMode,
    },
    Engine as _,
};
use log::{debug, trace};
use serde::Deserialize;
use std::{fs, path::PathBuf};

use super::{Error, Result};

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Standard alphabet, with or without trailing padding.
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Where the attachment content comes from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttachmentSource {
    /// Raw content stored on disk.
    File(PathBuf),
    /// Base64-encoded content.
    Data(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Attachment {
    pub filename: String,
    #[serde(flatten)]
    pub source: AttachmentSource,
    #[serde(default)]
    pub content_type: Option<String>,
}

/// Attachment with its raw bytes and content type resolved, ready
/// to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAttachment {
    pub filename: String,
    pub content: Vec<u8>,
    pub content_type: String,
}

impl Attachment {
    pub fn from_file<F: Into<String>, P: Into<PathBuf>>(filename: F, path: P) -> Self {
        Self {
            filename: filename.into(),
            source: AttachmentSource::File(path.into()),
            content_type: None,
        }
    }

    pub fn from_data<F: Into<String>, D: Into<String>>(filename: F, data: D) -> Self {
        Self {
            filename: filename.into(),
            source: AttachmentSource::Data(data.into()),
            content_type: None,
        }
    }

    pub fn with_content_type<T: Into<String>>(mut self, content_type: T) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Reads or decodes the attachment content, then resolves its
    /// content type. A declared content type always wins.
    pub fn resolve(&self) -> Result<ResolvedAttachment> {
        trace!(">> resolve attachment {}", self.filename);

        let (content, probed_type) = match &self.source {
            AttachmentSource::File(path) => {
                let content = fs::read(path).map_err(|err| {
                    Error::ReadAttachmentError(err, self.filename.clone(), path.clone())
                })?;
                let probed_type = match self.content_type {
                    Some(_) => None,
                    None => Some(tree_magic_mini::from_u8(&content)),
                };
                (content, probed_type)
            }
            AttachmentSource::Data(data) => (decode_data(&self.filename, data)?, None),
        };

        let content_type = self
            .content_type
            .clone()
            .or_else(|| probed_type.map(ToOwned::to_owned))
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_owned());
        debug!(
            "attachment {}: {} bytes of {}",
            self.filename,
            content.len(),
            content_type
        );

        trace!("<< resolve attachment {}", self.filename);
        Ok(ResolvedAttachment {
            filename: self.filename.clone(),
            content,
            content_type,
        })
    }
}

/// Decodes a standard base64 payload, padded or not. Line breaks and
/// other ASCII whitespace left by chunked encoders are skipped.
fn decode_data(filename: &str, data: &str) -> Result<Vec<u8>> {
    let data: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    BASE64
        .decode(data)
        .map_err(|err| Error::DecodeAttachmentError(err, filename.to_owned()))
}
