//! Module related to the SES request assembly.
//!
//! This module translates a [`Message`] into the shape expected by
//! the SESv2 `SendEmail` operation. The types serialize to the same
//! PascalCase JSON documents as the API itself, which is handy to
//! inspect what is about to be sent.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::{debug, trace};
use serde::{Serialize, Serializer};
use std::result;

use super::{Message, ResolvedAttachment, Result};

pub const CHARSET: &str = "UTF-8";
pub const CONTENT_DISPOSITION: &str = "ATTACHMENT";
pub const CONTENT_TRANSFER_ENCODING: &str = "BASE64";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SendEmailRequest {
    pub from_email_address: String,
    pub destination: Destination,
    pub content: EmailContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_addresses: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Destination {
    pub to_addresses: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc_addresses: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bcc_addresses: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EmailContent {
    pub simple: SimpleContent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SimpleContent {
    pub subject: Content,
    pub body: Body,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<AttachmentEntry>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Content {
    pub data: String,
    pub charset: String,
}

impl Content {
    pub fn new<D: Into<String>>(data: D) -> Self {
        Self {
            data: data.into(),
            charset: CHARSET.to_owned(),
        }
    }
}

impl Default for Content {
    fn default() -> Self {
        Self::new(String::new())
    }
}

/// Body parts of the message. Both parts may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Body {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<Content>,
}

impl Body {
    pub fn parts_count(&self) -> usize {
        self.text.iter().count() + self.html.iter().count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttachmentEntry {
    pub file_name: String,
    #[serde(serialize_with = "serialize_base64")]
    pub raw_content: Vec<u8>,
    pub content_type: String,
    pub content_disposition: String,
    pub content_transfer_encoding: String,
}

impl From<ResolvedAttachment> for AttachmentEntry {
    fn from(attachment: ResolvedAttachment) -> Self {
        Self {
            file_name: attachment.filename,
            raw_content: attachment.content,
            content_type: attachment.content_type,
            content_disposition: CONTENT_DISPOSITION.to_owned(),
            content_transfer_encoding: CONTENT_TRANSFER_ENCODING.to_owned(),
        }
    }
}

fn serialize_base64<S: Serializer>(content: &[u8], serializer: S) -> result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(content))
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

impl SendEmailRequest {
    /// Assembles the request out of the given message.
    ///
    /// Attachments are resolved first, so that an unreadable or
    /// badly encoded attachment aborts the whole send.
    pub fn from_message(msg: &Message) -> Result<Self> {
        trace!(">> build send email request");

        let attachments = msg
            .attachments
            .iter()
            .map(|attachment| attachment.resolve().map(AttachmentEntry::from))
            .collect::<Result<Vec<_>>>()?;

        let body = Body {
            text: msg.text_body().map(Content::new),
            html: msg.html_body().map(Content::new),
        };

        let from_email_address = msg.from.to_rendered().into_iter().next().unwrap_or_default();

        let req = Self {
            from_email_address,
            destination: Destination {
                to_addresses: msg.to.to_rendered(),
                cc_addresses: non_empty(msg.cc.to_rendered()),
                bcc_addresses: non_empty(msg.bcc.to_rendered()),
            },
            content: EmailContent {
                simple: SimpleContent {
                    subject: Content::new(msg.decoded_subject()),
                    body,
                    attachments: non_empty(attachments),
                },
            },
            reply_to_addresses: non_empty(msg.reply_to.to_rendered()),
        };

        debug!(
            "request from {} with {} body part(s) and {} attachment(s)",
            req.from_email_address,
            req.content.simple.body.parts_count(),
            req.content.simple.attachments.as_ref().map_or(0, Vec::len),
        );

        trace!("<< build send email request");
        Ok(req)
    }
}
