use log::warn;
use rfc2047_decoder::{Decoder, RecoverStrategy};
use serde::Deserialize;

use super::{Addr, Addrs, Attachment};

/// Represents an outgoing email message.
///
/// Every part is optional: a message without any body is still
/// assembled and sent as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Message {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub from: Addrs,
    #[serde(default)]
    pub to: Addrs,
    #[serde(default)]
    pub cc: Addrs,
    #[serde(default)]
    pub bcc: Addrs,
    #[serde(default)]
    pub reply_to: Addrs,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subject<S: Into<String>>(mut self, subject: S) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn text<T: Into<String>>(mut self, text: T) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn html<T: Into<String>>(mut self, html: T) -> Self {
        self.html = Some(html.into());
        self
    }

    pub fn from<A: Into<Addr>>(mut self, addr: A) -> Self {
        self.from.push(addr.into());
        self
    }

    pub fn to<A: Into<Addr>>(mut self, addr: A) -> Self {
        self.to.push(addr.into());
        self
    }

    pub fn cc<A: Into<Addr>>(mut self, addr: A) -> Self {
        self.cc.push(addr.into());
        self
    }

    pub fn bcc<A: Into<Addr>>(mut self, addr: A) -> Self {
        self.bcc.push(addr.into());
        self
    }

    pub fn reply_to<A: Into<Addr>>(mut self, addr: A) -> Self {
        self.reply_to.push(addr.into());
        self
    }

    pub fn attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Returns the subject with its MIME encoded-words decoded. Plain
    /// subjects pass through untouched, and the raw subject is kept
    /// when it cannot be decoded.
    pub fn decoded_subject(&self) -> String {
        Decoder::new()
            .too_long_encoded_word_strategy(RecoverStrategy::Decode)
            .decode(self.subject.as_bytes())
            .unwrap_or_else(|err| {
                warn!("cannot decode subject {:?}: {}", self.subject, err);
                self.subject.clone()
            })
    }

    /// Returns the text body, if not empty.
    pub fn text_body(&self) -> Option<&str> {
        self.text.as_deref().filter(|text| !text.is_empty())
    }

    /// Returns the HTML body, if not empty.
    pub fn html_body(&self) -> Option<&str> {
        self.html.as_deref().filter(|html| !html.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use crate::email::{Addr, Message};

    #[test]
    fn decodes_encoded_subject() {
        let msg = Message::new().subject("=?UTF-8?B?Q2Fmw6k=?= ouvert");
        assert_eq!("Café ouvert", msg.decoded_subject());

        let msg = Message::new().subject("=?ISO-8859-1?Q?caf=E9?=");
        assert_eq!("café", msg.decoded_subject());
    }

    #[test]
    fn keeps_plain_subject() {
        let msg = Message::new().subject("Hi there");
        assert_eq!("Hi there", msg.decoded_subject());
    }

    #[test]
    fn ignores_empty_bodies() {
        let msg = Message::new().text("").html("<p>hi</p>");
        assert_eq!(None, msg.text_body());
        assert_eq!(Some("<p>hi</p>"), msg.html_body());
    }

    #[test]
    fn deserializes_from_toml() {
        let msg: Message = toml::from_str(
            r#"
            subject = "Hi"
            text = "hello"
            from = { "a@x.com" = "Alice" }
            to = ["b@x.com", { email = "c@x.com", name = "Carol" }]

            [[attachments]]
            filename = "hello.txt"
            data = "aGVsbG8="
            content-type = "text/plain"
            "#,
        )
        .unwrap();

        assert_eq!("Hi", msg.subject);
        assert_eq!(Some("hello"), msg.text_body());
        assert_eq!(vec![Addr::with_name("a@x.com", "Alice")], *msg.from);
        assert_eq!(
            vec![Addr::new("b@x.com"), Addr::with_name("c@x.com", "Carol")],
            *msg.to
        );
        assert!(msg.cc.is_empty());
        assert_eq!(1, msg.attachments.len());
        assert_eq!(Some("text/plain"), msg.attachments[0].content_type.as_deref());
    }
}
