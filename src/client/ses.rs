use aws_sdk_sesv2::{
    operation::send_email::SendEmailInput,
    primitives::Blob,
    types::{self, AttachmentContentDisposition, AttachmentContentTransferEncoding},
};
use log::{debug, trace};
use std::sync::Arc;
use tokio::runtime::Runtime;

use crate::email::{
    self, AttachmentEntry, Content, Destination, SendEmail, SendEmailRequest, SendEmailResponse,
};

/// Synchronous wrapper around the SESv2 client.
#[derive(Clone, Debug)]
pub struct SesV2Client {
    client: aws_sdk_sesv2::Client,
    runtime: Arc<Runtime>,
}

impl SesV2Client {
    pub fn new(client: aws_sdk_sesv2::Client, runtime: Arc<Runtime>) -> Self {
        Self { client, runtime }
    }

    pub fn inner(&self) -> &aws_sdk_sesv2::Client {
        &self.client
    }
}

fn build_err(err: aws_sdk_sesv2::error::BuildError) -> email::Error {
    email::Error::BuildRequestError(Box::new(err))
}

fn to_sdk_content(content: &Content) -> email::Result<types::Content> {
    types::Content::builder()
        .data(&content.data)
        .charset(&content.charset)
        .build()
        .map_err(build_err)
}

fn to_sdk_attachment(attachment: &AttachmentEntry) -> email::Result<types::Attachment> {
    types::Attachment::builder()
        .file_name(&attachment.file_name)
        .raw_content(Blob::new(attachment.raw_content.clone()))
        .content_type(&attachment.content_type)
        .content_disposition(AttachmentContentDisposition::from(
            attachment.content_disposition.as_str(),
        ))
        .content_transfer_encoding(AttachmentContentTransferEncoding::from(
            attachment.content_transfer_encoding.as_str(),
        ))
        .build()
        .map_err(build_err)
}

fn to_sdk_message(req: &SendEmailRequest) -> email::Result<types::Message> {
    let simple = &req.content.simple;

    let body = types::Body::builder()
        .set_text(simple.body.text.as_ref().map(to_sdk_content).transpose()?)
        .set_html(simple.body.html.as_ref().map(to_sdk_content).transpose()?)
        .build();

    let attachments = simple
        .attachments
        .as_ref()
        .map(|attachments| {
            attachments
                .iter()
                .map(to_sdk_attachment)
                .collect::<email::Result<Vec<_>>>()
        })
        .transpose()?;

    Ok(types::Message::builder()
        .subject(to_sdk_content(&simple.subject)?)
        .body(body)
        .set_attachments(attachments)
        .build())
}

fn to_sdk_destination(destination: &Destination) -> types::Destination {
    types::Destination::builder()
        .set_to_addresses(Some(destination.to_addresses.clone()))
        .set_cc_addresses(destination.cc_addresses.clone())
        .set_bcc_addresses(destination.bcc_addresses.clone())
        .build()
}

/// Converts the assembled request into the SESv2 operation input.
fn to_sdk_input(req: &SendEmailRequest) -> email::Result<SendEmailInput> {
    let content = types::EmailContent::builder()
        .simple(to_sdk_message(req)?)
        .build();

    SendEmailInput::builder()
        .from_email_address(&req.from_email_address)
        .destination(to_sdk_destination(&req.destination))
        .content(content)
        .set_reply_to_addresses(req.reply_to_addresses.clone())
        .build()
        .map_err(build_err)
}

impl SendEmail for SesV2Client {
    fn send_email(&self, req: &SendEmailRequest) -> email::Result<SendEmailResponse> {
        trace!(">> send email through SESv2");

        let input = to_sdk_input(req)?;

        let output = self
            .runtime
            .block_on(
                self.client
                    .send_email()
                    .set_from_email_address(input.from_email_address)
                    .set_destination(input.destination)
                    .set_content(input.content)
                    .set_reply_to_addresses(input.reply_to_addresses)
                    .send(),
            )
            .map_err(|err| email::Error::SendEmailError(Box::new(err)))?;

        let message_id = output.message_id().map(ToOwned::to_owned);
        debug!("SESv2 accepted message {:?}", message_id);

        trace!("<< send email through SESv2");
        Ok(SendEmailResponse { message_id })
    }
}
