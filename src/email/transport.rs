use log::{debug, trace};

use super::{Message, Result, SendEmailRequest};

/// Outcome of a `SendEmail` call, as returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendEmailResponse {
    pub message_id: Option<String>,
}

/// Receipt handed back to the caller once a message is sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendReceipt {
    pub id: Option<String>,
}

/// Client able to submit an assembled `SendEmail` request.
///
/// Implementors must surface their failures as
/// [`super::Error::SendEmailError`], keeping the underlying error as
/// source.
pub trait SendEmail {
    fn send_email(&self, req: &SendEmailRequest) -> Result<SendEmailResponse>;
}

impl<T: SendEmail + ?Sized> SendEmail for Box<T> {
    fn send_email(&self, req: &SendEmailRequest) -> Result<SendEmailResponse> {
        (**self).send_email(req)
    }
}

/// Email transport sending messages through SES.
pub struct SesTransport {
    client: Box<dyn SendEmail>,
}

impl SesTransport {
    pub fn new<C: SendEmail + 'static>(client: C) -> Self {
        Self {
            client: Box::new(client),
        }
    }

    /// Builds a transport on top of a fresh SESv2 client, with the
    /// given transport settings merged over the factory ones.
    #[cfg(feature = "ses")]
    pub fn from_factory(
        factory: &crate::client::ClientFactory,
        config: &crate::config::AwsConfig,
    ) -> Self {
        Self::new(factory.create_ses_v2(config))
    }

    /// Assembles the message then sends it. Nothing is sent if the
    /// assembly fails, and client failures are not retried.
    pub fn send(&self, msg: &Message) -> Result<SendReceipt> {
        trace!(">> send message");

        let req = SendEmailRequest::from_message(msg)?;
        let res = self.client.send_email(&req)?;
        debug!("message sent with id {:?}", res.message_id);

        trace!("<< send message");
        Ok(SendReceipt { id: res.message_id })
    }
}
