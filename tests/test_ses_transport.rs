use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::json;
use std::{
    io::Write,
    sync::{Arc, Mutex},
};

use aws_bridge::{
    email::{
        Addr, Attachment, Error, Message, Result, SendEmail, SendEmailRequest, SendEmailResponse,
        SesTransport,
    },
    Error as BridgeError,
};

#[derive(Clone, Default)]
struct CapturingClient {
    requests: Arc<Mutex<Vec<SendEmailRequest>>>,
}

impl CapturingClient {
    fn last_request(&self) -> serde_json::Value {
        let requests = self.requests.lock().unwrap();
        serde_json::to_value(requests.last().unwrap()).unwrap()
    }
}

impl SendEmail for CapturingClient {
    fn send_email(&self, req: &SendEmailRequest) -> Result<SendEmailResponse> {
        self.requests.lock().unwrap().push(req.clone());
        Ok(SendEmailResponse {
            message_id: Some("0100018c-example".into()),
        })
    }
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_ses_transport() {
    init_logger();

    let client = CapturingClient::default();
    let transport = SesTransport::new(client.clone());

    // check that a simple message is sent with the expected shape
    let msg = Message::new()
        .from(("a@x.com", "Alice"))
        .to("b@x.com")
        .subject("Hi")
        .text("hello");
    let receipt = transport.send(&msg).unwrap();
    assert_eq!(Some("0100018c-example".to_owned()), receipt.id);

    let req = client.last_request();
    assert_eq!(json!("\"Alice\" <a@x.com>"), req["FromEmailAddress"]);
    assert_eq!(json!(["b@x.com"]), req["Destination"]["ToAddresses"]);
    assert_eq!(
        json!({ "Data": "Hi", "Charset": "UTF-8" }),
        req["Content"]["Simple"]["Subject"]
    );
    assert!(req["Content"]["Simple"].get("Attachments").is_none());
    assert!(req.get("ReplyToAddresses").is_none());

    // check that empty cc is omitted while bcc is kept
    let msg = Message::new()
        .from("a@x.com")
        .to("c@x.com")
        .bcc("b@x.com")
        .html("<p>hello</p>");
    transport.send(&msg).unwrap();

    let req = client.last_request();
    assert!(req["Destination"].get("CcAddresses").is_none());
    assert_eq!(json!(["b@x.com"]), req["Destination"]["BccAddresses"]);
    assert!(req["Content"]["Simple"]["Body"].get("Text").is_none());
    assert_eq!(
        json!("<p>hello</p>"),
        req["Content"]["Simple"]["Body"]["Html"]["Data"]
    );

    // check that names are quoted and escaped, and that a name equal
    // to the email renders the bare email
    let msg = Message::new()
        .from("a@x.com")
        .to(Addr::with_name("b@x.com", "b@x.com"))
        .to(Addr::with_name("c@x.com", "Carol \"C\" Doe"))
        .cc("d@x.com")
        .reply_to(("r@x.com", "Replies"));
    transport.send(&msg).unwrap();

    let req = client.last_request();
    assert_eq!(
        json!(["b@x.com", "\"Carol \\\"C\\\" Doe\" <c@x.com>"]),
        req["Destination"]["ToAddresses"]
    );
    assert_eq!(json!(["d@x.com"]), req["Destination"]["CcAddresses"]);
    assert_eq!(json!(["\"Replies\" <r@x.com>"]), req["ReplyToAddresses"]);
    assert_eq!(json!({}), req["Content"]["Simple"]["Body"]);

    // check that an encoded subject is decoded
    let msg = Message::new()
        .from("a@x.com")
        .subject("=?UTF-8?Q?R=C3=A9sum=C3=A9?=");
    transport.send(&msg).unwrap();

    let req = client.last_request();
    assert_eq!(json!("Résumé"), req["Content"]["Simple"]["Subject"]["Data"]);

    assert_eq!(4, client.requests.lock().unwrap().len());
}

#[test]
fn test_ses_transport_attachments() {
    init_logger();

    let client = CapturingClient::default();
    let transport = SesTransport::new(client.clone());

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"plain text attachment").unwrap();

    let payload = STANDARD.encode([0u8, 159, 146, 150, 255]);

    // check that file and encoded attachments are both sent raw
    let msg = Message::new()
        .from("a@x.com")
        .to("b@x.com")
        .text("see attached")
        .attachment(Attachment::from_file("notes.txt", file.path()).with_content_type("text/plain"))
        .attachment(Attachment::from_data("blob.bin", payload.clone()));
    transport.send(&msg).unwrap();

    let req = client.last_request();
    assert_eq!(
        json!([
            {
                "FileName": "notes.txt",
                "RawContent": STANDARD.encode(b"plain text attachment"),
                "ContentType": "text/plain",
                "ContentDisposition": "ATTACHMENT",
                "ContentTransferEncoding": "BASE64",
            },
            {
                "FileName": "blob.bin",
                "RawContent": payload,
                "ContentType": "application/octet-stream",
                "ContentDisposition": "ATTACHMENT",
                "ContentTransferEncoding": "BASE64",
            },
        ]),
        req["Content"]["Simple"]["Attachments"]
    );

    // check that an invalid payload aborts the send
    let msg = Message::new()
        .from("a@x.com")
        .to("b@x.com")
        .attachment(Attachment::from_data("broken.bin", "this is not base64!"));
    let err = transport.send(&msg).unwrap_err();
    assert!(matches!(err, Error::DecodeAttachmentError(..)));
    assert_eq!(1, client.requests.lock().unwrap().len());

    // check that the error converts into the crate error
    let err: BridgeError = err.into();
    assert!(matches!(err, BridgeError::EmailError(_)));
}
