use std::convert::Infallible;
use std::sync::Arc;

use warp::{reply::Reply, Filter, Rejection};

use courier::Dispatcher;

use super::controllers;
use super::error;
use super::filters;

pub fn index() -> impl Filter<Extract = (&'static str,), Error = Rejection> + Clone {
    // GET / => 200 OK, used as a liveness check
    warp::path::end()
        .and(warp::get())
        .map(|| "Courier is running")
}

/// Route for /api/send-email
/// Accepts one multipart submission and mails a notification about it
pub fn submit(
    dispatcher: Arc<Dispatcher>,
    max_body_bytes: u64,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path!("api" / "send-email")
        .and(warp::post())
        .and(warp::multipart::form().max_length(max_body_bytes))
        .and(filters::with_dispatcher(dispatcher))
        .and_then(controllers::submit)
}

/// All routes, with every rejection turned into a JSON reply
pub fn router(
    dispatcher: Arc<Dispatcher>,
    max_body_bytes: u64,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    index()
        .or(submit(dispatcher, max_body_bytes))
        .recover(error::handle_rejection)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use courier::config::{MailConfig, Settings};
    use courier::mail::{
        MailFuture, MailTransport, OutgoingMail, Receipt, RelayError, TransportFactory,
    };

    const BOUNDARY: &str = "courier-test-boundary";
    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    #[derive(Default)]
    struct Relay {
        connects: AtomicUsize,
        sent: Mutex<Vec<OutgoingMail>>,
        verify_error: Option<String>,
    }

    struct Transport(Arc<Relay>);

    impl MailTransport for Transport {
        fn verify(&self) -> MailFuture<'_, ()> {
            Box::pin(async move {
                match self.0.verify_error {
                    Some(ref e) => Err(RelayError::new(e.clone())),
                    None => Ok(()),
                }
            })
        }

        fn send(&self, mail: OutgoingMail) -> MailFuture<'_, Receipt> {
            Box::pin(async move {
                self.0.sent.lock().unwrap().push(mail);
                Ok(Receipt {
                    message_id: "<relay-id@example.com>".to_string(),
                    response: "250 OK".to_string(),
                })
            })
        }
    }

    struct Factory(Arc<Relay>);

    impl TransportFactory for Factory {
        fn connect(&self, _config: &MailConfig) -> Result<Box<dyn MailTransport>, courier::Error> {
            self.0.connects.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(Transport(self.0.clone())))
        }
    }

    fn env(configured: bool) -> HashMap<String, String> {
        let mut env = HashMap::new();
        if configured {
            env.insert("GMAIL_USER".to_string(), "sender@example.com".to_string());
            env.insert("GMAIL_APP_PASSWORD".to_string(), "app-password".to_string());
        }
        env
    }

    fn dispatcher(relay: &Arc<Relay>, configured: bool) -> Arc<Dispatcher> {
        Arc::new(Dispatcher::new(
            Arc::new(env(configured)),
            Arc::new(Factory(relay.clone())),
            &Settings::default(),
        ))
    }

    enum Field<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a [u8]),
    }

    fn multipart(fields: &[Field]) -> Vec<u8> {
        let mut body = Vec::new();

        for field in fields {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match *field {
                Field::Text(name, value) => {
                    let disposition =
                        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name);
                    body.extend_from_slice(disposition.as_bytes());
                    body.extend_from_slice(value.as_bytes());
                }
                Field::File(name, filename, data) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                             Content-Type: image/png\r\n\r\n",
                            name, filename
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(data);
                }
            }
            body.extend_from_slice(b"\r\n");
        }

        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    async fn post(dispatcher: Arc<Dispatcher>, fields: &[Field<'_>]) -> (u16, serde_json::Value) {
        let resp = warp::test::request()
            .method("POST")
            .path("/api/send-email")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(multipart(fields))
            .reply(&router(dispatcher, 1024 * 1024))
            .await;

        let json = serde_json::from_slice(resp.body()).unwrap();
        (resp.status().as_u16(), json)
    }

    #[tokio::test]
    async fn index_is_alive() {
        let relay = Arc::new(Relay::default());
        let resp = warp::test::request()
            .path("/")
            .reply(&router(dispatcher(&relay, true), 1024))
            .await;

        assert_eq!(resp.status(), 200);
        assert_eq!(resp.body(), "Courier is running");
    }

    #[tokio::test]
    async fn rsvp_round_trip() {
        let relay = Arc::new(Relay::default());
        let (status, json) = post(
            dispatcher(&relay, true),
            &[
                Field::Text("type", "rsvp"),
                Field::Text("name", "Omar"),
                Field::Text("attending", "yes"),
                Field::Text("guests", "2"),
                Field::Text("guestNames", "Sara, Ali"),
            ],
        )
        .await;

        assert_eq!(status, 200);
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "RSVP submitted successfully!");
        assert_eq!(json["messageId"], "<relay-id@example.com>");

        let sent = relay.sent.lock().unwrap();
        assert_eq!(sent[0].subject, "New RSVP from Omar");
        assert_eq!(sent[0].to, "sender@example.com");
    }

    #[tokio::test]
    async fn blank_name_is_bad_request() {
        let relay = Arc::new(Relay::default());
        let (status, json) = post(
            dispatcher(&relay, true),
            &[
                Field::Text("type", "song-request"),
                Field::Text("name", " "),
                Field::Text("songs", "X"),
            ],
        )
        .await;

        assert_eq!(status, 400);
        assert_eq!(
            json,
            serde_json::json!({ "success": false, "message": "Please fill in all fields" })
        );
        assert_eq!(relay.connects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unconfigured_relay_is_server_error() {
        let relay = Arc::new(Relay::default());
        let (status, json) = post(dispatcher(&relay, false), &[Field::Text("name", "Nour")]).await;

        assert_eq!(status, 500);
        assert_eq!(json["message"], "Email service not configured. Missing SMTP credentials.");
        assert_eq!(relay.connects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn verification_failure_is_server_error() {
        let relay = Arc::new(Relay {
            verify_error: Some("Invalid login: 535-5.7.8".to_string()),
            ..Default::default()
        });
        let (status, json) = post(dispatcher(&relay, true), &[Field::Text("name", "Nour")]).await;

        assert_eq!(status, 500);
        assert_eq!(json["message"], "Email service error: Invalid login: 535-5.7.8");
        assert!(relay.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn drawing_is_embedded_inline() {
        let relay = Arc::new(Relay::default());
        let (status, json) = post(
            dispatcher(&relay, true),
            &[Field::Text("name", "Nour"), Field::File("image", "blob", PNG)],
        )
        .await;

        assert_eq!(status, 200);
        assert_eq!(json["message"], "Message sent successfully!");

        let sent = relay.sent.lock().unwrap();
        let attachment = &sent[0].attachments[0];
        assert_eq!(attachment.content, PNG);
        assert_eq!(attachment.content_type, "image/png");
        assert!(sent[0].html.contains("cid:handwritten-message"));
    }

    #[tokio::test]
    async fn malformed_body_is_unknown_error() {
        let relay = Arc::new(Relay::default());
        let resp = warp::test::request()
            .method("POST")
            .path("/api/send-email")
            .header("content-type", "multipart/form-data; boundary=nope")
            .body("this is not multipart")
            .reply(&router(dispatcher(&relay, true), 1024))
            .await;

        assert_eq!(resp.status(), 500);
        let json: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Failed to send message. Please try again later.");
        assert_eq!(relay.connects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn oversize_body_is_payload_too_large() {
        let relay = Arc::new(Relay::default());
        let resp = warp::test::request()
            .method("POST")
            .path("/api/send-email")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(multipart(&[Field::Text("name", "Nour")]))
            .reply(&router(dispatcher(&relay, true), 16))
            .await;

        assert_eq!(resp.status(), 413);
        let json: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(relay.connects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_path_is_json_not_found() {
        let relay = Arc::new(Relay::default());
        let resp = warp::test::request()
            .method("POST")
            .path("/api/elsewhere")
            .reply(&router(dispatcher(&relay, true), 1024))
            .await;

        assert_eq!(resp.status(), 404);
        let json: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(json["success"], false);
    }
}
