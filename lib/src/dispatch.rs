use std::sync::Arc;
use std::time::Duration;

use crate::api::DispatchResult;
use crate::config::{EnvPresence, EnvSource, MailConfig, Settings};
use crate::error::Error;
use crate::mail::{InlineAttachment, OutgoingMail, Session, TransportFactory};
use crate::render;
use crate::submission::{FormFields, Submission, SubmissionKind};

/// Validates one submission and mails a notification about it.
///
/// Holds no per-request state: every call resolves its own credentials and
/// opens its own relay session.
pub struct Dispatcher {
    env: Arc<dyn EnvSource>,
    transports: Arc<dyn TransportFactory>,
    sender_name: String,
    relay_timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        env: Arc<dyn EnvSource>,
        transports: Arc<dyn TransportFactory>,
        settings: &Settings,
    ) -> Self {
        Self {
            env,
            transports,
            sender_name: settings.sender_name.clone(),
            relay_timeout: settings.relay_timeout(),
        }
    }

    pub async fn dispatch(&self, form: FormFields) -> Result<DispatchResult, Error> {
        let result = self.run(form).await;

        if let Err(ref e) = result {
            match *e {
                Error::Validation(ref msg) => log::info!("Rejected submission: {}", msg),
                Error::Send { ref code, .. } => {
                    log::error!("Relay send failed: {} (code: {:?})", e, code)
                }
                _ => log::error!("Dispatch failed: {}", e),
            }
        }

        result
    }

    async fn run(&self, form: FormFields) -> Result<DispatchResult, Error> {
        let submission = Submission::from_form(form)?;
        let kind = submission.kind();

        log::info!("Handling {} submission from {}", kind, submission.name());

        let config = MailConfig::resolve(self.env.as_ref())?;

        let transport = self.transports.connect(&config)?;
        let session = Session::new(transport, self.relay_timeout).verify().await?;

        let success = submission.success_message();
        let mail = self.compose(submission, &config);

        let receipt = session.send(mail).await.map_err(|e| match e {
            // Operators get a hint about which variables were set, never their values
            Error::Send { message, code, .. } if kind == SubmissionKind::Message => Error::Send {
                message,
                code,
                env_present: Some(EnvPresence::probe(self.env.as_ref())),
            },
            other => other,
        })?;

        log::info!("Sent {} notification {} ({})", kind, receipt.message_id, receipt.response);

        Ok(DispatchResult::sent(success, receipt.message_id))
    }

    fn compose(&self, submission: Submission, config: &MailConfig) -> OutgoingMail {
        let subject = render::subject(&submission);
        let html = render::html(&submission);

        let attachments = match submission {
            Submission::Message(message) => message
                .image
                .map(InlineAttachment::from)
                .into_iter()
                .collect(),
            _ => Vec::new(),
        };

        OutgoingMail {
            from_name: self.sender_name.clone(),
            from: config.user.clone(),
            to: config.recipient.clone(),
            subject,
            html,
            attachments,
        }
    }
}
