//! HTML bodies and subject lines for notification mails.
//!
//! One pure function per submission kind. All user-supplied text is
//! HTML-escaped before newlines are turned into `<br>`.

use std::borrow::Cow;

use crate::submission::{
    MessageSubmission, MessageType, RsvpSubmission, SongRequestSubmission, Submission,
};

/// Content-ID the message body uses to reference the uploaded drawing.
pub const IMAGE_CONTENT_ID: &str = "handwritten-message";
pub const IMAGE_FILENAME: &str = "handwritten-message.png";
pub const IMAGE_CONTENT_TYPE: &str = "image/png";

const CARD_STYLE: &str = "margin: 20px 0; padding: 20px; background: #f9fafb; border-radius: 8px;";
const INSET_STYLE: &str = "margin: 20px 0; padding: 15px; background: #f9fafb; border-radius: 8px;";
const FOOTER_STYLE: &str = "color: #6b7280; font-size: 14px; margin-top: 20px;";

/// Escapes `&`, `<`, `>` and `"`, borrowing when nothing needs escaping.
pub fn escape(s: &str) -> Cow<'_, str> {
    html_escape::encode_double_quoted_attribute(s)
}

/// Escapes free text and turns each newline into a line break.
pub fn multiline(s: &str) -> String {
    escape(s).replace('\n', "<br>")
}

fn wrap(heading: &str, inner: &str) -> String {
    format!(
        "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\n\
         <h2 style=\"color: #4f46e5;\">{}</h2>\n{}\n</div>",
        heading, inner
    )
}

pub fn message_html(message: &MessageSubmission) -> String {
    let content = match (message.message_type(), &message.text_message) {
        (MessageType::Drawn, _) => format!(
            "<p>Here's the handwritten message:</p>\n\
             <div style=\"{}\">\n\
             <img src=\"cid:{}\" alt=\"Handwritten message\" \
             style=\"max-width: 100%; height: auto;\" />\n\
             </div>",
            INSET_STYLE, IMAGE_CONTENT_ID
        ),
        (MessageType::Written, Some(text)) => format!(
            "<p>Here's the written message:</p>\n\
             <div style=\"{} white-space: pre-wrap; line-height: 1.6;\">{}</div>",
            INSET_STYLE,
            multiline(text)
        ),
        (MessageType::Written, None) => "<p>No message text was provided.</p>".to_string(),
    };

    let inner = format!(
        "<p><strong>From:</strong> {}</p>\n{}",
        escape(&message.name),
        content
    );

    wrap("You've received a new message!", &inner)
}

pub fn rsvp_html(rsvp: &RsvpSubmission) -> String {
    let mut lines = vec![
        format!("<p><strong>Name:</strong> {}</p>", escape(&rsvp.name)),
        format!("<p><strong>Attendance:</strong> {}</p>", attendance_label(rsvp)),
    ];

    if rsvp.attending && rsvp.guests > 0 {
        lines.push(format!("<p><strong>Number of Guests:</strong> {}</p>", rsvp.guests));
    }

    // Names stand on their own, even when the count didn't parse
    if rsvp.attending && !rsvp.guest_names.trim().is_empty() {
        lines.push(format!(
            "<p><strong>Guest Names:</strong> {}</p>",
            escape(&rsvp.guest_names)
        ));
    }

    let inner = format!(
        "<div style=\"{}\">\n{}\n</div>\n\
         <p style=\"{}\">This RSVP was submitted through the engagement website.</p>",
        CARD_STYLE,
        lines.join("\n"),
        FOOTER_STYLE
    );

    wrap("New RSVP Received!", &inner)
}

pub fn song_request_html(request: &SongRequestSubmission) -> String {
    let inner = format!(
        "<div style=\"{}\">\n\
         <p><strong>From:</strong> {}</p>\n\
         <p><strong>Requested songs:</strong></p>\n\
         <div style=\"white-space: pre-wrap; line-height: 1.6;\">{}</div>\n\
         </div>\n\
         <p style=\"{}\">This song request was submitted through the engagement website.</p>",
        CARD_STYLE,
        escape(&request.name),
        multiline(&request.songs),
        FOOTER_STYLE
    );

    wrap("Wedding Playlist Song Request", &inner)
}

pub fn attendance_label(rsvp: &RsvpSubmission) -> &'static str {
    if rsvp.attending {
        "Attending"
    } else {
        "Not attending"
    }
}

/// Renders the body for whichever kind `submission` is.
pub fn html(submission: &Submission) -> String {
    match *submission {
        Submission::Message(ref m) => message_html(m),
        Submission::Rsvp(ref r) => rsvp_html(r),
        Submission::SongRequest(ref s) => song_request_html(s),
    }
}

/// Subject lines go into a mail header, not HTML, so they are not escaped.
pub fn subject(submission: &Submission) -> String {
    match *submission {
        Submission::Message(ref m) => format!("New Message from {}", m.name),
        Submission::Rsvp(ref r) => format!("New RSVP from {}", r.name),
        Submission::SongRequest(ref s) => format!("New Song Request from {}", s.name),
    }
}
