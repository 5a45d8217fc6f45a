use std::collections::HashMap;

use crate::error::Error;

const FILL_ALL_FIELDS: &str = "Please fill in all fields";
const ENTER_NAME: &str = "Please enter your name";

/// A single uploaded file from the form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Upload {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Raw form contents as collected off the wire, before any interpretation.
#[derive(Clone, Debug, Default)]
pub struct FormFields {
    fields: HashMap<String, String>,
    image: Option<Upload>,
}

impl FormFields {
    pub fn new() -> Self {
        Default::default()
    }

    /// Records a text field. Later values for the same name are ignored,
    /// matching `FormData.get` semantics.
    pub fn insert_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.entry(name.into()).or_insert_with(|| value.into());
    }

    /// Records the uploaded image. Only the first one is kept.
    pub fn insert_image(&mut self, upload: Upload) {
        if self.image.is_none() {
            self.image = Some(upload);
        }
    }

    pub fn with_text(mut self, name: &str, value: &str) -> Self {
        self.insert_text(name, value);
        self
    }

    pub fn with_image(mut self, upload: Upload) -> Self {
        self.insert_image(upload);
        self
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmissionKind {
    Message,
    Rsvp,
    SongRequest,
}

impl SubmissionKind {
    /// Routes on the `type` discriminant: song-request, then rsvp, else message.
    pub fn from_discriminant(value: Option<&str>) -> Self {
        match value {
            Some("song-request") => Self::SongRequest,
            Some("rsvp") => Self::Rsvp,
            _ => Self::Message,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::Message => "message",
            Self::Rsvp => "rsvp",
            Self::SongRequest => "song-request",
        }
    }
}

impl std::fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `drawn` when an image came with the message, `written` otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageType {
    Drawn,
    Written,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageSubmission {
    pub name: String,
    pub image: Option<Upload>,
    pub text_message: Option<String>,
}

impl MessageSubmission {
    pub fn message_type(&self) -> MessageType {
        if self.image.is_some() {
            MessageType::Drawn
        } else {
            MessageType::Written
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RsvpSubmission {
    pub name: String,
    pub attending: bool,
    pub guests: u32,
    pub guest_names: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SongRequestSubmission {
    pub name: String,
    pub songs: String,
}

/// One decoded and validated form submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Submission {
    Message(MessageSubmission),
    Rsvp(RsvpSubmission),
    SongRequest(SongRequestSubmission),
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// Reads the leading base-10 digits, so `"2 guests"` is 2 and `"3.5"` is 3.
///
/// Negative or digit-less values count as zero guests.
fn parse_guests(value: Option<&str>) -> u32 {
    let value = match value {
        Some(v) => v.trim_start(),
        None => return 0,
    };

    if value.starts_with('-') {
        return 0;
    }

    let digits = value.strip_prefix('+').unwrap_or(value);
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    match digits[..end].parse::<u32>() {
        Ok(n) => n,
        Err(_) if end > 0 => u32::MAX,
        Err(_) => 0,
    }
}

impl Submission {
    /// Reads the discriminant once and decodes the matching kind.
    ///
    /// Validation happens here so nothing downstream sees an invalid
    /// submission.
    pub fn from_form(form: FormFields) -> Result<Self, Error> {
        let FormFields { mut fields, image } = form;
        let kind = SubmissionKind::from_discriminant(fields.get("type").map(String::as_str));
        let name = fields.get("name").map(String::as_str);

        match kind {
            SubmissionKind::SongRequest => {
                let songs = fields.get("songs").map(String::as_str);
                if is_blank(name) || is_blank(songs) {
                    return Err(Error::Validation(FILL_ALL_FIELDS.to_string()));
                }

                Ok(Submission::SongRequest(SongRequestSubmission {
                    name: fields.remove("name").unwrap_or_default(),
                    songs: fields.remove("songs").unwrap_or_default(),
                }))
            }
            SubmissionKind::Rsvp => {
                let attending = fields
                    .get("attending")
                    .map(String::as_str)
                    .filter(|a| !a.is_empty())
                    .unwrap_or("yes")
                    == "yes";
                let guests = fields.get("guests").map(String::as_str);

                if is_blank(name) || (attending && is_blank(guests)) {
                    return Err(Error::Validation(FILL_ALL_FIELDS.to_string()));
                }

                Ok(Submission::Rsvp(RsvpSubmission {
                    attending,
                    guests: parse_guests(guests),
                    name: fields.remove("name").unwrap_or_default(),
                    guest_names: fields.remove("guestNames").unwrap_or_default(),
                }))
            }
            SubmissionKind::Message => {
                if is_blank(name) {
                    return Err(Error::Validation(ENTER_NAME.to_string()));
                }

                Ok(Submission::Message(MessageSubmission {
                    name: fields.remove("name").unwrap_or_default(),
                    image: image.filter(|i| !i.data.is_empty()),
                    text_message: fields.remove("textMessage").filter(|t| !t.trim().is_empty()),
                }))
            }
        }
    }

    pub fn kind(&self) -> SubmissionKind {
        match *self {
            Submission::Message(_) => SubmissionKind::Message,
            Submission::Rsvp(_) => SubmissionKind::Rsvp,
            Submission::SongRequest(_) => SubmissionKind::SongRequest,
        }
    }

    pub fn name(&self) -> &str {
        match *self {
            Submission::Message(ref m) => &m.name,
            Submission::Rsvp(ref r) => &r.name,
            Submission::SongRequest(ref s) => &s.name,
        }
    }

    /// What the caller is told once the relay accepts the mail.
    pub fn success_message(&self) -> &'static str {
        match *self {
            Submission::Message(_) => "Message sent successfully!",
            Submission::Rsvp(_) => "RSVP submitted successfully!",
            Submission::SongRequest(_) => "Song request submitted successfully!",
        }
    }
}
