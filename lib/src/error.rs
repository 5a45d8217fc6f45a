use crate::config::EnvPresence;

/// Which piece of mail configuration could not be resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Missing {
    Credentials,
    Recipient,
}

/// All possible Courier errors.
///
/// Each variant is a terminal state of a single dispatch. Nothing past the
/// dispatcher sees a panic or a raw relay error; the server maps these to
/// HTTP status codes and JSON bodies.
#[derive(Clone, Debug)]
pub enum Error {
    /// A required field is missing or empty for the selected submission kind.
    Validation(String),

    /// Mail credentials or recipient could not be resolved.
    Configuration(Missing),

    /// The relay rejected authentication or could not be reached.
    Verification(String),

    /// The relay accepted the session but the send failed.
    Send {
        message: String,
        code: Option<String>,
        env_present: Option<EnvPresence>,
    },

    /// Anything else, e.g. a malformed multipart body.
    Unknown(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Error::Validation(ref msg) => write!(f, "{}", msg),
            Error::Configuration(Missing::Credentials) => write!(
                f,
                "Email service not configured. Missing SMTP credentials."
            ),
            Error::Configuration(Missing::Recipient) => write!(
                f,
                "Email service not configured. Missing recipient email."
            ),
            Error::Verification(ref msg) => write!(f, "Email service error: {}", msg),
            Error::Send { ref message, .. } => write!(f, "{}", message),
            Error::Unknown(_) => write!(f, "Failed to send message. Please try again later."),
        }
    }
}

impl std::error::Error for Error {}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Unknown(err.to_string())
    }
}
