//! Contains API-related struct definitions that are shared between the
//! dispatcher and the HTTP server.

use serde::{Deserialize, Serialize};

use crate::config::EnvPresence;
use crate::error::Error;
use crate::mail::PROVIDER;

/// JSON API response for a single submission.
///
/// Indicates if the mail went out and includes the relay's message id on
/// success, or whatever the relay said on failure.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResult {
    pub success: bool,
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,

    /// Only set when the relay failed to send
    #[serde(flatten)]
    pub relay: Option<RelayFailure>,

    /// Short description of an unexpected failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayFailure {
    /// Serialised as `null` when the relay gave no code
    pub code: Option<String>,
    pub provider: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_present: Option<EnvPresence>,
}

impl DispatchResult {
    pub fn sent(message: &str, message_id: String) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            message_id: Some(message_id),
            ..Default::default()
        }
    }
}

impl From<&Error> for DispatchResult {
    fn from(err: &Error) -> Self {
        let mut result = Self {
            success: false,
            message: err.to_string(),
            ..Default::default()
        };

        match *err {
            Error::Send {
                ref code,
                ref env_present,
                ..
            } => {
                result.relay = Some(RelayFailure {
                    code: code.clone(),
                    provider: PROVIDER.to_string(),
                    env_present: env_present.clone(),
                });
            }
            Error::Unknown(ref detail) => {
                result.error = Some(detail.clone());
            }
            _ => (),
        }

        result
    }
}
