use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Missing};

const ENV_PREFIX: &str = "COURIER";

const USER_VARS: &[&str] = &["SMTP_USER", "GMAIL_USER"];
const PASS_VARS: &[&str] = &["SMTP_PASS", "GMAIL_APP_PASSWORD", "GOOGLE_APP_PASSWORD"];
const RECIPIENT_VAR: &str = "CONTACT_EMAIL";

/// Anything that can hand out environment-style variables.
///
/// The dispatcher reads mail credentials through this on every request, so
/// tests can swap in a map instead of mutating the process environment.
pub trait EnvSource: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads from the real process environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// First non-empty value among `keys`, in order.
fn first_set(env: &dyn EnvSource, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| env.var(k))
        .find(|v| !v.is_empty())
}

/// Mail relay credentials and the address notifications go to.
#[derive(Clone, PartialEq, Eq)]
pub struct MailConfig {
    pub user: String,
    pub pass: String,
    pub recipient: String,
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("user", &self.user)
            .field("pass", &"<redacted>")
            .field("recipient", &self.recipient)
            .finish()
    }
}

impl MailConfig {
    /// Resolves credentials and recipient from `env`.
    ///
    /// Credentials are checked before the recipient, so with nothing set the
    /// caller always hears about credentials first.
    pub fn resolve(env: &dyn EnvSource) -> Result<Self, Error> {
        let user = first_set(env, USER_VARS);
        let pass = first_set(env, PASS_VARS);

        let (user, pass) = match (user, pass) {
            (Some(user), Some(pass)) => (user, pass),
            _ => return Err(Error::Configuration(Missing::Credentials)),
        };

        let recipient = first_set(env, &[RECIPIENT_VAR])
            .or_else(|| Some(user.clone()))
            .filter(|r| !r.is_empty())
            .ok_or(Error::Configuration(Missing::Recipient))?;

        Ok(Self {
            user,
            pass,
            recipient,
        })
    }
}

/// Which configuration variables were set at the time of a failure.
///
/// Only booleans are recorded, never the values themselves.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvPresence {
    #[serde(rename = "SMTP_USER")]
    pub smtp_user: bool,
    #[serde(rename = "SMTP_PASS")]
    pub smtp_pass: bool,
    #[serde(rename = "GMAIL_USER")]
    pub gmail_user: bool,
    #[serde(rename = "GMAIL_APP_PASSWORD")]
    pub gmail_app_password: bool,
    #[serde(rename = "GOOGLE_APP_PASSWORD")]
    pub google_app_password: bool,
    #[serde(rename = "CONTACT_EMAIL")]
    pub contact_email: bool,
}

impl EnvPresence {
    pub fn probe(env: &dyn EnvSource) -> Self {
        let set = |key: &str| env.var(key).map_or(false, |v| !v.is_empty());

        Self {
            smtp_user: set("SMTP_USER"),
            smtp_pass: set("SMTP_PASS"),
            gmail_user: set("GMAIL_USER"),
            gmail_app_password: set("GMAIL_APP_PASSWORD"),
            google_app_password: set("GOOGLE_APP_PASSWORD"),
            contact_email: set(RECIPIENT_VAR),
        }
    }
}

/// Server settings, loaded once at start-up.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Settings {
    pub bind: String,
    pub port: u16,
    pub max_body_bytes: u64,
    pub relay_timeout_secs: u64,
    pub sender_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 3000,
            max_body_bytes: 10 * 1024 * 1024,
            relay_timeout_secs: 30,
            sender_name: "Engagement Website".to_string(),
        }
    }
}

impl Settings {
    pub fn relay_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.relay_timeout_secs)
    }
}

/// Loads settings from an optional TOML file and merges in any environment
/// variables prefixed with COURIER_ (e.g. `COURIER_PORT=8080`).
///
/// Unset keys fall back to `Settings::default()`.
pub fn load_settings(path: Option<&str>) -> Result<Settings, Error> {
    let defaults = Settings::default();

    let mut builder = config::Config::builder()
        .set_default("bind", defaults.bind)?
        .set_default("port", defaults.port as i64)?
        .set_default("max_body_bytes", defaults.max_body_bytes as i64)?
        .set_default("relay_timeout_secs", defaults.relay_timeout_secs as i64)?
        .set_default("sender_name", defaults.sender_name)?;

    if let Some(path) = path {
        builder = builder.add_source(config::File::with_name(path));
    }

    let settings = builder
        .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
        .build()?
        .try_deserialize::<Settings>()?;

    Ok(settings)
}
