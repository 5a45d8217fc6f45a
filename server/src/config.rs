use clap::Parser;

use courier::config::Settings;

#[derive(Debug, Parser)]
#[command(
    name = "courier_server",
    about = "Mails website form submissions (messages, RSVPs, song requests) through Gmail."
)]
pub struct HttpArg {
    /// Path to a TOML settings file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Port to listen on, overrides the settings file
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl HttpArg {
    /// Applies command-line overrides on top of loaded settings.
    pub fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(port) = self.port {
            settings.port = port;
        }

        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_flag_overrides_settings() {
        let arg = HttpArg::parse_from(["courier_server", "--port", "8080"]);
        let settings = arg.apply(Settings::default());

        assert_eq!(settings.port, 8080);
        assert_eq!(settings.sender_name, Settings::default().sender_name);
    }

    #[test]
    fn no_flags_keep_settings() {
        let arg = HttpArg::parse_from(["courier_server"]);
        assert!(arg.config.is_none());
        assert_eq!(arg.apply(Settings::default()), Settings::default());
    }
}
