use dotenvy::dotenv;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default)]
struct Cli {
    port: Option<u16>,
    config: Option<String>,
}

fn parse_cli_from_args<I, S>(args: I) -> Cli
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut cli = Cli::default();
    let mut iter = args.into_iter().map(Into::into);

    // Skip binary name
    let _ = iter.next();

    while let Some(arg) = iter.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) => (flag.to_string(), Some(value.to_string())),
            None => (arg, None),
        };

        match flag.as_str() {
            "--port" => {
                let raw = inline.or_else(|| iter.next());
                cli.port = raw.and_then(|p| p.parse::<u16>().ok()).or(cli.port);
            }
            "--config" => {
                let raw = inline.or_else(|| iter.next());
                if let Some(path) = raw.filter(|p| !p.is_empty()) {
                    cli.config = Some(path);
                }
            }
            _ => {}
        }
    }

    cli
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    pub port: u16,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub cors: CorsSettings,
    #[serde(default)]
    pub mail: MailSettings,
    #[serde(default)]
    pub otp: OtpSettings,
    #[serde(default)]
    pub realtime: RealtimeSettings,
    #[serde(default)]
    pub debug: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct CorsSettings {
    /// Comma separated list of allowed origins.
    pub frontend_origin: Option<String>,
}

/// Origins compare without surrounding whitespace, trailing slashes or case.
fn normalize_origin(value: &str) -> Option<String> {
    let origin = value.trim().trim_end_matches('/');
    (!origin.is_empty()).then(|| origin.to_ascii_lowercase())
}

impl CorsSettings {
    /// The configured origins, normalized, in order, without duplicates.
    pub fn allowed_origins(&self) -> Vec<String> {
        let mut origins: Vec<String> = Vec::new();
        let raw = self.frontend_origin.as_deref().unwrap_or_default();
        for origin in raw.split(',').filter_map(normalize_origin) {
            if !origins.contains(&origin) {
                origins.push(origin);
            }
        }
        origins
    }

    pub fn allows(&self, origin: &str) -> bool {
        normalize_origin(origin)
            .map(|origin| self.allowed_origins().contains(&origin))
            .unwrap_or(false)
    }
}

/// SMTP delivery. When `enabled` is false mail is only logged.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MailSettings {
    #[serde(default)]
    pub enabled: bool,
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_email: String,
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_name() -> String {
    "Eventisa".to_string()
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: default_smtp_port(),
            username: None,
            password: None,
            from_email: "no-reply@eventisa.local".to_string(),
            from_name: default_from_name(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OtpSettings {
    #[serde(default = "default_otp_ttl_seconds")]
    pub ttl_seconds: i64,
}

fn default_otp_ttl_seconds() -> i64 {
    5 * 60
}

impl Default for OtpSettings {
    fn default() -> Self {
        Self {
            ttl_seconds: default_otp_ttl_seconds(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RealtimeSettings {
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_channel_capacity() -> usize {
    256
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl Settings {
    #[allow(clippy::result_large_err)]
    pub fn new() -> Result<Self, figment::Error> {
        dotenv().ok();
        Self::figment(parse_cli_from_args(std::env::args())).extract()
    }

    /// Like `new`, but with the extra TOML file given by the caller instead
    /// of a `--config` flag on the command line.
    #[allow(clippy::result_large_err)]
    pub fn with_config_file(path: Option<String>) -> Result<Self, figment::Error> {
        dotenv().ok();
        Self::figment(Cli {
            port: None,
            config: path,
        })
        .extract()
    }

    fn figment(cli: Cli) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));

        figment = figment.merge(Toml::file("/etc/eventisa/config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            figment = figment.merge(Toml::file(config_dir.join("eventisa/config.toml")));
        }

        figment = figment.merge(Toml::file("eventisa.toml"));

        let config_path = cli
            .config
            .or_else(|| std::env::var("EVENTISA_CONFIG_PATH").ok());
        if let Some(config_path) = config_path {
            figment = figment.merge(Toml::file(config_path));
        }

        figment = figment.merge(Env::prefixed("EVENTISA_").split("__"));

        if let Some(port) = cli.port {
            figment = figment.merge(("port", port));
        }

        figment
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            port: 8000,
            debug: false,
            database: DatabaseSettings {
                url: "sqlite://eventisa.db?mode=rwc".to_string(),
            },
            cors: CorsSettings::default(),
            mail: MailSettings::default(),
            otp: OtpSettings::default(),
            realtime: RealtimeSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_cli_ignores_unknown_flags() {
        let cli = parse_cli_from_args(["api-bin", "--quiet", "--nocapture", "--port", "4010"]);

        assert_eq!(cli.port, Some(4010));
        assert_eq!(cli.config, None);
    }

    #[test]
    fn parse_cli_supports_equals_syntax() {
        let cli = parse_cli_from_args(["api-bin", "--config=local.toml", "--port=3111"]);

        assert_eq!(cli.port, Some(3111));
        assert_eq!(cli.config.as_deref(), Some("local.toml"));
    }

    #[test]
    fn parse_cli_ignores_invalid_port_values() {
        let cli = parse_cli_from_args(["api-bin", "--port", "invalid"]);

        assert_eq!(cli.port, None);
        assert_eq!(cli.config, None);
    }

    #[test]
    fn layered_sources_override_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "eventisa.toml",
                r#"
                port = 9100

                [mail]
                smtp_host = "smtp.example.com"
                from_email = "tickets@example.com"
                "#,
            )?;
            jail.set_env("EVENTISA_MAIL__ENABLED", "true");
            jail.set_env("EVENTISA_OTP__TTL_SECONDS", "120");

            let settings: Settings = Settings::figment(Cli::default()).extract()?;
            assert_eq!(settings.port, 9100);
            assert!(settings.mail.enabled);
            assert_eq!(settings.mail.smtp_host, "smtp.example.com");
            assert_eq!(settings.mail.smtp_port, 587);
            assert_eq!(settings.otp.ttl_seconds, 120);
            assert_eq!(settings.realtime.channel_capacity, 256);
            Ok(())
        });
    }

    #[test]
    fn explicit_config_file_is_layered() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("setup.toml", "port = 9300\n[database]\nurl = \"sqlite::memory:\"\n")?;

            let settings = Settings::with_config_file(Some("setup.toml".to_string()))?;
            assert_eq!(settings.port, 9300);
            assert_eq!(settings.database.url, "sqlite::memory:");

            let settings = Settings::with_config_file(None)?;
            assert_eq!(settings.port, Settings::default().port);
            Ok(())
        });
    }

    #[test]
    fn cors_origins_are_normalized_and_deduplicated() {
        let cors = CorsSettings {
            frontend_origin: Some(
                " https://App.example.com/ , https://app.example.com,, https://admin.example.com/"
                    .to_string(),
            ),
        };
        assert_eq!(
            cors.allowed_origins(),
            ["https://app.example.com", "https://admin.example.com"]
        );
        assert!(cors.allows("https://APP.example.com/"));
        assert!(!cors.allows("https://evil.example.com"));
        assert!(!cors.allows("  "));

        let none = CorsSettings::default();
        assert!(none.allowed_origins().is_empty());
        assert!(!none.allows("https://app.example.com"));
    }

    #[test]
    fn cli_port_wins_over_environment() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("EVENTISA_PORT", "7000");
            let cli = parse_cli_from_args(["api-bin", "--port", "7100"]);

            let settings: Settings = Settings::figment(cli).extract()?;
            assert_eq!(settings.port, 7100);
            Ok(())
        });
    }
}
