use std::{env, fmt};

use anyhow::{anyhow, Result};

pub const DEFAULT_SCRAPE_URL: &str =
    "https://joybadminton.com/collections/all-shuttlecock?sort_by=price-descending";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

fn get_env(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn get_env_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<u64> {
    match get_env(lookup, key) {
        None => Ok(default),
        Some(v) => Ok(v
            .parse::<u64>()
            .map_err(|e| anyhow!("{key} invalid int: {e}"))?),
    }
}

fn get_env_string(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    get_env(lookup, key).unwrap_or_else(|| default.to_string())
}

/// Sender/receiver pair plus the sender's application password.
#[derive(Clone, PartialEq, Eq)]
pub struct EmailCredentials {
    pub sender: String,
    pub password: String,
    pub receiver: String,
}

impl fmt::Debug for EmailCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailCredentials")
            .field("sender", &self.sender)
            .field("password", &"<redacted>")
            .field("receiver", &self.receiver)
            .finish()
    }
}

#[derive(Clone)]
pub struct Settings {
    // Catalog
    pub scrape_url: String,
    pub user_agent: String,
    pub http_timeout_secs: u64,

    // Storage
    pub data_file: String,

    // Email
    pub smtp_server: String,
    pub smtp_port: u16,
    pub sender_email: Option<String>,
    pub sender_password: Option<String>,
    pub receiver_email: Option<String>,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("scrape_url", &self.scrape_url)
            .field("user_agent", &self.user_agent)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("data_file", &self.data_file)
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .field("sender_email", &self.sender_email)
            .field("sender_password", &self.sender_password.as_ref().map(|_| "<redacted>"))
            .field("receiver_email", &self.receiver_email)
            .finish()
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup instead of the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let smtp_port = get_env_u64(&lookup, "SMTP_PORT", 587)?;
        let smtp_port =
            u16::try_from(smtp_port).map_err(|_| anyhow!("SMTP_PORT out of range (got {smtp_port})"))?;

        let s = Self {
            scrape_url: get_env_string(&lookup, "SCRAPE_URL", DEFAULT_SCRAPE_URL),
            user_agent: get_env_string(&lookup, "USER_AGENT", DEFAULT_USER_AGENT),
            http_timeout_secs: get_env_u64(&lookup, "HTTP_TIMEOUT_SECS", 30)?,
            data_file: get_env_string(&lookup, "DATA_FILE", "shuttlecocks.json"),
            smtp_server: get_env_string(&lookup, "SMTP_SERVER", "smtp.gmail.com"),
            smtp_port,
            sender_email: get_env(&lookup, "SENDER_EMAIL"),
            sender_password: get_env(&lookup, "SENDER_PASSWORD"),
            receiver_email: get_env(&lookup, "RECEIVER_EMAIL"),
        };

        s.validate()?;
        Ok(s)
    }

    /// All three delivery credentials, or `None` if any of them is missing.
    pub fn email_credentials(&self) -> Option<EmailCredentials> {
        Some(EmailCredentials {
            sender: self.sender_email.clone()?,
            password: self.sender_password.clone()?,
            receiver: self.receiver_email.clone()?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.scrape_url)
            .map_err(|e| anyhow!("SCRAPE_URL invalid ({}): {e}", self.scrape_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow!("SCRAPE_URL must be http(s) (got {})", self.scrape_url));
        }
        if self.data_file.trim().is_empty() {
            return Err(anyhow!("DATA_FILE must not be empty"));
        }
        if self.http_timeout_secs < 1 {
            return Err(anyhow!(
                "HTTP_TIMEOUT_SECS must be >= 1 (got {})",
                self.http_timeout_secs
            ));
        }
        if self.smtp_port == 0 {
            return Err(anyhow!("SMTP_PORT must be > 0"));
        }
        if self.smtp_server.trim().is_empty() {
            return Err(anyhow!("SMTP_SERVER must not be empty"));
        }
        Ok(())
    }
}
