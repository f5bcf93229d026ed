//! Application configuration structures.

use std::fs;
use std::path::Path;

use chrono::Weekday;
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Upper bound for `report.upcoming_days` (ten years).
pub const MAX_UPCOMING_DAYS: i64 = 3650;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Calendar page and HTTP behavior
    #[serde(default)]
    pub source: SourceConfig,

    /// Event container selection rule
    #[serde(default)]
    pub extract: ExtractConfig,

    /// Report window, summary day and wording
    #[serde(default)]
    pub report: ReportConfig,

    /// Mail delivery settings
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Snapshot store locations
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.source.user_agent.trim().is_empty() {
            return Err(AppError::validation("source.user_agent is empty"));
        }
        url::Url::parse(&self.source.url).map_err(|e| {
            AppError::validation(format!("source.url '{}' is invalid: {}", self.source.url, e))
        })?;
        if self.source.timeout_secs == 0 {
            return Err(AppError::validation("source.timeout_secs must be > 0"));
        }
        if self.extract.marker_attr.is_empty() || self.extract.id_attr.is_empty() {
            return Err(AppError::validation(
                "extract.marker_attr and extract.id_attr must be set",
            ));
        }
        if self.extract.id_delimiter.is_empty() {
            return Err(AppError::validation("extract.id_delimiter is empty"));
        }
        if !(1..=MAX_UPCOMING_DAYS).contains(&self.report.upcoming_days) {
            return Err(AppError::validation(format!(
                "report.upcoming_days must be between 1 and {}",
                MAX_UPCOMING_DAYS
            )));
        }
        if StrftimeItems::new(&self.report.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(AppError::validation(format!(
                "report.date_format '{}' is not a valid chrono format",
                self.report.date_format
            )));
        }
        Ok(())
    }
}

/// Calendar page location and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "defaults::url")]
    pub url: String,

    /// User-Agent header for the page request
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: defaults::url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Attributes identifying an event container.
///
/// A node qualifies when `marker_attr` equals `marker_value` and `id_attr`
/// ends in `<id_delimiter>YYYYMMDD`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    #[serde(default = "defaults::marker_attr")]
    pub marker_attr: String,

    #[serde(default = "defaults::marker_value")]
    pub marker_value: String,

    #[serde(default = "defaults::id_attr")]
    pub id_attr: String,

    #[serde(default = "defaults::id_delimiter")]
    pub id_delimiter: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            marker_attr: defaults::marker_attr(),
            marker_value: defaults::marker_value(),
            id_attr: defaults::id_attr(),
            id_delimiter: defaults::id_delimiter(),
        }
    }
}

/// Report trigger rules and display strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Length of the upcoming window in days, at most [`MAX_UPCOMING_DAYS`]
    #[serde(default = "defaults::upcoming_days")]
    pub upcoming_days: i64,

    /// Day on which a report is always sent
    #[serde(default = "defaults::summary_day")]
    pub summary_day: Weekday,

    #[serde(default = "defaults::heading")]
    pub heading: String,

    #[serde(default = "defaults::changed_title")]
    pub changed_title: String,

    /// `{days}` is replaced with `upcoming_days`
    #[serde(default = "defaults::upcoming_title")]
    pub upcoming_title: String,

    #[serde(default = "defaults::subject_prefix")]
    pub subject_prefix: String,

    /// chrono format string for dates in the mail
    #[serde(default = "defaults::date_format")]
    pub date_format: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            upcoming_days: defaults::upcoming_days(),
            summary_day: defaults::summary_day(),
            heading: defaults::heading(),
            changed_title: defaults::changed_title(),
            upcoming_title: defaults::upcoming_title(),
            subject_prefix: defaults::subject_prefix(),
            date_format: defaults::date_format(),
        }
    }
}

/// Mail API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Endpoint accepting `{from, to, subject, html}` JSON messages
    #[serde(default = "defaults::api_url")]
    pub api_url: String,

    #[serde(default = "defaults::from")]
    pub from: String,

    #[serde(default)]
    pub recipients: Vec<String>,

    /// Name handed to the credential provider for the API token
    #[serde(default = "defaults::credential_name")]
    pub credential_name: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            api_url: defaults::api_url(),
            from: defaults::from(),
            recipients: Vec::new(),
            credential_name: defaults::credential_name(),
        }
    }
}

/// Snapshot store locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory of the local snapshot store
    #[serde(default = "defaults::storage_dir")]
    pub dir: String,

    #[serde(default = "defaults::s3_bucket")]
    pub s3_bucket: String,

    #[serde(default = "defaults::s3_prefix")]
    pub s3_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: defaults::storage_dir(),
            s3_bucket: defaults::s3_bucket(),
            s3_prefix: defaults::s3_prefix(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use chrono::Weekday;

    // Source defaults
    pub fn url() -> String {
        "https://als-usingen.de/kalender/".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 \
         (KHTML, like Gecko) Version/17.0 Safari/605.1.15"
            .into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Extraction defaults
    pub fn marker_attr() -> String {
        "class".into()
    }
    pub fn marker_value() -> String {
        "events".into()
    }
    pub fn id_attr() -> String {
        "aria-labelledby".into()
    }
    pub fn id_delimiter() -> String {
        "-".into()
    }

    // Report defaults
    pub fn upcoming_days() -> i64 {
        60
    }
    pub fn summary_day() -> Weekday {
        Weekday::Fri
    }
    pub fn heading() -> String {
        "ALS Kalender Update".into()
    }
    pub fn changed_title() -> String {
        "Geänderte Kalendereinträge".into()
    }
    pub fn upcoming_title() -> String {
        "Einträge für die nächste {days} Tage".into()
    }
    pub fn subject_prefix() -> String {
        "ALS Kalender Update".into()
    }
    pub fn date_format() -> String {
        "%d.%m.%Y".into()
    }

    // Notify defaults
    pub fn api_url() -> String {
        "https://api.resend.com/emails".into()
    }
    pub fn from() -> String {
        "kalender@localhost".into()
    }
    pub fn credential_name() -> String {
        "mail-api-token".into()
    }

    // Storage defaults
    pub fn storage_dir() -> String {
        "storage/events".into()
    }
    pub fn s3_bucket() -> String {
        "calendar-watch".into()
    }
    pub fn s3_prefix() -> String {
        "calendar".into()
    }

    pub fn log_level() -> String {
        "info".into()
    }
}
