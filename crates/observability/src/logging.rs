//! Structured Logging Setup via tracing-subscriber
//!
//! Konfigurierbar per Umgebungsvariable:
//! - `CB_LOG_LEVEL`: Filter-Direktive (z.B. `info` oder
//!   `info,callbridge_conference=debug`), Standard aus der Konfiguration
//! - `CB_LOG_FORMAT`: Format (text/json), Standard aus der Konfiguration
//!
//! Konferenz-Logs tragen ihre Kontext-Felder (`konferenz`, `endpoint`,
//! `host`) als strukturierte Felder, im JSON-Format als eigene Schluessel.

use std::str::FromStr;
use thiserror::Error;
use tracing_subscriber::{fmt, EnvFilter};

/// Umgebungsvariable fuer den Log-Filter
pub const ENV_LOG_LEVEL: &str = "CB_LOG_LEVEL";
/// Umgebungsvariable fuer das Log-Format
pub const ENV_LOG_FORMAT: &str = "CB_LOG_FORMAT";

/// Fehler beim Einrichten des Loggings
#[derive(Debug, Error)]
pub enum LoggingFehler {
    #[error("Ungueltiger Log-Filter '{0}'")]
    UngueltigerFilter(String),

    #[error("Ungueltiges Log-Format '{0}' (erlaubt: text, json)")]
    UngueltigesFormat(String),

    #[error("Logging bereits initialisiert")]
    BereitsInitialisiert,
}

/// Ausgabeformat der Logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggingFehler;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            anderes => Err(LoggingFehler::UngueltigesFormat(anderes.to_string())),
        }
    }
}

/// Initialisiert das Logging-System.
///
/// `CB_LOG_LEVEL` und `CB_LOG_FORMAT` haben Vorrang vor den uebergebenen
/// Werten. Darf pro Prozess nur einmal erfolgreich aufgerufen werden.
pub fn logging_initialisieren(level: &str, format: &str) -> Result<(), LoggingFehler> {
    let level = std::env::var(ENV_LOG_LEVEL).unwrap_or_else(|_| level.to_string());
    let format = std::env::var(ENV_LOG_FORMAT).unwrap_or_else(|_| format.to_string());

    let filter = filter_erstellen(&level)?;
    let format: LogFormat = format.parse()?;

    let ergebnis = match format {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_current_span(true)
            .try_init(),
        LogFormat::Text => fmt().with_env_filter(filter).with_target(true).try_init(),
    };
    ergebnis.map_err(|_| LoggingFehler::BereitsInitialisiert)
}

/// Baut den Filter aus einer Direktive wie `info,callbridge_conference=debug`
pub fn filter_erstellen(direktive: &str) -> Result<EnvFilter, LoggingFehler> {
    if direktive.trim().is_empty() {
        return Err(LoggingFehler::UngueltigerFilter(direktive.to_string()));
    }
    EnvFilter::try_new(direktive).map_err(|_| LoggingFehler::UngueltigerFilter(direktive.to_string()))
}

/// Validiert ob ein einfacher Log-Level-String gueltig ist.
pub fn log_level_gueltig(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error")
}
