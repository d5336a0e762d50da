//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Dienst ohne Konfigurationsdatei
//! lauffaehig ist.

use callbridge_conference::KonferenzConfig;
use serde::{Deserialize, Serialize};

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Allgemeine Einstellungen
    pub server: ServerEinstellungen,
    /// Einstellungen fuer alle Konferenzen
    pub konferenz: KonferenzConfig,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
    /// Quelle der wiedergegebenen Host-Ereignisse
    pub wiedergabe: WiedergabeEinstellungen,
}

/// Allgemeine Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Anzeigename des Dienstes
    pub name: String,
    /// Telefon-Nummer ab der simulierte Host-Anrufe vergeben werden
    pub erstes_telefon: u32,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            name: "Callbridge".into(),
            erstes_telefon: 1,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Filter-Direktive, z.B. "info" oder "info,callbridge_conference=debug"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// Wiedergabe-Einstellungen
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WiedergabeEinstellungen {
    /// JSON-Lines-Datei mit Ereignissen (leer = stdin)
    pub datei: Option<String>,
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        let config: Self = match std::fs::read_to_string(pfad) {
            Ok(inhalt) => toml::from_str(&inhalt)
                .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Self::default()
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
                ))
            }
        };

        config
            .konferenz
            .validieren()
            .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
        Ok(config)
    }
}
