//! Callbridge Server – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging und startet die Wiedergabe.

use anyhow::Result;
use callbridge_observability::logging_initialisieren;
use callbridge_server::{config::ServerConfig, Server};

#[tokio::main]
async fn main() -> Result<()> {
    // Konfigurationsdatei-Pfad aus Umgebungsvariable oder Standard
    let config_pfad = std::env::var("CALLBRIDGE_CONFIG").unwrap_or_else(|_| "config.toml".into());

    // Konfiguration laden (Standardwerte falls Datei fehlt)
    let config = ServerConfig::laden(&config_pfad)?;

    logging_initialisieren(&config.logging.level, &config.logging.format)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        "Callbridge Server wird initialisiert"
    );

    let statistik = Server::neu(config)?.starten().await?;
    if statistik.fehlerhaft > 0 {
        tracing::warn!(fehlerhaft = statistik.fehlerhaft, "Wiedergabe mit fehlerhaften Zeilen");
    }

    Ok(())
}
