//! Eingabeformat der Wiedergabe (JSON Lines)
//!
//! Jede Zeile adressiert eine Konferenz ueber einen frei gewaehlten Namen
//! und traegt entweder ein Host-Ereignis oder eine Nutzeraktion:
//!
//! ```text
//! {"konferenz":"k1","ereignis":{"typ":"teilnehmer_geaendert","teilnehmer":[{"endpoint":"sip:a@b","zustand":"aktiv"}]}}
//! {"konferenz":"k1","ereignis":{"typ":"zustand_geaendert","code":4}}
//! {"konferenz":"k1","aktion":{"typ":"dtmf","ton":"5"}}
//! ```
//!
//! Leere Zeilen und Zeilen mit `#` am Anfang werden uebersprungen.

use callbridge_core::{Endpoint, HostEreignis};
use serde::{Deserialize, Serialize};

/// Eine Zeile der Wiedergabe-Eingabe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zeile {
    pub konferenz: String,
    #[serde(flatten)]
    pub inhalt: Inhalt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Inhalt {
    Ereignis(HostEreignis),
    Aktion(Aktion),
}

/// Nutzeraktion auf einer Konferenz
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "typ", rename_all = "snake_case")]
pub enum Aktion {
    Auflegen,
    Halten,
    Fortsetzen,
    Dtmf { ton: char },
    DtmfStopp,
    Abspalten { endpoint: Endpoint },
}

/// Parst eine Eingabezeile; `Ok(None)` fuer Leer- und Kommentarzeilen
pub fn zeile_parsen(zeile: &str) -> serde_json::Result<Option<Zeile>> {
    let zeile = zeile.trim();
    if zeile.is_empty() || zeile.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(zeile).map(Some)
}
