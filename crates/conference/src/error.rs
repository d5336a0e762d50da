//! Fehlertypen fuer die Konferenz-Verwaltung

use callbridge_core::{CallbridgeError, KonferenzId};
use thiserror::Error;

/// Fehler der Signalisierungsschicht bzw. der Anrufverwaltung
///
/// Diese Fehler werden an der Grenze der Konferenz abgefangen und
/// protokolliert, nie weitergereicht.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalisierungsFehler {
    /// Der Anruf ist nicht in einem Zustand, der die Aktion erlaubt
    #[error("Ungueltiger Anrufzustand: {0}")]
    Zustand(String),

    /// Zur Verbindung existiert kein Anruf (mehr)
    #[error("Kein Anruf vorhanden")]
    KeinAnruf,

    /// Signalisierungsschicht nicht erreichbar
    #[error("Signalisierung nicht verfuegbar: {0}")]
    NichtVerfuegbar(String),
}

/// Fehlertyp fuer die Konferenz-Verwaltung
#[derive(Debug, Error)]
pub enum KonferenzError {
    /// Fehler aus den Kerntypen (ungueltiger Zustand, Endpunkt)
    #[error(transparent)]
    Kern(#[from] CallbridgeError),

    /// Fehler der Signalisierungsschicht
    #[error("Signalisierungsfehler: {0}")]
    Signalisierung(#[from] SignalisierungsFehler),

    /// Konferenz unbekannt
    #[error("Konferenz nicht gefunden: {0}")]
    NichtGefunden(KonferenzId),

    /// Konferenz ist bereits abgebaut
    #[error("Konferenz bereits abgebaut: {0}")]
    Abgebaut(KonferenzId),

    /// Ungueltige Konfiguration
    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),
}

impl KonferenzError {
    /// Erstellt einen Konfigurationsfehler
    pub fn konfiguration(msg: impl Into<String>) -> Self {
        Self::Konfiguration(msg.into())
    }
}

/// Result-Typ fuer die Konferenz-Verwaltung
pub type KonferenzResult<T> = Result<T, KonferenzError>;
