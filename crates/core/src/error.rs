//! Fehlertypen fuer Callbridge
//!
//! Zentraler Fehler-Enum fuer alle Wertetypen des Kern-Crates.
//! Untermodule koennen eigene Fehler definieren und via `#[from]` konvertieren.

use thiserror::Error;

/// Globaler Result-Alias fuer Callbridge
pub type Result<T> = std::result::Result<T, CallbridgeError>;

/// Alle Fehler die beim Erzeugen und Parsen der Kerntypen auftreten koennen
#[derive(Debug, Error)]
pub enum CallbridgeError {
    // --- Zustaende ---
    #[error("Ungueltiger Verbindungszustand: Code {0}")]
    UngueltigerZustandCode(i32),

    #[error("Ungueltiger Verbindungszustand: '{0}'")]
    UngueltigerZustandName(String),

    // --- Identitaeten ---
    #[error("Ungueltiger Endpunkt: {0}")]
    UngueltigerEndpunkt(String),

    // --- Konfiguration ---
    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),

    // --- Intern ---
    #[error("Interner Fehler: {0}")]
    Intern(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl CallbridgeError {
    /// Erstellt einen internen Fehler aus einer beliebigen Nachricht
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }

    /// Gibt true zurueck wenn der Fehler aus ungueltigen Eingabedaten stammt
    pub fn ist_eingabefehler(&self) -> bool {
        matches!(
            self,
            Self::UngueltigerZustandCode(_)
                | Self::UngueltigerZustandName(_)
                | Self::UngueltigerEndpunkt(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_anzeige() {
        let e = CallbridgeError::UngueltigerZustandCode(42);
        assert_eq!(e.to_string(), "Ungueltiger Verbindungszustand: Code 42");
    }

    #[test]
    fn eingabefehler_erkennung() {
        assert!(CallbridgeError::UngueltigerEndpunkt("".into()).ist_eingabefehler());
        assert!(!CallbridgeError::intern("kaputt").ist_eingabefehler());
    }
}
