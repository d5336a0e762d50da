//! Verbindungszustaende
//!
//! Ein gemeinsamer Zustands-Enum fuer Host, Teilnehmer und die
//! Konferenz selbst. Die Signalisierungsschicht meldet Zustaende als
//! Integer-Codes; unbekannte Codes werden beim Umwandeln abgelehnt.

use serde::{Deserialize, Serialize};

use crate::error::{CallbridgeError, Result};

/// Anrufzustand einer Verbindung
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verbindungszustand {
    /// Verbindung wird aufgebaut, noch keine Signalisierung
    Initialisierung,
    /// Neu angelegt, noch nicht klingelnd
    Neu,
    /// Eingehend, klingelt
    Klingelt,
    /// Ausgehend, waehlt
    Waehlt,
    /// Im Gespraech
    Aktiv,
    /// Gehalten
    Gehalten,
    /// Beendet
    Getrennt,
}

impl Verbindungszustand {
    /// Alle Zustaende in Code-Reihenfolge
    pub const ALLE: [Verbindungszustand; 7] = [
        Self::Initialisierung,
        Self::Neu,
        Self::Klingelt,
        Self::Waehlt,
        Self::Aktiv,
        Self::Gehalten,
        Self::Getrennt,
    ];

    /// Gibt den Signalisierungs-Code des Zustands zurueck
    pub fn code(&self) -> i32 {
        match self {
            Self::Initialisierung => 0,
            Self::Neu => 1,
            Self::Klingelt => 2,
            Self::Waehlt => 3,
            Self::Aktiv => 4,
            Self::Gehalten => 5,
            Self::Getrennt => 6,
        }
    }

    /// Kurzname fuer Logs und Serialisierung
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initialisierung => "initialisierung",
            Self::Neu => "neu",
            Self::Klingelt => "klingelt",
            Self::Waehlt => "waehlt",
            Self::Aktiv => "aktiv",
            Self::Gehalten => "gehalten",
            Self::Getrennt => "getrennt",
        }
    }

    /// Nach `Getrennt` gibt es keinen Uebergang mehr
    pub fn ist_endgueltig(&self) -> bool {
        matches!(self, Self::Getrennt)
    }

    /// Zustand in dem eine Verbindung den Vordergrund beansprucht
    pub fn ist_vordergrund(&self) -> bool {
        matches!(self, Self::Aktiv)
    }
}

impl TryFrom<i32> for Verbindungszustand {
    type Error = CallbridgeError;

    fn try_from(code: i32) -> Result<Self> {
        Self::ALLE
            .iter()
            .copied()
            .find(|z| z.code() == code)
            .ok_or(CallbridgeError::UngueltigerZustandCode(code))
    }
}

impl std::str::FromStr for Verbindungszustand {
    type Err = CallbridgeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALLE
            .iter()
            .copied()
            .find(|z| z.name() == s)
            .ok_or_else(|| CallbridgeError::UngueltigerZustandName(s.to_string()))
    }
}

impl std::fmt::Display for Verbindungszustand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
