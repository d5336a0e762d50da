//! Gemeinsame Identifikationstypen fuer Callbridge
//!
//! Alle IDs verwenden das Newtype-Pattern um Verwechslungen zwischen
//! verschiedenen ID-Arten zur Compilezeit auszuschliessen.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CallbridgeError, Result};

/// Eindeutiger Endpunkt eines Konferenz-Teilnehmers (URI-artig)
///
/// Stabil ueber alle Roster-Updates hinweg und Schluessel des Rosters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Endpoint(String);

impl Endpoint {
    /// Erstellt einen Endpunkt, leere Werte werden abgelehnt
    pub fn neu(wert: impl Into<String>) -> Result<Self> {
        let wert = wert.into();
        if wert.trim().is_empty() {
            return Err(CallbridgeError::UngueltigerEndpunkt(wert));
        }
        Ok(Self(wert))
    }

    /// Gibt den Endpunkt als String-Slice zurueck
    pub fn als_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Endpoint {
    type Error = CallbridgeError;

    fn try_from(wert: String) -> Result<Self> {
        Self::neu(wert)
    }
}

impl From<Endpoint> for String {
    fn from(endpoint: Endpoint) -> Self {
        endpoint.0
    }
}

impl std::str::FromStr for Endpoint {
    type Err = CallbridgeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::neu(s)
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Eindeutige Konferenz-ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KonferenzId(pub Uuid);

impl KonferenzId {
    /// Erstellt eine neue zufaellige KonferenzId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for KonferenzId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for KonferenzId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "konferenz:{}", self.0)
    }
}

/// Telefon bzw. Subscription auf dem der Host-Anruf laeuft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TelefonId(pub u32);

impl std::fmt::Display for TelefonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "telefon:{}", self.0)
    }
}

/// Komponente unter der Callbridge Teilnehmer-Verbindungen veroeffentlicht
pub const STANDARD_KOMPONENTE: &str = "callbridge.telefonie";

/// Veroeffentlichungs-Identitaet einer Verbindung gegenueber der Anrufverwaltung
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KontoHandle {
    /// Komponente die das Konto bereitstellt
    pub komponente: String,
    /// Konto-Kennung innerhalb der Komponente
    pub id: String,
}

impl KontoHandle {
    /// Leitet das Standard-Konto fuer ein Telefon ab
    pub fn fuer_telefon(telefon: &TelefonId) -> Self {
        Self {
            komponente: STANDARD_KOMPONENTE.to_string(),
            id: telefon.0.to_string(),
        }
    }
}

impl std::fmt::Display for KontoHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.komponente, self.id)
    }
}
