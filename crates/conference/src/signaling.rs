//! Schnittstellen zu den externen Kollaborateuren
//!
//! Die Konferenz besitzt keine Funkressourcen. Sie spricht die
//! Signalisierungsschicht und die Anrufverwaltung nur ueber diese
//! schmalen Traits an. Alle Aufrufe sind fire-and-forget: das Ergebnis
//! kommt spaeter als `HostEreignis` zurueck.

use callbridge_core::{KontoHandle, SignalisierungsGrund, TelefonId};
use std::sync::Arc;

use crate::error::SignalisierungsFehler;
use crate::participant::ParticipantConnection;

/// Handle auf die Signalisierungsverbindung zur Konferenzbruecke
pub trait SignalisierungsHandle: Send + Sync {
    /// Kennung fuer Logs
    fn bezeichnung(&self) -> String;

    /// Telefon auf dem der Host-Anruf laeuft
    fn telefon_id(&self) -> TelefonId;

    /// Gibt es zur Verbindung noch einen Anruf?
    fn hat_anruf(&self) -> bool {
        true
    }

    /// Zuletzt gemeldeter Trennungsgrund der Verbindung
    fn trennungsgrund(&self) -> SignalisierungsGrund;

    fn auflegen(&self) -> Result<(), SignalisierungsFehler>;

    fn halten(&self) -> Result<(), SignalisierungsFehler>;

    fn fortsetzen(&self) -> Result<(), SignalisierungsFehler>;

    fn dtmf_abspielen(&self, ton: char) -> Result<(), SignalisierungsFehler>;

    fn dtmf_stoppen(&self) -> Result<(), SignalisierungsFehler>;
}

/// Telefon-Objekt, ueber das Anrufe zusammengefuehrt werden
pub trait Telefon: Send + Sync {
    fn telefon_id(&self) -> TelefonId;

    /// Fuehrt die Anrufe des Telefons zu einer Konferenz zusammen
    fn konferenz(&self) -> Result<(), SignalisierungsFehler>;
}

/// Eine Verbindung die der Konferenz von aussen angeboten wird
pub trait ExterneVerbindung: Send + Sync {
    fn bezeichnung(&self) -> String;

    /// Telefon der Verbindung, falls sie einem zugeordnet ist
    fn telefon(&self) -> Option<Arc<dyn Telefon>>;
}

/// Anrufverwaltung, bei der Teilnehmer-Verbindungen veroeffentlicht werden
pub trait AnrufRegister: Send + Sync {
    /// Leitet die Veroeffentlichungs-Identitaet fuer ein Telefon ab
    fn konto_handle_erstellen(&self, telefon: &TelefonId) -> KontoHandle {
        KontoHandle::fuer_telefon(telefon)
    }

    /// Veroeffentlicht eine neue Teilnehmer-Verbindung
    fn bestehende_verbindung_hinzufuegen(
        &self,
        konto: &KontoHandle,
        teilnehmer: &ParticipantConnection,
    );
}
