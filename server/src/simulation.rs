//! Simulierte Signalisierung fuer die Wiedergabe
//!
//! Ohne Funkschicht nimmt der simulierte Host jede Aktion an und
//! protokolliert sie. Den Trennungsgrund setzt die Wiedergabe, sobald ein
//! `getrennt`-Ereignis durchlaeuft.

use callbridge_conference::{
    AnrufRegister, ParticipantConnection, SignalisierungsFehler, SignalisierungsHandle,
};
use callbridge_core::{KontoHandle, SignalisierungsGrund, TelefonId};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Host-Verbindung ohne echten Anruf dahinter
pub struct SimulierterHost {
    name: String,
    telefon: TelefonId,
    grund: Mutex<SignalisierungsGrund>,
    aufgelegt: AtomicBool,
}

impl SimulierterHost {
    pub fn neu(name: impl Into<String>, telefon: TelefonId) -> Self {
        Self {
            name: name.into(),
            telefon,
            grund: Mutex::new(SignalisierungsGrund::Unbekannt),
            aufgelegt: AtomicBool::new(false),
        }
    }

    /// Merkt sich den zuletzt gemeldeten Trennungsgrund
    pub fn grund_setzen(&self, grund: SignalisierungsGrund) {
        *self.grund.lock() = grund;
    }

    fn protokollieren(&self, aktion: &str) -> Result<(), SignalisierungsFehler> {
        tracing::info!(host = %self.name, telefon = %self.telefon, aktion, "Signalisierung");
        Ok(())
    }
}

impl SignalisierungsHandle for SimulierterHost {
    fn bezeichnung(&self) -> String {
        self.name.clone()
    }

    fn telefon_id(&self) -> TelefonId {
        self.telefon
    }

    fn hat_anruf(&self) -> bool {
        !self.aufgelegt.load(Ordering::SeqCst)
    }

    fn trennungsgrund(&self) -> SignalisierungsGrund {
        *self.grund.lock()
    }

    fn auflegen(&self) -> Result<(), SignalisierungsFehler> {
        self.aufgelegt.store(true, Ordering::SeqCst);
        self.protokollieren("auflegen")
    }

    fn halten(&self) -> Result<(), SignalisierungsFehler> {
        self.protokollieren("halten")
    }

    fn fortsetzen(&self) -> Result<(), SignalisierungsFehler> {
        self.protokollieren("fortsetzen")
    }

    fn dtmf_abspielen(&self, ton: char) -> Result<(), SignalisierungsFehler> {
        if !ton.is_ascii_digit() && !matches!(ton, '*' | '#' | 'A'..='D') {
            return Err(SignalisierungsFehler::Zustand(format!("kein DTMF-Ton: {ton}")));
        }
        tracing::info!(host = %self.name, ton = %ton, "Signalisierung: DTMF");
        Ok(())
    }

    fn dtmf_stoppen(&self) -> Result<(), SignalisierungsFehler> {
        self.protokollieren("dtmf_stoppen")
    }
}

/// Anrufverwaltung, die Veroeffentlichungen nur protokolliert und zaehlt
#[derive(Default)]
pub struct ProtokollRegister {
    veroeffentlicht: AtomicUsize,
}

impl ProtokollRegister {
    pub fn veroeffentlicht(&self) -> usize {
        self.veroeffentlicht.load(Ordering::SeqCst)
    }
}

impl AnrufRegister for ProtokollRegister {
    fn bestehende_verbindung_hinzufuegen(
        &self,
        konto: &KontoHandle,
        teilnehmer: &ParticipantConnection,
    ) {
        self.veroeffentlicht.fetch_add(1, Ordering::SeqCst);
        tracing::info!(
            konto = %konto,
            endpoint = %teilnehmer.endpoint(),
            anzeigename = teilnehmer.anzeigename().unwrap_or("-"),
            "Teilnehmer veroeffentlicht"
        );
    }
}
