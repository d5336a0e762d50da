//! Host-Verbindung – Adapter um die Signalisierungsverbindung zur Bruecke
//!
//! Die Host-Verbindung ist selbst kein Teilnehmer. Sie ist der einzige Weg
//! der Konferenz zum Signalisierungs-Handle und faengt dessen Fehler ab:
//! jede Aktion wird protokolliert und als `bool` gemeldet, nie als Fehler
//! weitergereicht. Nach `freigeben()` ist das Handle verworfen und alle
//! Aktionen sind No-ops.

use callbridge_core::{SignalisierungsGrund, TelefonId, Verbindungszustand};
use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, Weak};

use crate::error::SignalisierungsFehler;
use crate::signaling::SignalisierungsHandle;

/// Host-Verbindung einer Konferenz (exklusiv im Besitz der Konferenz)
pub struct HostConnection {
    handle: RwLock<Option<Arc<dyn SignalisierungsHandle>>>,
    /// Bleibt nach der Freigabe bestehen, laesst sich dann aber nicht mehr aufwerten
    schwach: Weak<dyn SignalisierungsHandle>,
    bezeichnung: String,
    telefon_id: TelefonId,
    letzter_zustand: Mutex<Option<Verbindungszustand>>,
}

impl HostConnection {
    /// Uebernimmt ein Signalisierungs-Handle
    pub fn neu(handle: Arc<dyn SignalisierungsHandle>) -> Self {
        let bezeichnung = handle.bezeichnung();
        let telefon_id = handle.telefon_id();
        tracing::debug!(host = %bezeichnung, telefon = %telefon_id, "Host-Verbindung angelegt");
        Self {
            schwach: Arc::downgrade(&handle),
            handle: RwLock::new(Some(handle)),
            bezeichnung,
            telefon_id,
            letzter_zustand: Mutex::new(None),
        }
    }

    pub fn bezeichnung(&self) -> &str {
        &self.bezeichnung
    }

    /// Telefon des Host-Anrufs (bleibt auch nach der Freigabe bekannt)
    pub fn telefon_id(&self) -> TelefonId {
        self.telefon_id
    }

    /// Nicht-besitzende Referenz fuer Teilnehmer
    pub fn schwaches_handle(&self) -> Weak<dyn SignalisierungsHandle> {
        self.schwach.clone()
    }

    pub fn ist_freigegeben(&self) -> bool {
        self.handle.read().is_none()
    }

    /// Verwirft das Handle
    pub fn freigeben(&self) {
        if self.handle.write().take().is_some() {
            tracing::debug!(host = %self.bezeichnung, "Host-Verbindung freigegeben");
        }
    }

    /// Merkt sich den zuletzt gemeldeten Zustand
    pub fn zustand_merken(&self, zustand: Verbindungszustand) {
        *self.letzter_zustand.lock() = Some(zustand);
    }

    pub fn letzter_zustand(&self) -> Option<Verbindungszustand> {
        *self.letzter_zustand.lock()
    }

    /// Trennungsgrund des Handles; nach der Freigabe unbekannt
    pub fn trennungsgrund(&self) -> SignalisierungsGrund {
        self.handle
            .read()
            .as_ref()
            .map(|h| h.trennungsgrund())
            .unwrap_or_default()
    }

    /// Legt den Host-Anruf auf
    pub fn auflegen(&self) -> bool {
        self.ausfuehren("auflegen", |h| {
            if !h.hat_anruf() {
                return Err(SignalisierungsFehler::KeinAnruf);
            }
            h.auflegen()
        })
    }

    pub fn halten(&self) -> bool {
        self.ausfuehren("halten", |h| h.halten())
    }

    pub fn fortsetzen(&self) -> bool {
        self.ausfuehren("fortsetzen", |h| h.fortsetzen())
    }

    pub fn dtmf_abspielen(&self, ton: char) -> bool {
        self.ausfuehren("dtmf_abspielen", |h| h.dtmf_abspielen(ton))
    }

    pub fn dtmf_stoppen(&self) -> bool {
        self.ausfuehren("dtmf_stoppen", |h| h.dtmf_stoppen())
    }

    // -----------------------------------------------------------------------
    // Interne Hilfsmethoden
    // -----------------------------------------------------------------------

    fn ausfuehren<F>(&self, aktion: &'static str, f: F) -> bool
    where
        F: FnOnce(&dyn SignalisierungsHandle) -> Result<(), SignalisierungsFehler>,
    {
        // Handle klonen, damit der Aufruf nicht unter dem Lock laeuft
        let Some(handle) = self.handle.read().clone() else {
            tracing::debug!(host = %self.bezeichnung, aktion, "Host bereits freigegeben");
            return false;
        };

        match f(handle.as_ref()) {
            Ok(()) => {
                tracing::debug!(host = %self.bezeichnung, aktion, "An Signalisierung uebergeben");
                true
            }
            Err(SignalisierungsFehler::KeinAnruf) => {
                tracing::debug!(host = %self.bezeichnung, aktion, "Kein Anruf vorhanden");
                false
            }
            Err(e) => {
                tracing::error!(
                    host = %self.bezeichnung,
                    aktion,
                    fehler = %e,
                    "Signalisierungsaufruf fehlgeschlagen"
                );
                false
            }
        }
    }
}

impl std::fmt::Display for HostConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.bezeichnung)?;
        if self.ist_freigegeben() {
            write!(f, " (freigegeben)")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct ZaehlHost {
        aufrufe: AtomicUsize,
        kaputt: AtomicBool,
        ohne_anruf: AtomicBool,
    }

    impl ZaehlHost {
        fn ergebnis(&self) -> Result<(), SignalisierungsFehler> {
            self.aufrufe.fetch_add(1, Ordering::SeqCst);
            if self.kaputt.load(Ordering::SeqCst) {
                Err(SignalisierungsFehler::Zustand("idle".into()))
            } else {
                Ok(())
            }
        }
    }

    impl SignalisierungsHandle for ZaehlHost {
        fn bezeichnung(&self) -> String {
            "host-1".into()
        }
        fn telefon_id(&self) -> TelefonId {
            TelefonId(1)
        }
        fn hat_anruf(&self) -> bool {
            !self.ohne_anruf.load(Ordering::SeqCst)
        }
        fn trennungsgrund(&self) -> SignalisierungsGrund {
            SignalisierungsGrund::Besetzt
        }
        fn auflegen(&self) -> Result<(), SignalisierungsFehler> {
            self.ergebnis()
        }
        fn halten(&self) -> Result<(), SignalisierungsFehler> {
            self.ergebnis()
        }
        fn fortsetzen(&self) -> Result<(), SignalisierungsFehler> {
            self.ergebnis()
        }
        fn dtmf_abspielen(&self, _ton: char) -> Result<(), SignalisierungsFehler> {
            self.ergebnis()
        }
        fn dtmf_stoppen(&self) -> Result<(), SignalisierungsFehler> {
            self.ergebnis()
        }
    }

    #[test]
    fn aktionen_werden_weitergereicht() {
        let inner = Arc::new(ZaehlHost::default());
        let host = HostConnection::neu(inner.clone());

        assert!(host.halten());
        assert!(host.fortsetzen());
        assert!(host.dtmf_abspielen('5'));
        assert!(host.dtmf_stoppen());
        assert!(host.auflegen());
        assert_eq!(inner.aufrufe.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn fehler_wird_abgefangen() {
        let inner = Arc::new(ZaehlHost::default());
        inner.kaputt.store(true, Ordering::SeqCst);
        let host = HostConnection::neu(inner.clone());

        assert!(!host.auflegen());
        assert_eq!(inner.aufrufe.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn auflegen_ohne_anruf_ist_noop() {
        let inner = Arc::new(ZaehlHost::default());
        inner.ohne_anruf.store(true, Ordering::SeqCst);
        let host = HostConnection::neu(inner.clone());

        assert!(!host.auflegen());
        assert_eq!(inner.aufrufe.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn nach_freigabe_keine_aufrufe() {
        let inner = Arc::new(ZaehlHost::default());
        let host = HostConnection::neu(inner.clone());

        assert_eq!(host.trennungsgrund(), SignalisierungsGrund::Besetzt);
        host.freigeben();

        assert!(host.ist_freigegeben());
        assert!(!host.halten());
        assert_eq!(host.trennungsgrund(), SignalisierungsGrund::Unbekannt);
        assert_eq!(host.telefon_id(), TelefonId(1));
        assert_eq!(inner.aufrufe.load(Ordering::SeqCst), 0);

        // Nur noch der Test haelt das Handle
        drop(inner);
        assert!(host.schwaches_handle().upgrade().is_none());
    }

    #[test]
    fn zustand_wird_gemerkt() {
        let host = HostConnection::neu(Arc::new(ZaehlHost::default()));
        assert_eq!(host.letzter_zustand(), None);

        host.zustand_merken(Verbindungszustand::Aktiv);
        assert_eq!(host.letzter_zustand(), Some(Verbindungszustand::Aktiv));
    }
}
