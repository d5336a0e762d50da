//! Teilnehmer-Verbindung – Ein Konferenz-Teilnehmer als eigenstaendiges Objekt
//!
//! Jeder Eintrag des Konferenz-Ereignispakets wird durch eine
//! `ParticipantConnection` repraesentiert. Sie besitzt keine eigene
//! Funkressource; das Host-Handle wird nur schwach referenziert und nur
//! fuer Attribut-Abfragen (Telefon, Konto) genutzt.
//!
//! ## Lebenszyklus
//! ```text
//! neu (Startzustand, z.B. Gehalten)
//!     |  zustand_aktualisieren()
//!     v
//! Klingelt / Waehlt / Aktiv / Gehalten ...
//!     |  trennen(Abgebrochen)
//!     v
//! Getrennt  --zerstoeren()-->  Beobachter wird genau einmal benachrichtigt
//! ```

use callbridge_core::{
    Endpoint, KonferenzEreignis, KonferenzId, KontoHandle, TeilnehmerSnapshot, TelefonId,
    Trennungsgrund, Verbindungszustand,
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;

use crate::signaling::SignalisierungsHandle;

// ---------------------------------------------------------------------------
// Beobachter
// ---------------------------------------------------------------------------

/// Rueckkanal vom Teilnehmer zur besitzenden Konferenz
///
/// Wird beim Erzeugen uebergeben und beim Loesen aus der Konferenz
/// explizit entfernt.
pub trait TeilnehmerBeobachter: Send + Sync {
    /// Der Teilnehmer wurde zerstoert
    fn teilnehmer_zerstoert(&self, teilnehmer: &ParticipantConnection);
}

// ---------------------------------------------------------------------------
// ParticipantConnection
// ---------------------------------------------------------------------------

/// Veraenderlicher Zustand eines Teilnehmers
#[derive(Debug)]
struct TeilnehmerZustand {
    zustand: Verbindungszustand,
    trennungsgrund: Option<Trennungsgrund>,
    angehaengt: bool,
    zerstoert: bool,
}

/// Ein Konferenz-Teilnehmer
///
/// Clone teilt den inneren Zustand (Arc).
#[derive(Clone)]
pub struct ParticipantConnection {
    inner: Arc<ParticipantInner>,
}

struct ParticipantInner {
    /// Unveraenderlich nach dem Erzeugen
    endpoint: Endpoint,
    anzeigename: Option<String>,
    benutzer_uri: Option<String>,
    konferenz_id: KonferenzId,
    /// Nicht-besitzende Referenz auf das Host-Handle
    host: Weak<dyn SignalisierungsHandle>,
    erstellt_um: DateTime<Utc>,
    zustand: Mutex<TeilnehmerZustand>,
    beobachter: Mutex<Option<Arc<dyn TeilnehmerBeobachter>>>,
    ereignis_tx: broadcast::Sender<KonferenzEreignis>,
}

impl ParticipantConnection {
    /// Erzeugt einen Teilnehmer aus einem Snapshot im angegebenen Startzustand
    pub(crate) fn neu(
        snapshot: &TeilnehmerSnapshot,
        startzustand: Verbindungszustand,
        konferenz_id: KonferenzId,
        host: Weak<dyn SignalisierungsHandle>,
        beobachter: Arc<dyn TeilnehmerBeobachter>,
        ereignis_tx: broadcast::Sender<KonferenzEreignis>,
    ) -> Self {
        Self {
            inner: Arc::new(ParticipantInner {
                endpoint: snapshot.endpoint.clone(),
                anzeigename: snapshot.anzeigename.clone(),
                benutzer_uri: snapshot.benutzer_uri.clone(),
                konferenz_id,
                host,
                erstellt_um: Utc::now(),
                zustand: Mutex::new(TeilnehmerZustand {
                    zustand: startzustand,
                    trennungsgrund: None,
                    angehaengt: true,
                    zerstoert: false,
                }),
                beobachter: Mutex::new(Some(beobachter)),
                ereignis_tx,
            }),
        }
    }

    /// Setzt den Anrufzustand und benachrichtigt Abonnenten
    ///
    /// Gibt `false` zurueck wenn sich nichts geaendert hat. Aus `Getrennt`
    /// fuehrt kein Weg zurueck.
    pub fn zustand_aktualisieren(&self, neu: Verbindungszustand) -> bool {
        let alt = {
            let mut z = self.inner.zustand.lock();
            if z.zerstoert || z.zustand == neu {
                return false;
            }
            if z.zustand.ist_endgueltig() {
                tracing::debug!(
                    endpoint = %self.inner.endpoint,
                    neu = %neu,
                    "Zustandswechsel nach Getrennt ignoriert"
                );
                return false;
            }
            let alt = z.zustand;
            z.zustand = neu;
            alt
        };

        tracing::debug!(endpoint = %self.inner.endpoint, alt = %alt, neu = %neu, "Teilnehmer-Zustand");
        let _ = self
            .inner
            .ereignis_tx
            .send(KonferenzEreignis::TeilnehmerZustandGeaendert {
                konferenz_id: self.inner.konferenz_id,
                endpoint: self.inner.endpoint.clone(),
                alt,
                neu,
            });
        true
    }

    /// Trennt den Teilnehmer mit dem angegebenen Grund (idempotent)
    pub fn trennen(&self, grund: Trennungsgrund) -> bool {
        {
            let mut z = self.inner.zustand.lock();
            if z.zerstoert || z.trennungsgrund.is_some() {
                return false;
            }
            z.zustand = Verbindungszustand::Getrennt;
            z.trennungsgrund = Some(grund);
        }

        tracing::debug!(
            endpoint = %self.inner.endpoint,
            grund = %grund,
            protokollierbar = grund.ist_protokollierbar(),
            "Teilnehmer getrennt"
        );
        let _ = self
            .inner
            .ereignis_tx
            .send(KonferenzEreignis::TeilnehmerGetrennt {
                konferenz_id: self.inner.konferenz_id,
                endpoint: self.inner.endpoint.clone(),
                grund,
            });
        true
    }

    /// Zerstoert den Teilnehmer
    ///
    /// Ein noch registrierter Beobachter wird genau einmal benachrichtigt.
    pub fn zerstoeren(&self) {
        {
            let mut z = self.inner.zustand.lock();
            if z.zerstoert {
                return;
            }
            z.zerstoert = true;
        }

        // Beobachter ausserhalb der Locks aufrufen, er greift auf den Roster zu
        let beobachter = self.inner.beobachter.lock().take();
        if let Some(beobachter) = beobachter {
            beobachter.teilnehmer_zerstoert(self);
        }
    }

    /// Entfernt den Beobachter, danach meldet `zerstoeren` nichts mehr
    pub(crate) fn beobachter_trennen(&self) -> bool {
        self.inner.beobachter.lock().take().is_some()
    }

    /// Loest den Teilnehmer aus der Verbindungsliste der Konferenz
    pub(crate) fn konferenz_loesen(&self) {
        {
            let mut z = self.inner.zustand.lock();
            if !z.angehaengt {
                return;
            }
            z.angehaengt = false;
        }
        let _ = self
            .inner
            .ereignis_tx
            .send(KonferenzEreignis::TeilnehmerEntfernt {
                konferenz_id: self.inner.konferenz_id,
                endpoint: self.inner.endpoint.clone(),
            });
    }

    /// Prueft ob beide Handles auf denselben Teilnehmer zeigen
    pub fn ist_selbe(&self, andere: &ParticipantConnection) -> bool {
        Arc::ptr_eq(&self.inner, &andere.inner)
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.inner.endpoint
    }

    pub fn anzeigename(&self) -> Option<&str> {
        self.inner.anzeigename.as_deref()
    }

    pub fn benutzer_uri(&self) -> Option<&str> {
        self.inner.benutzer_uri.as_deref()
    }

    pub fn erstellt_um(&self) -> DateTime<Utc> {
        self.inner.erstellt_um
    }

    /// Zeit seit dem Anlegen im Roster
    pub fn dauer(&self) -> chrono::Duration {
        Utc::now() - self.inner.erstellt_um
    }

    pub fn zustand(&self) -> Verbindungszustand {
        self.inner.zustand.lock().zustand
    }

    /// Grund der Trennung, `None` solange der Teilnehmer nicht getrennt wurde
    pub fn trennungsgrund(&self) -> Option<Trennungsgrund> {
        self.inner.zustand.lock().trennungsgrund
    }

    pub fn ist_zerstoert(&self) -> bool {
        self.inner.zustand.lock().zerstoert
    }

    /// Konferenz der der Teilnehmer angehoert, `None` nach dem Loesen
    pub fn konferenz_id(&self) -> Option<KonferenzId> {
        let z = self.inner.zustand.lock();
        z.angehaengt.then_some(self.inner.konferenz_id)
    }

    /// Telefon des Host-Anrufs, solange der Host existiert
    pub fn telefon_id(&self) -> Option<TelefonId> {
        self.inner.host.upgrade().map(|host| host.telefon_id())
    }

    /// Konto unter dem der Teilnehmer veroeffentlicht wird
    pub fn konto_handle(&self) -> Option<KontoHandle> {
        self.telefon_id().map(|t| KontoHandle::fuer_telefon(&t))
    }
}

impl std::fmt::Debug for ParticipantConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticipantConnection")
            .field("endpoint", &self.inner.endpoint)
            .field("zustand", &self.zustand())
            .field("erstellt_um", &self.inner.erstellt_um)
            .finish()
    }
}

impl std::fmt::Display for ParticipantConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[Teilnehmer {} zustand={} seit={}]",
            self.inner.endpoint,
            self.zustand(),
            self.inner.erstellt_um.format("%H:%M:%S")
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
