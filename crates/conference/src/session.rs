//! Konferenz-Sitzung – Ein Mehrparteien-Anruf ueber eine Host-Verbindung
//!
//! Die `ConferenceSession` haelt die Host-Verbindung zur Konferenzbruecke
//! und den Roster aller Teilnehmer. Sie
//! - gleicht jedes Konferenz-Ereignispaket gegen den Roster ab,
//! - spiegelt den Host-Zustand in den Gesamtzustand,
//! - verteilt Nutzeraktionen (Halten, DTMF, Zusammenfuehren, Auflegen)
//!   an Host bzw. Telefon.
//!
//! ## Ereignisfluss
//! ```text
//! Signalisierung --HostEreignis--> ConferenceSession::ereignis_verarbeiten
//!                                      |
//!                                      +-- ZustandGeaendert    -> host_zustand_anwenden
//!                                      +-- Getrennt            -> getrennt_setzen
//!                                      +-- Zerstoert           -> host_zerstoert
//!                                      +-- TeilnehmerGeaendert -> teilnehmer_abgleichen
//!
//! ParticipantConnection --zerstoert--> RosterBeobachter -> Roster + Faehigkeiten
//! ConferenceSession --KonferenzEreignis (broadcast)--> Abonnenten
//! ```
//!
//! Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.

use callbridge_core::{
    Endpoint, Faehigkeiten, HostEreignis, KonferenzEreignis, KonferenzId, TeilnehmerSnapshot,
    Trennungsgrund, Verbindungszustand,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::config::KonferenzConfig;
use crate::error::KonferenzResult;
use crate::host::HostConnection;
use crate::participant::{ParticipantConnection, TeilnehmerBeobachter};
use crate::roster::{Einfuegung, Roster};
use crate::signaling::{AnrufRegister, ExterneVerbindung, SignalisierungsHandle};

// ---------------------------------------------------------------------------
// Abgleich-Ergebnis
// ---------------------------------------------------------------------------

/// Zusammenfassung eines Roster-Abgleichs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AbgleichErgebnis {
    /// Neu angelegte Teilnehmer
    pub hinzugefuegt: Vec<Endpoint>,
    /// Entfernte Teilnehmer
    pub entfernt: Vec<Endpoint>,
    /// Bestehende Teilnehmer, deren Zustand sich geaendert hat
    pub aktualisiert: usize,
}

impl AbgleichErgebnis {
    /// Hat sich die Roster-Mitgliedschaft geaendert?
    pub fn mitgliedschaft_geaendert(&self) -> bool {
        !self.hinzugefuegt.is_empty() || !self.entfernt.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ConferenceSession
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct GesamtZustand {
    zustand: Verbindungszustand,
    trennungsgrund: Option<Trennungsgrund>,
}

/// Eine Konferenz mit ihrem Host und ihren Teilnehmern
#[derive(Clone)]
pub struct ConferenceSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    id: KonferenzId,
    /// Exklusiv im Besitz der Konferenz
    host: HostConnection,
    register: Arc<dyn AnrufRegister>,
    config: KonferenzConfig,
    roster: Roster,
    gesamt: Mutex<GesamtZustand>,
    /// Wird nur unter diesem Lock neu berechnet (siehe `verwalten_aktualisieren`)
    faehigkeiten: Mutex<Faehigkeiten>,
    zerstoert: AtomicBool,
    ereignis_tx: broadcast::Sender<KonferenzEreignis>,
}

/// Leitet Teilnehmer-Callbacks an die Konferenz weiter, ohne sie am Leben zu halten
struct RosterBeobachter {
    session: Weak<SessionInner>,
}

impl TeilnehmerBeobachter for RosterBeobachter {
    fn teilnehmer_zerstoert(&self, teilnehmer: &ParticipantConnection) {
        if let Some(inner) = self.session.upgrade() {
            ConferenceSession { inner }.teilnehmer_zerstoert(teilnehmer);
        }
    }
}

impl ConferenceSession {
    /// Befoerdert eine Signalisierungsverbindung zur Konferenz
    pub fn neu(
        id: KonferenzId,
        handle: Arc<dyn SignalisierungsHandle>,
        register: Arc<dyn AnrufRegister>,
        config: KonferenzConfig,
    ) -> KonferenzResult<Self> {
        config.validieren()?;
        let (ereignis_tx, _) = broadcast::channel(config.ereignis_kanal_groesse);
        let host = HostConnection::neu(handle);

        tracing::info!(konferenz = %id, host = %host.bezeichnung(), "Konferenz angelegt");

        Ok(Self {
            inner: Arc::new(SessionInner {
                id,
                host,
                register,
                config,
                roster: Roster::neu(),
                gesamt: Mutex::new(GesamtZustand {
                    zustand: Verbindungszustand::Neu,
                    trennungsgrund: None,
                }),
                faehigkeiten: Mutex::new(Faehigkeiten::konferenz_start()),
                zerstoert: AtomicBool::new(false),
                ereignis_tx,
            }),
        })
    }

    // -----------------------------------------------------------------------
    // Host-Ereignisse
    // -----------------------------------------------------------------------

    /// Verarbeitet ein einzelnes Ereignis der Host-Verbindung
    pub fn ereignis_verarbeiten(&self, ereignis: HostEreignis) {
        if self.ist_zerstoert() {
            tracing::debug!(
                konferenz = %self.inner.id,
                ereignis = ereignis.name(),
                "Ereignis nach Abbau ignoriert"
            );
            return;
        }

        match ereignis {
            HostEreignis::ZustandGeaendert { code } => match Verbindungszustand::try_from(code) {
                Ok(zustand) => {
                    self.inner.host.zustand_merken(zustand);
                    self.host_zustand_anwenden(zustand);
                }
                Err(e) => {
                    tracing::warn!(
                        konferenz = %self.inner.id,
                        code,
                        fehler = %e,
                        "Ungueltiger Host-Zustand verworfen"
                    );
                }
            },
            HostEreignis::Getrennt { grund } => {
                self.getrennt_setzen(grund.into());
            }
            HostEreignis::Zerstoert => {
                self.host_zerstoert();
            }
            HostEreignis::TeilnehmerGeaendert { teilnehmer } => {
                tracing::debug!(
                    konferenz = %self.inner.id,
                    anzahl = teilnehmer.len(),
                    "Konferenz-Ereignispaket empfangen"
                );
                self.teilnehmer_abgleichen(&teilnehmer);
            }
        }
    }

    /// Verarbeitet Host-Ereignisse aus einer Queue in einem eigenen Task
    ///
    /// Endet wenn die Queue geschlossen oder die Konferenz abgebaut wird.
    pub fn ereignisse_empfangen(&self, mut rx: mpsc::Receiver<HostEreignis>) -> JoinHandle<()> {
        let session = self.clone();
        tokio::spawn(async move {
            while let Some(ereignis) = rx.recv().await {
                session.ereignis_verarbeiten(ereignis);
                if session.ist_zerstoert() {
                    break;
                }
            }
            tracing::debug!(konferenz = %session.inner.id, "Host-Ereignisschleife beendet");
        })
    }

    /// Oeffnet eine Host-Ereignis-Queue und startet den Empfangs-Task
    pub fn ereignis_kanal_oeffnen(&self) -> (mpsc::Sender<HostEreignis>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(self.inner.config.host_kanal_groesse);
        let task = self.ereignisse_empfangen(rx);
        (tx, task)
    }

    /// Spiegelt den Host-Zustand in den Gesamtzustand
    pub fn host_zustand_anwenden(&self, zustand: Verbindungszustand) {
        tracing::debug!(konferenz = %self.inner.id, zustand = %zustand, "Host-Zustand");

        match zustand {
            Verbindungszustand::Initialisierung
            | Verbindungszustand::Neu
            | Verbindungszustand::Klingelt
            | Verbindungszustand::Waehlt => {
                // Fuer die Konferenz ohne Bedeutung
            }
            Verbindungszustand::Getrennt => {
                let grund = Trennungsgrund::from(self.inner.host.trennungsgrund());
                self.getrennt_setzen(grund);
                self.zerstoeren();
            }
            Verbindungszustand::Aktiv => self.zustand_setzen(Verbindungszustand::Aktiv),
            Verbindungszustand::Gehalten => self.zustand_setzen(Verbindungszustand::Gehalten),
        }
    }

    // -----------------------------------------------------------------------
    // Roster-Abgleich
    // -----------------------------------------------------------------------

    /// Gleicht eine vollstaendige Teilnehmerliste gegen den Roster ab
    ///
    /// 1. Unbekannte Endpunkte werden im Startzustand angelegt, bekannte
    ///    bekommen ihren gemeldeten Zustand.
    /// 2. Neue Teilnehmer bekommen ihren Zustand erst, wenn die ganze Liste
    ///    verarbeitet ist. Mehrfach gemeldete Endpunkte zaehlen als
    ///    Aktualisierung, der letzte Eintrag gewinnt.
    /// 3. Nicht mehr gemeldete Teilnehmer werden geloest, mit
    ///    `Abgebrochen` getrennt und zerstoert.
    /// 4. Bei geaenderter Mitgliedschaft wird `KONFERENZ_VERWALTEN` neu berechnet.
    pub fn teilnehmer_abgleichen(&self, snapshot: &[TeilnehmerSnapshot]) -> AbgleichErgebnis {
        let mut ergebnis = AbgleichErgebnis::default();
        if self.ist_zerstoert() {
            tracing::debug!(konferenz = %self.inner.id, "Abgleich nach Abbau ignoriert");
            return ergebnis;
        }

        let mut gemeldet: HashSet<Endpoint> = HashSet::with_capacity(snapshot.len());
        let mut neue: Vec<ParticipantConnection> = Vec::new();
        let mut ausstehend: HashMap<Endpoint, Verbindungszustand> = HashMap::new();

        for eintrag in snapshot {
            // Abbau waehrend des Abgleichs: keine weiteren Teilnehmer anlegen
            if self.ist_zerstoert() {
                break;
            }
            gemeldet.insert(eintrag.endpoint.clone());

            if let Some(zustand) = ausstehend.get_mut(&eintrag.endpoint) {
                *zustand = eintrag.zustand;
                continue;
            }

            let einfuegung = self
                .inner
                .roster
                .einfuegen_falls_fehlend(&eintrag.endpoint, || self.teilnehmer_erzeugen(eintrag));

            match einfuegung {
                Einfuegung::Neu(teilnehmer) => {
                    self.teilnehmer_veroeffentlichen(&teilnehmer);
                    ausstehend.insert(eintrag.endpoint.clone(), eintrag.zustand);
                    ergebnis.hinzugefuegt.push(eintrag.endpoint.clone());
                    neue.push(teilnehmer);
                }
                Einfuegung::Vorhanden(teilnehmer) => {
                    if teilnehmer.zustand_aktualisieren(eintrag.zustand) {
                        ergebnis.aktualisiert += 1;
                    }
                }
            }
        }

        // Neue Teilnehmer gemeinsam in ihren gemeldeten Zustand bringen
        for teilnehmer in &neue {
            if let Some(zustand) = ausstehend.get(teilnehmer.endpoint()) {
                teilnehmer.zustand_aktualisieren(*zustand);
            }
        }

        // Der Abbau setzt das Flag vor dem Leeren des Rosters. Was hier nach
        // dem Flag noch im Roster steht, wurde nach dem Leeren eingefuegt.
        if self.ist_zerstoert() {
            ergebnis.entfernt.extend(self.teilnehmer_alle_trennen());
            tracing::debug!(
                konferenz = %self.inner.id,
                hinzugefuegt = ergebnis.hinzugefuegt.len(),
                entfernt = ergebnis.entfernt.len(),
                "Abgleich durch Abbau beendet"
            );
            return ergebnis;
        }

        for teilnehmer in self.inner.roster.fehlende_entfernen(&gemeldet) {
            ergebnis.entfernt.push(teilnehmer.endpoint().clone());
            self.teilnehmer_abbauen(&teilnehmer);
        }

        if ergebnis.mitgliedschaft_geaendert() {
            self.verwalten_aktualisieren();
        }

        tracing::debug!(
            konferenz = %self.inner.id,
            hinzugefuegt = ergebnis.hinzugefuegt.len(),
            entfernt = ergebnis.entfernt.len(),
            aktualisiert = ergebnis.aktualisiert,
            teilnehmer = self.inner.roster.anzahl(),
            "Roster abgeglichen"
        );
        ergebnis
    }

    // -----------------------------------------------------------------------
    // Nutzeraktionen
    // -----------------------------------------------------------------------

    /// Legt die Konferenz ueber den Host auf
    ///
    /// Der Gesamtzustand bleibt unveraendert, bis der Host die Trennung meldet.
    pub fn auflegen(&self) -> bool {
        tracing::info!(konferenz = %self.inner.id, "Konferenz wird aufgelegt");
        self.inner.host.auflegen()
    }

    /// Einzelne Teilnehmer lassen sich nicht abspalten
    ///
    /// Aufrufer duerfen das nie anfordern; der Aufruf wird nur als Defekt
    /// protokolliert und aendert nichts.
    pub fn abspalten(&self, endpoint: &Endpoint) {
        tracing::error!(
            konferenz = %self.inner.id,
            endpoint = %endpoint,
            defekt = true,
            "Abspalten von Teilnehmern wird nicht unterstuetzt"
        );
    }

    /// Fuehrt eine weitere Verbindung ueber ihr Telefon in die Konferenz
    pub fn zusammenfuehren(&self, verbindung: &dyn ExterneVerbindung) -> bool {
        let Some(telefon) = verbindung.telefon() else {
            tracing::warn!(
                konferenz = %self.inner.id,
                verbindung = %verbindung.bezeichnung(),
                "Zusammenfuehren ohne Telefon nicht moeglich"
            );
            return false;
        };

        match telefon.konferenz() {
            Ok(()) => {
                tracing::info!(
                    konferenz = %self.inner.id,
                    verbindung = %verbindung.bezeichnung(),
                    telefon = %telefon.telefon_id(),
                    "Zusammenfuehren angefordert"
                );
                true
            }
            Err(e) => {
                tracing::error!(
                    konferenz = %self.inner.id,
                    verbindung = %verbindung.bezeichnung(),
                    fehler = %e,
                    "Zusammenfuehren fehlgeschlagen"
                );
                false
            }
        }
    }

    pub fn halten(&self) -> bool {
        self.inner.host.halten()
    }

    pub fn fortsetzen(&self) -> bool {
        self.inner.host.fortsetzen()
    }

    pub fn dtmf_abspielen(&self, ton: char) -> bool {
        self.inner.host.dtmf_abspielen(ton)
    }

    pub fn dtmf_stoppen(&self) -> bool {
        self.inner.host.dtmf_stoppen()
    }

    /// Von aussen angebotene Verbindungen werden nicht uebernommen
    pub fn verbindung_hinzugefuegt(&self, verbindung: &dyn ExterneVerbindung) {
        tracing::trace!(
            konferenz = %self.inner.id,
            verbindung = %verbindung.bezeichnung(),
            "Externe Verbindung ignoriert"
        );
    }

    /// Kein einzelner Teilnehmer repraesentiert die ganze Konferenz
    pub fn primaere_verbindung(&self) -> Option<ParticipantConnection> {
        None
    }

    // -----------------------------------------------------------------------
    // Abfragen
    // -----------------------------------------------------------------------

    pub fn id(&self) -> KonferenzId {
        self.inner.id
    }

    pub fn host(&self) -> &HostConnection {
        &self.inner.host
    }

    pub fn zustand(&self) -> Verbindungszustand {
        self.inner.gesamt.lock().zustand
    }

    pub fn trennungsgrund(&self) -> Option<Trennungsgrund> {
        self.inner.gesamt.lock().trennungsgrund
    }

    pub fn faehigkeiten(&self) -> Faehigkeiten {
        *self.inner.faehigkeiten.lock()
    }

    pub fn teilnehmer(&self, endpoint: &Endpoint) -> Option<ParticipantConnection> {
        self.inner.roster.holen(endpoint)
    }

    pub fn alle_teilnehmer(&self) -> Vec<ParticipantConnection> {
        self.inner.roster.alle()
    }

    pub fn endpunkte(&self) -> Vec<Endpoint> {
        self.inner.roster.endpunkte()
    }

    pub fn teilnehmer_anzahl(&self) -> usize {
        self.inner.roster.anzahl()
    }

    pub fn ist_zerstoert(&self) -> bool {
        self.inner.zerstoert.load(Ordering::SeqCst)
    }

    /// Abonniert Konferenz-Ereignisse
    pub fn ereignisse_abonnieren(&self) -> broadcast::Receiver<KonferenzEreignis> {
        self.inner.ereignis_tx.subscribe()
    }

    // -----------------------------------------------------------------------
    // Interne Hilfsmethoden
    // -----------------------------------------------------------------------

    fn teilnehmer_erzeugen(&self, snapshot: &TeilnehmerSnapshot) -> ParticipantConnection {
        let beobachter: Arc<dyn TeilnehmerBeobachter> = Arc::new(RosterBeobachter {
            session: Arc::downgrade(&self.inner),
        });
        ParticipantConnection::neu(
            snapshot,
            self.inner.config.initialer_teilnehmer_zustand,
            self.inner.id,
            self.inner.host.schwaches_handle(),
            beobachter,
            self.inner.ereignis_tx.clone(),
        )
    }

    /// Meldet einen neuen Teilnehmer bei der Anrufverwaltung an
    fn teilnehmer_veroeffentlichen(&self, teilnehmer: &ParticipantConnection) {
        let konto = self
            .inner
            .register
            .konto_handle_erstellen(&self.inner.host.telefon_id());
        self.inner
            .register
            .bestehende_verbindung_hinzufuegen(&konto, teilnehmer);

        tracing::info!(
            konferenz = %self.inner.id,
            endpoint = %teilnehmer.endpoint(),
            konto = %konto,
            "Teilnehmer hinzugefuegt"
        );
        let _ = self
            .inner
            .ereignis_tx
            .send(KonferenzEreignis::TeilnehmerHinzugefuegt {
                konferenz_id: self.inner.id,
                endpoint: teilnehmer.endpoint().clone(),
            });
    }

    /// Baut einen bereits aus dem Roster entfernten Teilnehmer ab
    fn teilnehmer_abbauen(&self, teilnehmer: &ParticipantConnection) {
        teilnehmer.beobachter_trennen();
        teilnehmer.konferenz_loesen();
        // Roster-Umbau, nicht in der Anrufliste protokollieren
        teilnehmer.trennen(Trennungsgrund::Abgebrochen);
        teilnehmer.zerstoeren();

        tracing::info!(
            konferenz = %self.inner.id,
            endpoint = %teilnehmer.endpoint(),
            dauer_ms = teilnehmer.dauer().num_milliseconds(),
            "Teilnehmer entfernt"
        );
    }

    /// Callback eines Teilnehmers, der von aussen zerstoert wurde
    fn teilnehmer_zerstoert(&self, teilnehmer: &ParticipantConnection) {
        if self.inner.roster.entfernen_wenn(teilnehmer) {
            teilnehmer.konferenz_loesen();
            tracing::info!(
                konferenz = %self.inner.id,
                endpoint = %teilnehmer.endpoint(),
                "Zerstoerter Teilnehmer entfernt"
            );
            self.verwalten_aktualisieren();
        }
    }

    /// Trennt und zerstoert alle verbliebenen Teilnehmer
    ///
    /// Die Faehigkeit wird immer neu berechnet, auch bei leerem Roster: ein
    /// paralleler Abgleich kann sie gesetzt haben, nachdem ein anderer
    /// Aufruf bereits geleert hat.
    fn teilnehmer_alle_trennen(&self) -> Vec<Endpoint> {
        let alle = self.inner.roster.leeren();
        if !alle.is_empty() {
            tracing::info!(konferenz = %self.inner.id, anzahl = alle.len(), "Alle Teilnehmer werden getrennt");
        }
        for teilnehmer in &alle {
            self.teilnehmer_abbauen(teilnehmer);
        }
        self.verwalten_aktualisieren();
        alle.iter().map(|t| t.endpoint().clone()).collect()
    }

    /// Setzt `KONFERENZ_VERWALTEN` genau dann, wenn der Roster nicht leer ist
    ///
    /// Der Roster wird unter dem Faehigkeiten-Lock gelesen; die zuletzt
    /// laufende Neuberechnung sieht damit den zuletzt geschriebenen Roster.
    fn verwalten_aktualisieren(&self) {
        let mut faehigkeiten = self.inner.faehigkeiten.lock();
        let konnte = faehigkeiten.kann(Faehigkeiten::KONFERENZ_VERWALTEN);
        let kann = !self.inner.roster.ist_leer();

        tracing::debug!(
            konferenz = %self.inner.id,
            war = if konnte { "J" } else { "N" },
            ist = if kann { "J" } else { "N" },
            "Konferenz-Verwaltung"
        );

        if konnte != kann {
            *faehigkeiten = faehigkeiten.gesetzt(Faehigkeiten::KONFERENZ_VERWALTEN, kann);
            let _ = self
                .inner
                .ereignis_tx
                .send(KonferenzEreignis::FaehigkeitenGeaendert {
                    konferenz_id: self.inner.id,
                    faehigkeiten: *faehigkeiten,
                });
        }
    }

    fn zustand_setzen(&self, neu: Verbindungszustand) {
        let alt = {
            let mut gesamt = self.inner.gesamt.lock();
            if gesamt.zustand == neu {
                return;
            }
            let alt = gesamt.zustand;
            gesamt.zustand = neu;
            alt
        };

        tracing::info!(konferenz = %self.inner.id, alt = %alt, neu = %neu, "Konferenz-Zustand");
        let _ = self.inner.ereignis_tx.send(KonferenzEreignis::ZustandGeaendert {
            konferenz_id: self.inner.id,
            alt,
            neu,
        });
    }

    fn getrennt_setzen(&self, grund: Trennungsgrund) {
        {
            let mut gesamt = self.inner.gesamt.lock();
            if gesamt.trennungsgrund.is_some() {
                return;
            }
            gesamt.trennungsgrund = Some(grund);
        }
        tracing::info!(konferenz = %self.inner.id, grund = %grund, "Konferenz getrennt");
        self.zustand_setzen(Verbindungszustand::Getrennt);
    }

    /// Die Host-Verbindung wurde zerstoert
    fn host_zerstoert(&self) {
        tracing::info!(konferenz = %self.inner.id, "Host-Verbindung zerstoert");
        self.zerstoeren();
    }

    /// Baut die Konferenz ab: erst alle Teilnehmer, dann den Host
    ///
    /// Das Flag wird vor dem Leeren des Rosters gesetzt; ein laufender
    /// Abgleich prueft es nach seinen Einfuegungen und raeumt selbst auf.
    fn zerstoeren(&self) {
        if self.inner.zerstoert.swap(true, Ordering::SeqCst) {
            return;
        }

        let _ = self.teilnehmer_alle_trennen();
        self.inner.host.freigeben();

        tracing::info!(konferenz = %self.inner.id, "Konferenz abgebaut");
        let _ = self
            .inner
            .ereignis_tx
            .send(KonferenzEreignis::KonferenzZerstoert {
                konferenz_id: self.inner.id,
            });
    }
}

impl std::fmt::Display for ConferenceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[Konferenz {} zustand={} host={} teilnehmer={}]",
            self.inner.id,
            self.zustand(),
            self.inner.host,
            self.inner.roster.anzahl()
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
