//! Gemeinsame Test-Hilfen: aufzeichnende Signalisierung, Register und Telefon

#![allow(dead_code)]

use callbridge_conference::{
    AnrufRegister, ConferenceSession, ExterneVerbindung, KonferenzConfig, ParticipantConnection,
    SignalisierungsFehler, SignalisierungsHandle, Telefon,
};
use callbridge_core::{
    Endpoint, HostEreignis, KonferenzEreignis, KonferenzId, KontoHandle, SignalisierungsGrund,
    TeilnehmerSnapshot, TelefonId, Verbindungszustand,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Signalisierung
// ---------------------------------------------------------------------------

/// Zeichnet alle Aufrufe auf; Fehler lassen sich pro Test einschalten
pub struct AufzeichnenderHost {
    pub aufrufe: Mutex<Vec<String>>,
    pub kaputt: AtomicBool,
    pub ohne_anruf: AtomicBool,
    pub grund: Mutex<SignalisierungsGrund>,
}

impl AufzeichnenderHost {
    pub fn neu() -> Arc<Self> {
        Arc::new(Self {
            aufrufe: Mutex::new(Vec::new()),
            kaputt: AtomicBool::new(false),
            ohne_anruf: AtomicBool::new(false),
            grund: Mutex::new(SignalisierungsGrund::Normal),
        })
    }

    pub fn aufrufe(&self) -> Vec<String> {
        self.aufrufe.lock().clone()
    }

    fn aufzeichnen(&self, aufruf: impl Into<String>) -> Result<(), SignalisierungsFehler> {
        self.aufrufe.lock().push(aufruf.into());
        if self.kaputt.load(Ordering::SeqCst) {
            Err(SignalisierungsFehler::Zustand("Anruf im falschen Zustand".into()))
        } else {
            Ok(())
        }
    }
}

impl SignalisierungsHandle for AufzeichnenderHost {
    fn bezeichnung(&self) -> String {
        "bruecke-test".into()
    }
    fn telefon_id(&self) -> TelefonId {
        TelefonId(2)
    }
    fn hat_anruf(&self) -> bool {
        !self.ohne_anruf.load(Ordering::SeqCst)
    }
    fn trennungsgrund(&self) -> SignalisierungsGrund {
        *self.grund.lock()
    }
    fn auflegen(&self) -> Result<(), SignalisierungsFehler> {
        self.aufzeichnen("auflegen")
    }
    fn halten(&self) -> Result<(), SignalisierungsFehler> {
        self.aufzeichnen("halten")
    }
    fn fortsetzen(&self) -> Result<(), SignalisierungsFehler> {
        self.aufzeichnen("fortsetzen")
    }
    fn dtmf_abspielen(&self, ton: char) -> Result<(), SignalisierungsFehler> {
        self.aufzeichnen(format!("dtmf:{ton}"))
    }
    fn dtmf_stoppen(&self) -> Result<(), SignalisierungsFehler> {
        self.aufzeichnen("dtmf_stopp")
    }
}

// ---------------------------------------------------------------------------
// Anrufverwaltung
// ---------------------------------------------------------------------------

/// Merkt sich jede Veroeffentlichung
#[derive(Default)]
pub struct AufzeichnendesRegister {
    pub veroeffentlicht: Mutex<Vec<(KontoHandle, Endpoint)>>,
}

impl AufzeichnendesRegister {
    pub fn endpunkte(&self) -> Vec<Endpoint> {
        self.veroeffentlicht
            .lock()
            .iter()
            .map(|(_, e)| e.clone())
            .collect()
    }
}

impl AnrufRegister for AufzeichnendesRegister {
    fn bestehende_verbindung_hinzufuegen(
        &self,
        konto: &KontoHandle,
        teilnehmer: &ParticipantConnection,
    ) {
        self.veroeffentlicht
            .lock()
            .push((konto.clone(), teilnehmer.endpoint().clone()));
    }
}

/// Stellt bei der ersten Veroeffentlichung ein Host-Ereignis an die Konferenz zu
///
/// Bildet einen Abbau nach, der mitten in einen laufenden Abgleich faellt.
pub struct AbbauendesRegister {
    pub session: Mutex<Option<ConferenceSession>>,
    pub ereignis: Mutex<Option<HostEreignis>>,
    pub veroeffentlicht: Mutex<Vec<ParticipantConnection>>,
}

impl AbbauendesRegister {
    pub fn neu(ereignis: HostEreignis) -> Arc<Self> {
        Arc::new(Self {
            session: Mutex::new(None),
            ereignis: Mutex::new(Some(ereignis)),
            veroeffentlicht: Mutex::new(Vec::new()),
        })
    }

    pub fn teilnehmer(&self) -> Vec<ParticipantConnection> {
        self.veroeffentlicht.lock().clone()
    }
}

impl AnrufRegister for AbbauendesRegister {
    fn bestehende_verbindung_hinzufuegen(
        &self,
        _konto: &KontoHandle,
        teilnehmer: &ParticipantConnection,
    ) {
        self.veroeffentlicht.lock().push(teilnehmer.clone());

        let session = self.session.lock().take();
        let ereignis = self.ereignis.lock().take();
        if let (Some(session), Some(ereignis)) = (session, ereignis) {
            session.ereignis_verarbeiten(ereignis);
        }
    }
}

/// Konferenz deren Register beim ersten Teilnehmer `ereignis` zustellt
pub fn aufbau_mit_abbau(
    ereignis: HostEreignis,
) -> (ConferenceSession, Arc<AbbauendesRegister>) {
    let register = AbbauendesRegister::neu(ereignis);
    let session = ConferenceSession::neu(
        KonferenzId::new(),
        AufzeichnenderHost::neu(),
        register.clone(),
        KonferenzConfig::default(),
    )
    .unwrap();
    *register.session.lock() = Some(session.clone());
    (session, register)
}

// ---------------------------------------------------------------------------
// Telefon / externe Verbindung
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct TestTelefon {
    pub konferenz_aufrufe: AtomicUsize,
    pub kaputt: AtomicBool,
}

impl Telefon for TestTelefon {
    fn telefon_id(&self) -> TelefonId {
        TelefonId(2)
    }
    fn konferenz(&self) -> Result<(), SignalisierungsFehler> {
        self.konferenz_aufrufe.fetch_add(1, Ordering::SeqCst);
        if self.kaputt.load(Ordering::SeqCst) {
            Err(SignalisierungsFehler::Zustand("kein zweiter Anruf".into()))
        } else {
            Ok(())
        }
    }
}

pub struct TestVerbindung {
    pub telefon: Option<Arc<TestTelefon>>,
}

impl ExterneVerbindung for TestVerbindung {
    fn bezeichnung(&self) -> String {
        "zweitanruf".into()
    }
    fn telefon(&self) -> Option<Arc<dyn Telefon>> {
        self.telefon
            .as_ref()
            .map(|t| Arc::clone(t) as Arc<dyn Telefon>)
    }
}

// ---------------------------------------------------------------------------
// Aufbau
// ---------------------------------------------------------------------------

pub struct Aufbau {
    pub session: ConferenceSession,
    pub host: Arc<AufzeichnenderHost>,
    pub register: Arc<AufzeichnendesRegister>,
    pub ereignisse: broadcast::Receiver<KonferenzEreignis>,
}

pub fn aufbau() -> Aufbau {
    let host = AufzeichnenderHost::neu();
    let register = Arc::new(AufzeichnendesRegister::default());
    let session = ConferenceSession::neu(
        KonferenzId::new(),
        host.clone(),
        register.clone(),
        KonferenzConfig::default(),
    )
    .unwrap();
    let ereignisse = session.ereignisse_abonnieren();
    Aufbau {
        session,
        host,
        register,
        ereignisse,
    }
}

pub fn ep(name: &str) -> Endpoint {
    Endpoint::neu(format!("sip:{name}@bruecke")).unwrap()
}

pub fn snap(name: &str, zustand: Verbindungszustand) -> TeilnehmerSnapshot {
    TeilnehmerSnapshot::neu(ep(name), zustand)
}

/// Sortierte Endpunkte des Rosters
pub fn roster(session: &ConferenceSession) -> Vec<Endpoint> {
    let mut endpunkte = session.endpunkte();
    endpunkte.sort_by(|a, b| a.als_str().cmp(b.als_str()));
    endpunkte
}

/// Sortierte Endpunkte aus Namen
pub fn erwartet(namen: &[&str]) -> Vec<Endpoint> {
    let mut endpunkte: Vec<Endpoint> = namen.iter().map(|n| ep(n)).collect();
    endpunkte.sort_by(|a, b| a.als_str().cmp(b.als_str()));
    endpunkte
}

/// Alle bisher gesendeten Ereignisse ohne zu warten
pub fn ereignisse_leeren(rx: &mut broadcast::Receiver<KonferenzEreignis>) -> Vec<KonferenzEreignis> {
    let mut alle = Vec::new();
    while let Ok(e) = rx.try_recv() {
        alle.push(e);
    }
    alle
}

pub fn verwalten(session: &ConferenceSession) -> bool {
    session
        .faehigkeiten()
        .kann(callbridge_core::Faehigkeiten::KONFERENZ_VERWALTEN)
}
