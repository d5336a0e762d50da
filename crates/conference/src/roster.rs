//! Roster – Nebenlaeufige Teilnehmer-Tabelle einer Konferenz
//!
//! Funkereignisse und Zugriffe der Anrufverwaltung koennen gleichzeitig
//! eintreffen. Jede Einzeloperation (einfuegen-falls-fehlend, entfernen,
//! Snapshot-Iteration) ist fuer sich atomar; ein kompletter Abgleich ist
//! es nicht.
//!
//! Thread-safe durch DashMap (sharded, per-Entry-Lock).

use callbridge_core::Endpoint;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashSet;

use crate::participant::ParticipantConnection;

/// Ergebnis von [`Roster::einfuegen_falls_fehlend`]
#[derive(Debug, Clone)]
pub enum Einfuegung {
    /// Teilnehmer wurde neu angelegt
    Neu(ParticipantConnection),
    /// Endpunkt war bereits im Roster
    Vorhanden(ParticipantConnection),
}

/// Teilnehmer einer Konferenz, indiziert nach Endpunkt
#[derive(Default)]
pub struct Roster {
    eintraege: DashMap<Endpoint, ParticipantConnection>,
}

impl Roster {
    /// Erstellt einen leeren Roster
    pub fn neu() -> Self {
        Self::default()
    }

    /// Legt einen Teilnehmer an, falls der Endpunkt noch fehlt
    ///
    /// `erzeugen` laeuft unter dem Shard-Lock und darf nicht auf den
    /// Roster zugreifen.
    pub fn einfuegen_falls_fehlend<F>(&self, endpoint: &Endpoint, erzeugen: F) -> Einfuegung
    where
        F: FnOnce() -> ParticipantConnection,
    {
        match self.eintraege.entry(endpoint.clone()) {
            Entry::Occupied(eintrag) => Einfuegung::Vorhanden(eintrag.get().clone()),
            Entry::Vacant(frei) => {
                let teilnehmer = erzeugen();
                frei.insert(teilnehmer.clone());
                Einfuegung::Neu(teilnehmer)
            }
        }
    }

    pub fn holen(&self, endpoint: &Endpoint) -> Option<ParticipantConnection> {
        self.eintraege.get(endpoint).map(|e| e.value().clone())
    }

    pub fn entfernen(&self, endpoint: &Endpoint) -> Option<ParticipantConnection> {
        self.eintraege.remove(endpoint).map(|(_, t)| t)
    }

    /// Entfernt den Eintrag nur, wenn er noch genau diesen Teilnehmer haelt
    ///
    /// Schuetzt einen inzwischen neu angelegten Teilnehmer mit gleichem
    /// Endpunkt vor versehentlichem Entfernen.
    pub fn entfernen_wenn(&self, teilnehmer: &ParticipantConnection) -> bool {
        self.eintraege
            .remove_if(teilnehmer.endpoint(), |_, t| t.ist_selbe(teilnehmer))
            .is_some()
    }

    /// Entfernt alle Eintraege, deren Endpunkt nicht in `behalten` liegt
    pub fn fehlende_entfernen(&self, behalten: &HashSet<Endpoint>) -> Vec<ParticipantConnection> {
        // Erst Schluessel sammeln, dann einzeln entfernen (kein Remove waehrend Iteration)
        let veraltet: Vec<Endpoint> = self
            .eintraege
            .iter()
            .filter(|e| !behalten.contains(e.key()))
            .map(|e| e.key().clone())
            .collect();

        veraltet
            .iter()
            .filter_map(|endpoint| self.entfernen(endpoint))
            .collect()
    }

    /// Leert den Roster und gibt alle entfernten Teilnehmer zurueck
    pub fn leeren(&self) -> Vec<ParticipantConnection> {
        let endpunkte = self.endpunkte();
        endpunkte
            .iter()
            .filter_map(|endpoint| self.entfernen(endpoint))
            .collect()
    }

    pub fn endpunkte(&self) -> Vec<Endpoint> {
        self.eintraege.iter().map(|e| e.key().clone()).collect()
    }

    pub fn alle(&self) -> Vec<ParticipantConnection> {
        self.eintraege.iter().map(|e| e.value().clone()).collect()
    }

    pub fn anzahl(&self) -> usize {
        self.eintraege.len()
    }

    pub fn ist_leer(&self) -> bool {
        self.eintraege.is_empty()
    }

    pub fn enthaelt(&self, endpoint: &Endpoint) -> bool {
        self.eintraege.contains_key(endpoint)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SignalisierungsFehler;
    use crate::participant::TeilnehmerBeobachter;
    use crate::signaling::SignalisierungsHandle;
    use callbridge_core::{
        KonferenzId, SignalisierungsGrund, TeilnehmerSnapshot, TelefonId, Verbindungszustand,
    };
    use std::sync::{Arc, Weak};
    use tokio::sync::broadcast;

    struct OhneHost;

    impl SignalisierungsHandle for OhneHost {
        fn bezeichnung(&self) -> String {
            String::new()
        }
        fn telefon_id(&self) -> TelefonId {
            TelefonId(0)
        }
        fn trennungsgrund(&self) -> SignalisierungsGrund {
            SignalisierungsGrund::Unbekannt
        }
        fn auflegen(&self) -> Result<(), SignalisierungsFehler> {
            Ok(())
        }
        fn halten(&self) -> Result<(), SignalisierungsFehler> {
            Ok(())
        }
        fn fortsetzen(&self) -> Result<(), SignalisierungsFehler> {
            Ok(())
        }
        fn dtmf_abspielen(&self, _ton: char) -> Result<(), SignalisierungsFehler> {
            Ok(())
        }
        fn dtmf_stoppen(&self) -> Result<(), SignalisierungsFehler> {
            Ok(())
        }
    }

    struct Stumm;

    impl TeilnehmerBeobachter for Stumm {
        fn teilnehmer_zerstoert(&self, _teilnehmer: &ParticipantConnection) {}
    }

    fn ep(name: &str) -> Endpoint {
        Endpoint::neu(format!("sip:{name}@bruecke")).unwrap()
    }

    fn teilnehmer(endpoint: &Endpoint) -> ParticipantConnection {
        let (tx, _) = broadcast::channel(4);
        let host: Weak<dyn SignalisierungsHandle> = Weak::<OhneHost>::new();
        ParticipantConnection::neu(
            &TeilnehmerSnapshot::neu(endpoint.clone(), Verbindungszustand::Aktiv),
            Verbindungszustand::Gehalten,
            KonferenzId::new(),
            host,
            Arc::new(Stumm),
            tx,
        )
    }

    #[test]
    fn einfuegen_nur_einmal() {
        let roster = Roster::neu();
        let a = ep("a");

        let erste = roster.einfuegen_falls_fehlend(&a, || teilnehmer(&a));
        let zweite = roster.einfuegen_falls_fehlend(&a, || teilnehmer(&a));

        let Einfuegung::Neu(t1) = erste else {
            panic!("Erster Aufruf muss anlegen");
        };
        let Einfuegung::Vorhanden(t2) = zweite else {
            panic!("Zweiter Aufruf darf nicht anlegen");
        };
        assert!(t1.ist_selbe(&t2));
        assert_eq!(roster.anzahl(), 1);
    }

    #[test]
    fn fehlende_werden_entfernt() {
        let roster = Roster::neu();
        for name in ["a", "b", "c"] {
            let e = ep(name);
            roster.einfuegen_falls_fehlend(&e, || teilnehmer(&e));
        }

        let behalten: HashSet<Endpoint> = [ep("b")].into_iter().collect();
        let entfernt = roster.fehlende_entfernen(&behalten);

        assert_eq!(entfernt.len(), 2);
        assert_eq!(roster.endpunkte(), vec![ep("b")]);
    }

    #[test]
    fn entfernen_wenn_prueft_identitaet() {
        let roster = Roster::neu();
        let a = ep("a");
        let alt = teilnehmer(&a);
        let neu = teilnehmer(&a);
        roster.einfuegen_falls_fehlend(&a, || neu.clone());

        assert!(!roster.entfernen_wenn(&alt));
        assert!(roster.enthaelt(&a));
        assert!(roster.entfernen_wenn(&neu));
        assert!(roster.ist_leer());
    }

    #[test]
    fn leeren_gibt_alle_zurueck() {
        let roster = Roster::neu();
        for name in ["a", "b"] {
            let e = ep(name);
            roster.einfuegen_falls_fehlend(&e, || teilnehmer(&e));
        }

        assert_eq!(roster.leeren().len(), 2);
        assert!(roster.ist_leer());
    }

    #[test]
    fn paralleles_einfuegen_legt_einmal_an() {
        let roster = Arc::new(Roster::neu());
        let a = ep("a");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let roster = Arc::clone(&roster);
                let a = a.clone();
                std::thread::spawn(move || {
                    matches!(
                        roster.einfuegen_falls_fehlend(&a, || teilnehmer(&a)),
                        Einfuegung::Neu(_)
                    )
                })
            })
            .collect();

        let angelegt = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|neu| *neu)
            .count();
        assert_eq!(angelegt, 1);
        assert_eq!(roster.anzahl(), 1);
    }
}
