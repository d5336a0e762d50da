//! Ereignis-Definitionen
//!
//! `HostEreignis` beschreibt was die Signalisierungsverbindung zur
//! Konferenzbruecke meldet, `KonferenzEreignis` was die Konferenz selbst
//! nach aussen meldet. Beide sind explizite, geschlossene Ereignismengen
//! statt dynamisch registrierter Listener.

use serde::{Deserialize, Serialize};

use crate::capabilities::Faehigkeiten;
use crate::cause::{SignalisierungsGrund, Trennungsgrund};
use crate::state::Verbindungszustand;
use crate::types::{Endpoint, KonferenzId};

/// Ein Teilnehmer wie ihn das Konferenz-Ereignispaket meldet
///
/// Eine Liste dieser Eintraege ersetzt die Teilnehmermenge vollstaendig,
/// sie ist kein Delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeilnehmerSnapshot {
    pub endpoint: Endpoint,
    pub zustand: Verbindungszustand,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anzeigename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benutzer_uri: Option<String>,
}

impl TeilnehmerSnapshot {
    /// Snapshot ohne Anzeige-Metadaten
    pub fn neu(endpoint: Endpoint, zustand: Verbindungszustand) -> Self {
        Self {
            endpoint,
            zustand,
            anzeigename: None,
            benutzer_uri: None,
        }
    }

    /// Setzt den Anzeigenamen
    pub fn mit_anzeigename(mut self, name: impl Into<String>) -> Self {
        self.anzeigename = Some(name.into());
        self
    }
}

/// Ereignisse der Host-Signalisierungsverbindung
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "typ", rename_all = "snake_case")]
pub enum HostEreignis {
    /// Neuer Zustand als roher Signalisierungs-Code
    ZustandGeaendert { code: i32 },
    /// Host-Verbindung wurde getrennt
    Getrennt {
        #[serde(default)]
        grund: SignalisierungsGrund,
    },
    /// Host-Verbindung wurde zerstoert
    Zerstoert,
    /// Neues Konferenz-Ereignispaket mit vollstaendiger Teilnehmerliste
    TeilnehmerGeaendert { teilnehmer: Vec<TeilnehmerSnapshot> },
}

impl HostEreignis {
    /// Zustandsaenderung aus einem typisierten Zustand
    pub fn zustand(zustand: Verbindungszustand) -> Self {
        Self::ZustandGeaendert {
            code: zustand.code(),
        }
    }

    /// Kurzname fuer Logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::ZustandGeaendert { .. } => "zustand_geaendert",
            Self::Getrennt { .. } => "getrennt",
            Self::Zerstoert => "zerstoert",
            Self::TeilnehmerGeaendert { .. } => "teilnehmer_geaendert",
        }
    }
}

/// Ereignisse die eine Konferenz an ihre Abonnenten verteilt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KonferenzEreignis {
    /// Neuer Teilnehmer im Roster
    TeilnehmerHinzugefuegt {
        konferenz_id: KonferenzId,
        endpoint: Endpoint,
    },
    /// Zustand eines Teilnehmers hat sich geaendert
    TeilnehmerZustandGeaendert {
        konferenz_id: KonferenzId,
        endpoint: Endpoint,
        alt: Verbindungszustand,
        neu: Verbindungszustand,
    },
    /// Teilnehmer wurde getrennt
    TeilnehmerGetrennt {
        konferenz_id: KonferenzId,
        endpoint: Endpoint,
        grund: Trennungsgrund,
    },
    /// Teilnehmer wurde aus der Konferenz geloest
    TeilnehmerEntfernt {
        konferenz_id: KonferenzId,
        endpoint: Endpoint,
    },
    /// Faehigkeiten der Konferenz haben sich geaendert
    FaehigkeitenGeaendert {
        konferenz_id: KonferenzId,
        faehigkeiten: Faehigkeiten,
    },
    /// Gesamtzustand der Konferenz hat sich geaendert
    ZustandGeaendert {
        konferenz_id: KonferenzId,
        alt: Verbindungszustand,
        neu: Verbindungszustand,
    },
    /// Konferenz wurde abgebaut
    KonferenzZerstoert { konferenz_id: KonferenzId },
}

impl KonferenzEreignis {
    /// Konferenz auf die sich das Ereignis bezieht
    pub fn konferenz_id(&self) -> KonferenzId {
        match self {
            Self::TeilnehmerHinzugefuegt { konferenz_id, .. }
            | Self::TeilnehmerZustandGeaendert { konferenz_id, .. }
            | Self::TeilnehmerGetrennt { konferenz_id, .. }
            | Self::TeilnehmerEntfernt { konferenz_id, .. }
            | Self::FaehigkeitenGeaendert { konferenz_id, .. }
            | Self::ZustandGeaendert { konferenz_id, .. }
            | Self::KonferenzZerstoert { konferenz_id } => *konferenz_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_ereignis_aus_json() {
        let json = r#"{
            "typ": "teilnehmer_geaendert",
            "teilnehmer": [
                { "endpoint": "sip:a@bruecke", "zustand": "klingelt", "anzeigename": "Anna" }
            ]
        }"#;
        let ereignis: HostEreignis = serde_json::from_str(json).unwrap();
        match ereignis {
            HostEreignis::TeilnehmerGeaendert { teilnehmer } => {
                assert_eq!(teilnehmer.len(), 1);
                assert_eq!(teilnehmer[0].zustand, Verbindungszustand::Klingelt);
                assert_eq!(teilnehmer[0].anzeigename.as_deref(), Some("Anna"));
            }
            anderes => panic!("Unerwartetes Ereignis: {anderes:?}"),
        }
    }

    #[test]
    fn getrennt_ohne_grund_ist_unbekannt() {
        let ereignis: HostEreignis = serde_json::from_str(r#"{ "typ": "getrennt" }"#).unwrap();
        assert_eq!(
            ereignis,
            HostEreignis::Getrennt {
                grund: SignalisierungsGrund::Unbekannt
            }
        );
    }

    #[test]
    fn zustand_wird_als_code_transportiert() {
        let ereignis = HostEreignis::zustand(Verbindungszustand::Gehalten);
        assert_eq!(ereignis, HostEreignis::ZustandGeaendert { code: 5 });
        assert_eq!(ereignis.name(), "zustand_geaendert");
    }

    #[test]
    fn konferenz_ereignis_traegt_id() {
        let id = KonferenzId::new();
        let ereignis = KonferenzEreignis::KonferenzZerstoert { konferenz_id: id };
        assert_eq!(ereignis.konferenz_id(), id);
    }
}
