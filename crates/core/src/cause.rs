//! Trennungsgruende
//!
//! `SignalisierungsGrund` ist der rohe Grund der Signalisierungsschicht,
//! `Trennungsgrund` die nutzerseitige Sicht darauf. Nur `Abgebrochen`
//! landet nicht in der Anrufliste; damit wird interner Roster-Umbau
//! von echten Gespraechsenden unterschieden.

use serde::{Deserialize, Serialize};

/// Nutzerseitiger Grund fuer das Ende einer Verbindung
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trennungsgrund {
    Unbekannt,
    Fehler,
    /// Lokal aufgelegt
    Lokal,
    /// Gegenseite hat aufgelegt
    Entfernt,
    /// Intern verworfen, nicht protokollierbar
    Abgebrochen,
    Verpasst,
    Abgelehnt,
    Besetzt,
    Beschraenkt,
    Sonstiges,
}

impl Trennungsgrund {
    /// Darf die Verbindung in der Anrufliste erscheinen?
    pub fn ist_protokollierbar(&self) -> bool {
        !matches!(self, Self::Abgebrochen)
    }
}

impl std::fmt::Display for Trennungsgrund {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unbekannt => "unbekannt",
            Self::Fehler => "fehler",
            Self::Lokal => "lokal",
            Self::Entfernt => "entfernt",
            Self::Abgebrochen => "abgebrochen",
            Self::Verpasst => "verpasst",
            Self::Abgelehnt => "abgelehnt",
            Self::Besetzt => "besetzt",
            Self::Beschraenkt => "beschraenkt",
            Self::Sonstiges => "sonstiges",
        };
        f.write_str(name)
    }
}

/// Roher Trennungsgrund wie ihn die Signalisierungsschicht meldet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalisierungsGrund {
    /// Regulaer von der Gegenseite beendet
    Normal,
    /// Lokal beendet
    Lokal,
    Besetzt,
    /// Netz ueberlastet
    Ueberlastung,
    VerpasstEingehend,
    AbgelehntEingehend,
    NichtErreichbar,
    UngueltigeNummer,
    KeinDienst,
    Netzfehler,
    Abgebrochen,
    #[default]
    Unbekannt,
}

impl From<SignalisierungsGrund> for Trennungsgrund {
    fn from(grund: SignalisierungsGrund) -> Self {
        match grund {
            SignalisierungsGrund::Normal => Trennungsgrund::Entfernt,
            SignalisierungsGrund::Lokal => Trennungsgrund::Lokal,
            SignalisierungsGrund::Besetzt => Trennungsgrund::Besetzt,
            SignalisierungsGrund::Ueberlastung => Trennungsgrund::Besetzt,
            SignalisierungsGrund::VerpasstEingehend => Trennungsgrund::Verpasst,
            SignalisierungsGrund::AbgelehntEingehend => Trennungsgrund::Abgelehnt,
            SignalisierungsGrund::NichtErreichbar
            | SignalisierungsGrund::UngueltigeNummer
            | SignalisierungsGrund::KeinDienst
            | SignalisierungsGrund::Netzfehler => Trennungsgrund::Fehler,
            SignalisierungsGrund::Abgebrochen => Trennungsgrund::Abgebrochen,
            SignalisierungsGrund::Unbekannt => Trennungsgrund::Unbekannt,
        }
    }
}
