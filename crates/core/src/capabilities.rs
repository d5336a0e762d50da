//! Faehigkeiten-Bitmaske der Konferenz
//!
//! Spiegelt was die Anrufverwaltung fuer den Gesamtanruf anbieten darf.

use serde::{Deserialize, Serialize};

/// Bitmaske der Faehigkeiten eines Anrufs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Faehigkeiten(u32);

impl Faehigkeiten {
    /// Anruf kann grundsaetzlich gehalten werden
    pub const HALTEN_UNTERSTUETZT: Faehigkeiten = Faehigkeiten(0x01);
    /// Halten ist gerade moeglich
    pub const HALTEN: Faehigkeiten = Faehigkeiten(0x02);
    /// Mikrofon kann stummgeschaltet werden
    pub const STUMM: Faehigkeiten = Faehigkeiten(0x04);
    /// Teilnehmer koennen einzeln verwaltet werden
    pub const KONFERENZ_VERWALTEN: Faehigkeiten = Faehigkeiten(0x08);

    /// Leere Maske
    pub const fn keine() -> Self {
        Self(0)
    }

    /// Startmaske einer Konferenz
    pub const fn konferenz_start() -> Self {
        Self(Self::HALTEN_UNTERSTUETZT.0 | Self::HALTEN.0 | Self::STUMM.0)
    }

    /// Rohwert der Maske
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Sind alle Bits aus `andere` gesetzt?
    pub const fn kann(&self, andere: Faehigkeiten) -> bool {
        self.0 & andere.0 == andere.0
    }

    /// Maske mit zusaetzlich gesetzten Bits
    pub const fn mit(self, andere: Faehigkeiten) -> Self {
        Self(self.0 | andere.0)
    }

    /// Maske ohne die angegebenen Bits
    pub const fn ohne(self, andere: Faehigkeiten) -> Self {
        Self(self.0 & !andere.0)
    }

    /// Setzt oder entfernt die Bits je nach `aktiv`
    pub const fn gesetzt(self, andere: Faehigkeiten, aktiv: bool) -> Self {
        if aktiv {
            self.mit(andere)
        } else {
            self.ohne(andere)
        }
    }
}

impl std::ops::BitOr for Faehigkeiten {
    type Output = Faehigkeiten;

    fn bitor(self, rhs: Self) -> Self {
        self.mit(rhs)
    }
}

impl std::fmt::Display for Faehigkeiten {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let namen = [
            (Self::HALTEN_UNTERSTUETZT, "halten_unterstuetzt"),
            (Self::HALTEN, "halten"),
            (Self::STUMM, "stumm"),
            (Self::KONFERENZ_VERWALTEN, "konferenz_verwalten"),
        ];
        let gesetzt: Vec<&str> = namen
            .iter()
            .filter(|(bit, _)| self.kann(*bit))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "[{}]", gesetzt.join("|"))
    }
}
