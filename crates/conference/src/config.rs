//! Konfiguration der Konferenz-Sitzungen
//!
//! Wird als `[konferenz]`-Abschnitt aus der Server-Konfiguration geladen.

use callbridge_core::Verbindungszustand;
use serde::{Deserialize, Serialize};

use crate::error::{KonferenzError, KonferenzResult};

/// Einstellungen fuer alle Konferenzen eines Prozesses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KonferenzConfig {
    /// Groesse des Broadcast-Kanals fuer Konferenz-Ereignisse
    pub ereignis_kanal_groesse: usize,
    /// Groesse der Queue fuer eingehende Host-Ereignisse
    pub host_kanal_groesse: usize,
    /// Zustand in dem neue Teilnehmer angelegt werden, bevor der
    /// gemeldete Zustand gesetzt wird
    pub initialer_teilnehmer_zustand: Verbindungszustand,
}

impl Default for KonferenzConfig {
    fn default() -> Self {
        Self {
            ereignis_kanal_groesse: 256,
            host_kanal_groesse: 64,
            initialer_teilnehmer_zustand: Verbindungszustand::Gehalten,
        }
    }
}

impl KonferenzConfig {
    /// Prueft die Einstellungen auf Plausibilitaet
    ///
    /// Ein aktiver Startzustand wuerde einem laufenden Anruf den Fokus
    /// nehmen, ein getrennter waere endgueltig.
    pub fn validieren(&self) -> KonferenzResult<()> {
        if self.ereignis_kanal_groesse == 0 {
            return Err(KonferenzError::konfiguration(
                "ereignis_kanal_groesse muss groesser 0 sein",
            ));
        }
        if self.host_kanal_groesse == 0 {
            return Err(KonferenzError::konfiguration(
                "host_kanal_groesse muss groesser 0 sein",
            ));
        }
        let initial = self.initialer_teilnehmer_zustand;
        if initial.ist_vordergrund() || initial.ist_endgueltig() {
            return Err(KonferenzError::konfiguration(format!(
                "initialer_teilnehmer_zustand '{initial}' nicht erlaubt"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_ist_valide() {
        let cfg = KonferenzConfig::default();
        assert!(cfg.validieren().is_ok());
        assert_eq!(cfg.initialer_teilnehmer_zustand, Verbindungszustand::Gehalten);
    }

    #[test]
    fn aktiver_startzustand_wird_abgelehnt() {
        let cfg = KonferenzConfig {
            initialer_teilnehmer_zustand: Verbindungszustand::Aktiv,
            ..Default::default()
        };
        assert!(matches!(cfg.validieren(), Err(KonferenzError::Konfiguration(_))));
    }

    #[test]
    fn getrennter_startzustand_wird_abgelehnt() {
        let cfg = KonferenzConfig {
            initialer_teilnehmer_zustand: Verbindungszustand::Getrennt,
            ..Default::default()
        };
        assert!(cfg.validieren().is_err());
    }

    #[test]
    fn leerer_kanal_wird_abgelehnt() {
        let cfg = KonferenzConfig {
            ereignis_kanal_groesse: 0,
            ..Default::default()
        };
        assert!(cfg.validieren().is_err());
    }
}
