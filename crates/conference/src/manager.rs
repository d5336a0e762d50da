//! Konferenz-Verwaltung – Registry aller laufenden Konferenzen
//!
//! Befoerdert Signalisierungsverbindungen zu Konferenzen, stellt
//! Host-Ereignisse an die richtige Konferenz zu und raeumt abgebaute
//! Konferenzen wieder ab.
//!
//! Thread-safe via Arc + DashMap. Clone teilt die Registry.

use callbridge_core::{HostEreignis, KonferenzId};
use dashmap::DashMap;
use std::sync::Arc;

use crate::config::KonferenzConfig;
use crate::error::{KonferenzError, KonferenzResult};
use crate::session::ConferenceSession;
use crate::signaling::{AnrufRegister, SignalisierungsHandle};

/// Verwaltet alle Konferenzen eines Prozesses
#[derive(Clone)]
pub struct KonferenzVerwaltung {
    inner: Arc<VerwaltungInner>,
}

struct VerwaltungInner {
    konferenzen: DashMap<KonferenzId, ConferenceSession>,
    register: Arc<dyn AnrufRegister>,
    config: KonferenzConfig,
}

impl KonferenzVerwaltung {
    /// Erstellt eine leere Verwaltung; die Konfiguration wird sofort geprueft
    pub fn neu(register: Arc<dyn AnrufRegister>, config: KonferenzConfig) -> KonferenzResult<Self> {
        config.validieren()?;
        Ok(Self {
            inner: Arc::new(VerwaltungInner {
                konferenzen: DashMap::new(),
                register,
                config,
            }),
        })
    }

    /// Befoerdert eine Signalisierungsverbindung zur Konferenz
    pub fn host_befoerdern(
        &self,
        handle: Arc<dyn SignalisierungsHandle>,
    ) -> KonferenzResult<ConferenceSession> {
        let session = ConferenceSession::neu(
            KonferenzId::new(),
            handle,
            Arc::clone(&self.inner.register),
            self.inner.config.clone(),
        )?;
        self.inner.konferenzen.insert(session.id(), session.clone());

        tracing::info!(
            konferenz = %session.id(),
            anzahl = self.inner.konferenzen.len(),
            "Konferenz registriert"
        );
        Ok(session)
    }

    pub fn konferenz(&self, id: KonferenzId) -> Option<ConferenceSession> {
        self.inner.konferenzen.get(&id).map(|s| s.value().clone())
    }

    /// Stellt ein Host-Ereignis an die Konferenz zu
    pub fn ereignis_zustellen(&self, id: KonferenzId, ereignis: HostEreignis) -> KonferenzResult<()> {
        let session = self.konferenz(id).ok_or(KonferenzError::NichtGefunden(id))?;
        if session.ist_zerstoert() {
            return Err(KonferenzError::Abgebaut(id));
        }
        session.ereignis_verarbeiten(ereignis);
        Ok(())
    }

    /// Entfernt alle abgebauten Konferenzen und gibt ihre IDs zurueck
    pub fn abgebaute_bereinigen(&self) -> Vec<KonferenzId> {
        let abgebaut: Vec<KonferenzId> = self
            .inner
            .konferenzen
            .iter()
            .filter(|e| e.value().ist_zerstoert())
            .map(|e| *e.key())
            .collect();

        for id in &abgebaut {
            self.inner.konferenzen.remove(id);
        }
        if !abgebaut.is_empty() {
            tracing::debug!(anzahl = abgebaut.len(), "Abgebaute Konferenzen entfernt");
        }
        abgebaut
    }

    pub fn ids(&self) -> Vec<KonferenzId> {
        self.inner.konferenzen.iter().map(|e| *e.key()).collect()
    }

    pub fn anzahl(&self) -> usize {
        self.inner.konferenzen.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
