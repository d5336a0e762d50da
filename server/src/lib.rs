//! callbridge-server – Bibliotheks-Root
//!
//! Der Dienst gibt Host-Ereignisse aus einer JSON-Lines-Quelle wieder:
//! jede benannte Konferenz bekommt beim ersten Auftreten einen simulierten
//! Host und wird ueber die `KonferenzVerwaltung` gefuehrt.

pub mod config;
pub mod simulation;
pub mod wiedergabe;

use anyhow::Result;
use callbridge_conference::{ConferenceSession, KonferenzVerwaltung};
use callbridge_core::{HostEreignis, TelefonId};
use config::ServerConfig;
use simulation::{ProtokollRegister, SimulierterHost};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use wiedergabe::{Aktion, Inhalt, Zeile};

/// Zaehler einer Wiedergabe
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WiedergabeStatistik {
    pub zeilen: usize,
    pub ereignisse: usize,
    pub aktionen: usize,
    pub fehlerhaft: usize,
    pub konferenzen_erstellt: usize,
    pub konferenzen_abgebaut: usize,
}

struct Eintrag {
    session: ConferenceSession,
    host: Arc<SimulierterHost>,
}

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
    verwaltung: KonferenzVerwaltung,
    register: Arc<ProtokollRegister>,
    konferenzen: HashMap<String, Eintrag>,
    naechstes_telefon: u32,
    statistik: WiedergabeStatistik,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Result<Self> {
        let register = Arc::new(ProtokollRegister::default());
        let verwaltung = KonferenzVerwaltung::neu(register.clone(), config.konferenz.clone())?;
        Ok(Self {
            naechstes_telefon: config.server.erstes_telefon,
            config,
            verwaltung,
            register,
            konferenzen: HashMap::new(),
            statistik: WiedergabeStatistik::default(),
        })
    }

    /// Gibt die konfigurierte Quelle wieder und laeuft bis zu deren Ende
    /// oder bis zum Shutdown-Signal
    pub async fn starten(mut self) -> Result<WiedergabeStatistik> {
        tracing::info!(
            server_name = %self.config.server.name,
            quelle = self.config.wiedergabe.datei.as_deref().unwrap_or("stdin"),
            "Server startet"
        );

        match self.config.wiedergabe.datei.clone() {
            Some(pfad) => {
                let datei = tokio::fs::File::open(&pfad)
                    .await
                    .map_err(|e| anyhow::anyhow!("Wiedergabe-Datei '{pfad}' nicht lesbar: {e}"))?;
                self.wiedergeben(BufReader::new(datei)).await?;
            }
            None => {
                self.wiedergeben(BufReader::new(tokio::io::stdin())).await?;
            }
        }

        tracing::info!(
            zeilen = self.statistik.zeilen,
            ereignisse = self.statistik.ereignisse,
            aktionen = self.statistik.aktionen,
            fehlerhaft = self.statistik.fehlerhaft,
            erstellt = self.statistik.konferenzen_erstellt,
            abgebaut = self.statistik.konferenzen_abgebaut,
            offen = self.verwaltung.anzahl(),
            veroeffentlicht = self.register.veroeffentlicht(),
            "Wiedergabe beendet"
        );
        Ok(self.statistik)
    }

    /// Liest Zeilen bis zum Ende der Eingabe
    pub async fn wiedergeben<R>(&mut self, eingabe: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut zeilen = eingabe.lines();
        // Einmal registrieren; ein Signal zwischen zwei Zeilen geht nicht verloren
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        loop {
            tokio::select! {
                zeile = zeilen.next_line() => {
                    match zeile? {
                        Some(zeile) => self.zeile_verarbeiten(&zeile),
                        None => break,
                    }
                }
                _ = &mut ctrl_c => {
                    tracing::info!("Shutdown-Signal empfangen, Wiedergabe wird beendet");
                    break;
                }
            }
        }
        Ok(())
    }

    pub fn verwaltung(&self) -> &KonferenzVerwaltung {
        &self.verwaltung
    }

    /// Laufende Konferenz unter ihrem Wiedergabe-Namen
    pub fn konferenz(&self, name: &str) -> Option<ConferenceSession> {
        self.konferenzen.get(name).map(|e| e.session.clone())
    }

    pub fn statistik(&self) -> &WiedergabeStatistik {
        &self.statistik
    }

    // -----------------------------------------------------------------------
    // Interne Hilfsmethoden
    // -----------------------------------------------------------------------

    fn zeile_verarbeiten(&mut self, roh: &str) {
        self.statistik.zeilen += 1;

        let zeile = match wiedergabe::zeile_parsen(roh) {
            Ok(Some(zeile)) => zeile,
            Ok(None) => return,
            Err(e) => {
                self.statistik.fehlerhaft += 1;
                tracing::warn!(zeile = self.statistik.zeilen, fehler = %e, "Ungueltige Zeile verworfen");
                return;
            }
        };

        if let Err(e) = self.zeile_anwenden(zeile) {
            self.statistik.fehlerhaft += 1;
            tracing::warn!(zeile = self.statistik.zeilen, fehler = %e, "Zeile nicht anwendbar");
        }

        for id in self.verwaltung.abgebaute_bereinigen() {
            self.konferenzen.retain(|_, e| e.session.id() != id);
            self.statistik.konferenzen_abgebaut += 1;
        }
    }

    fn zeile_anwenden(&mut self, zeile: Zeile) -> Result<()> {
        let Zeile { konferenz, inhalt } = zeile;
        let (session, host) = self.eintrag_holen(&konferenz)?;

        match inhalt {
            Inhalt::Ereignis(ereignis) => {
                self.statistik.ereignisse += 1;
                if let HostEreignis::Getrennt { grund } = &ereignis {
                    host.grund_setzen(*grund);
                }
                self.verwaltung.ereignis_zustellen(session.id(), ereignis)?;
            }
            Inhalt::Aktion(aktion) => {
                self.statistik.aktionen += 1;
                let angenommen = match &aktion {
                    Aktion::Auflegen => session.auflegen(),
                    Aktion::Halten => session.halten(),
                    Aktion::Fortsetzen => session.fortsetzen(),
                    Aktion::Dtmf { ton } => session.dtmf_abspielen(*ton),
                    Aktion::DtmfStopp => session.dtmf_stoppen(),
                    Aktion::Abspalten { endpoint } => {
                        session.abspalten(endpoint);
                        false
                    }
                };
                tracing::debug!(konferenz = %konferenz, aktion = ?aktion, angenommen, "Aktion");
            }
        }
        Ok(())
    }

    /// Liefert die Konferenz zum Namen und legt sie beim ersten Auftreten an
    fn eintrag_holen(&mut self, name: &str) -> Result<(ConferenceSession, Arc<SimulierterHost>)> {
        if let Some(e) = self.konferenzen.get(name) {
            return Ok((e.session.clone(), e.host.clone()));
        }

        let telefon = TelefonId(self.naechstes_telefon);
        self.naechstes_telefon += 1;
        let host = Arc::new(SimulierterHost::neu(name, telefon));
        let session = self.verwaltung.host_befoerdern(host.clone())?;
        self.statistik.konferenzen_erstellt += 1;

        tracing::info!(name, konferenz = %session.id(), telefon = %telefon, "Konferenz eroeffnet");
        self.konferenzen.insert(
            name.to_string(),
            Eintrag {
                session: session.clone(),
                host: host.clone(),
            },
        );
        Ok((session, host))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callbridge_core::{Faehigkeiten, Trennungsgrund, Verbindungszustand};

    const EINGABE: &str = r#"
# Zwei Teilnehmer, dann Host aktiv
{"konferenz":"k1","ereignis":{"typ":"teilnehmer_geaendert","teilnehmer":[{"endpoint":"sip:a@b","zustand":"klingelt"},{"endpoint":"sip:c@b","zustand":"aktiv"}]}}
{"konferenz":"k1","ereignis":{"typ":"zustand_geaendert","code":4}}
{"konferenz":"k1","aktion":{"typ":"dtmf","ton":"5"}}
{"konferenz":"k2","ereignis":{"typ":"teilnehmer_geaendert","teilnehmer":[]}}
kaputt
"#;

    fn server() -> Server {
        Server::neu(ServerConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn wiedergabe_baut_konferenzen_auf() {
        let mut server = server();
        server.wiedergeben(EINGABE.as_bytes()).await.unwrap();

        let k1 = server.konferenz("k1").unwrap();
        assert_eq!(k1.teilnehmer_anzahl(), 2);
        assert_eq!(k1.zustand(), Verbindungszustand::Aktiv);
        assert!(k1.faehigkeiten().kann(Faehigkeiten::KONFERENZ_VERWALTEN));

        let k2 = server.konferenz("k2").unwrap();
        assert_eq!(k2.teilnehmer_anzahl(), 0);

        let statistik = server.statistik();
        assert_eq!(statistik.konferenzen_erstellt, 2);
        assert_eq!(statistik.ereignisse, 3);
        assert_eq!(statistik.aktionen, 1);
        assert_eq!(statistik.fehlerhaft, 1);
        assert_eq!(server.register.veroeffentlicht(), 2);
    }

    #[tokio::test]
    async fn getrennt_baut_ab_und_bereinigt() {
        let eingabe = r#"
{"konferenz":"k1","ereignis":{"typ":"teilnehmer_geaendert","teilnehmer":[{"endpoint":"sip:a@b","zustand":"aktiv"}]}}
{"konferenz":"k1","ereignis":{"typ":"getrennt","grund":"besetzt"}}
{"konferenz":"k1","ereignis":{"typ":"zustand_geaendert","code":6}}
"#;
        let mut server = server();
        server.wiedergeben(eingabe.as_bytes()).await.unwrap();

        assert!(server.konferenz("k1").is_none());
        assert_eq!(server.verwaltung().anzahl(), 0);
        assert_eq!(server.statistik().konferenzen_abgebaut, 1);
    }

    #[tokio::test]
    async fn host_grund_folgt_getrennt_ereignis() {
        let eingabe = r#"{"konferenz":"k1","ereignis":{"typ":"getrennt","grund":"besetzt"}}"#;
        let mut server = server();
        server.wiedergeben(eingabe.as_bytes()).await.unwrap();

        let k1 = server.konferenz("k1").unwrap();
        assert_eq!(k1.trennungsgrund(), Some(Trennungsgrund::Besetzt));
        assert_eq!(k1.zustand(), Verbindungszustand::Getrennt);
    }

    #[tokio::test]
    async fn viele_zeilen_werden_vollstaendig_wiedergegeben() {
        let mut eingabe = String::new();
        for i in 0..200 {
            eingabe.push_str(&format!(
                r#"{{"konferenz":"k{}","ereignis":{{"typ":"teilnehmer_geaendert","teilnehmer":[{{"endpoint":"sip:t{}@b","zustand":"aktiv"}}]}}}}"#,
                i % 4,
                i
            ));
            eingabe.push('\n');
        }

        let mut server = server();
        server.wiedergeben(eingabe.as_bytes()).await.unwrap();

        let statistik = server.statistik();
        assert_eq!(statistik.zeilen, 200);
        assert_eq!(statistik.ereignisse, 200);
        assert_eq!(statistik.konferenzen_erstellt, 4);
        assert_eq!(statistik.fehlerhaft, 0);
        assert_eq!(server.register.veroeffentlicht(), 200);
        for k in 0..4 {
            let session = server.konferenz(&format!("k{k}")).unwrap();
            assert_eq!(session.teilnehmer_anzahl(), 1);
        }
    }
}
