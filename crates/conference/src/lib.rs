//! callbridge-conference – Konferenz-Sitzungen ueber eine Host-Verbindung
//!
//! Eine Konferenz entsteht, wenn eine Signalisierungsverbindung zu einer
//! Konferenzbruecke befoerdert wird. Die Bruecke meldet wiederholt die
//! vollstaendige Teilnehmerliste; die Konferenz haelt dazu einen Roster
//! aus eigenstaendigen Teilnehmer-Verbindungen und gleicht ihn mit jeder
//! Meldung ab.
//!
//! ## Module
//! - `session`     – ConferenceSession (Abgleich, Zustandsspiegelung, Aktionen)
//! - `manager`     – Registry aller laufenden Konferenzen
//! - `participant` – Teilnehmer-Verbindung und Beobachter-Rueckkanal
//! - `host`        – Adapter um das Signalisierungs-Handle
//! - `roster`      – Nebenlaeufige Teilnehmer-Tabelle
//! - `signaling`   – Traits fuer Signalisierung und Anrufverwaltung

pub mod config;
pub mod error;
pub mod host;
pub mod manager;
pub mod participant;
pub mod roster;
pub mod session;
pub mod signaling;

pub use config::KonferenzConfig;
pub use error::{KonferenzError, KonferenzResult, SignalisierungsFehler};
pub use host::HostConnection;
pub use manager::KonferenzVerwaltung;
pub use participant::{ParticipantConnection, TeilnehmerBeobachter};
pub use roster::{Einfuegung, Roster};
pub use session::{AbgleichErgebnis, ConferenceSession};
pub use signaling::{AnrufRegister, ExterneVerbindung, SignalisierungsHandle, Telefon};
