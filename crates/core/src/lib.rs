//! callbridge-core – Gemeinsame Typen, Zustaende und Fehlertypen
//!
//! Dieses Crate stellt die Wertetypen bereit, die Konferenz-Logik,
//! Server und Tests gemeinsam nutzen.

pub mod capabilities;
pub mod cause;
pub mod error;
pub mod event;
pub mod state;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use capabilities::Faehigkeiten;
pub use cause::{SignalisierungsGrund, Trennungsgrund};
pub use error::{CallbridgeError, Result};
pub use event::{HostEreignis, KonferenzEreignis, TeilnehmerSnapshot};
pub use state::Verbindungszustand;
pub use types::{Endpoint, KonferenzId, KontoHandle, TelefonId};
