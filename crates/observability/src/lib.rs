//! # callbridge-observability
//!
//! Observability-Crate fuer Callbridge:
//! - Structured Logging (Text oder JSON) via tracing-subscriber
//! - Uebersteuerung per Umgebungsvariable

pub mod logging;

pub use logging::{logging_initialisieren, LogFormat, LoggingFehler};
