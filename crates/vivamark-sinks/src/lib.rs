//! vivamark-sinks — Result sink backends for vivamark.
//!
//! Two interchangeable persistence backends for finalized answer rows
//! (a local append-only CSV file and a remote spreadsheet service), plus
//! an in-memory sink for tests, the configuration surface, and the sink
//! factory.

pub mod config;
pub mod csv;
pub mod error;
pub mod memory;
pub mod sheets;

pub use config::{create_sink, load_config, load_config_from, SinkConfig, VivamarkConfig};
pub use csv::CsvFileSink;
pub use memory::MemorySink;
pub use sheets::SheetSink;
