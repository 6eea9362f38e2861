//! Speech recognition integration: preflight, process supervision,
//! output parsing, and command mapping.
//!
//! Recognition itself happens in the external process; these modules get
//! audio to it reliably and structured results back out.

pub mod mapper;
pub mod parser;
pub mod preflight;
pub mod supervisor;

pub use mapper::{CommandMapper, CommandResult};
pub use parser::{OutputParser, TranscriptionEvent};
pub use preflight::{PreflightReport, check_availability};
pub use supervisor::{ProcessConfig, TranscriberProcess};
