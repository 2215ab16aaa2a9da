//! Output module.
//!
//! Success records, the result file writer, temporary artifact handling and
//! terminal status lines.

mod artifact;
mod plain;
mod record;
mod sink;

pub use artifact::{artifact_name, generate_filename, sweep_artifacts, ARTIFACT_PREFIX};
pub use plain::{print_error, print_found, print_scan_header, print_summary, print_warning};
pub use record::SuccessRecord;
pub use sink::{RecordSender, ResultSink, SinkOptions};
