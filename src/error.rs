/*!
Shared error type for both simulator cores.

All input problems (unreadable files, bad tokens, bad CLI specs) are reported
through `SimError` before any simulation output is produced. Access
violations inside a running simulation (SEGV, SEGPROT) are ordinary events,
not errors; internal invariant violations abort.
*/

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed input at line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("Invalid scheduler specification: {0}.")]
    BadSchedSpec(String),

    #[error("unknown replacement algorithm: {0}")]
    BadAlgorithm(char),

    #[error("unknown output option: {0}")]
    BadOption(char),

    #[error("frame count {0} out of range (1..=128)")]
    BadFrameCount(usize),
}

pub type Result<T> = std::result::Result<T, SimError>;
