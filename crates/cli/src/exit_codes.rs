//! CLI Exit Code Registry
//!
//! Single source of truth for `ledgermatch` exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! | Code | Meaning                                             |
//! |------|-----------------------------------------------------|
//! | 0    | Success; for `reconcile`, every record is MATCHED   |
//! | 1    | Material differences (any non-MATCHED record)       |
//! |      | or an unspecified error                             |
//! | 2    | Usage error (bad arguments, missing file)           |
//! | 3    | Input parse error (unreadable or headerless CSV)    |
//! | 4    | Invalid request or config file                      |

use ledgermatch_recon::ReconError;

/// Success.
pub const EXIT_SUCCESS: u8 = 0;

/// General error. Prefer a specific code.
pub const EXIT_ERROR: u8 = 1;

/// Reconciliation found differences. Like `diff(1)`, 1 means "inputs differ."
pub const EXIT_DIFFERENCES: u8 = 1;

/// Usage error: bad arguments, missing input file.
pub const EXIT_USAGE: u8 = 2;

/// Input CSV could not be parsed.
pub const EXIT_INPUT_PARSE: u8 = 3;

/// Request/config file failed to parse or validate.
pub const EXIT_INVALID_REQUEST: u8 = 4;

/// Map a library error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::InvalidRequest(_) => EXIT_INVALID_REQUEST,
        ReconError::Csv { .. } | ReconError::EmptyInput(_) => EXIT_INPUT_PARSE,
        ReconError::Io(_) | ReconError::UnknownStatus(_) => EXIT_USAGE,
        ReconError::UnknownSession(_) | ReconError::NoResult(_) => EXIT_ERROR,
    }
}
