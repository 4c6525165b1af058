//! Exit-code mapping.

use weblands_crawler::Error;

/// Argument/validation problems exit 2, operational failures exit 1.
pub fn exit_code(err: &Error) -> i32 {
    match err {
        Error::Validation { .. } | Error::LandNotFound { .. } => 2,
        _ => 1,
    }
}
