mod diff;
mod engine;
mod error;
mod fs;

pub use diff::build_unified_diff;
pub use engine::{generate, GenerateOutcome, GenerateRequest, Mode};
pub use error::{ExitCode, GenError, GenResult};
pub use fs::{backup_path, write_atomic};
