pub mod constants;
pub mod filename;
pub mod logging;
pub mod progress;

pub use constants::*;
pub use filename::{cleaned_file_stem, output_path, profile_file_stem, CLEANED_DIR_NAME};
pub use logging::init_logging;
pub use progress::ProgressReporter;
