//! Service layer
//!
//! Infrastructure concerns (file and network I/O, encoding, progress and
//! object storage) live here, apart from the pixel transform and the cart.

pub mod format;
pub mod io;
pub mod progress;
pub mod upload;

pub use format::OutputFormatHandler;
pub use io::ImageIOService;
pub use progress::{
    create_cli_progress_reporter, ConsoleProgressReporter, NoOpProgressReporter, ProcessingStage,
    ProgressReporter, ProgressTracker, ProgressUpdate,
};
pub use upload::{
    background_removed_name, generate_upload_name, prepare_for_upload, upload_image,
    upload_removal_result, LocalObjectStore, ObjectStore, PreparedUpload,
};
