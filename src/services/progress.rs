//! Stage reporting for background removal
//!
//! The processor announces each stage it enters; a [`ProgressReporter`]
//! decides what to do with it. The CLI logs them, library callers get a
//! no-op unless they plug in their own.

use crate::types::ProcessingTimings;
use instant::Instant;

/// Stages a single image goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    ImageLoading,
    BackgroundEstimation,
    AlphaFeathering,
    /// Metadata assembly after the pixel pass
    Finalizing,
    Completed,
}

impl ProcessingStage {
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::ImageLoading => "Loading input image",
            Self::BackgroundEstimation => "Sampling corner patches",
            Self::AlphaFeathering => "Writing alpha channel",
            Self::Finalizing => "Collecting statistics",
            Self::Completed => "Done",
        }
    }

    /// Rough share of the work finished once this stage starts
    #[must_use]
    pub fn progress_percentage(self) -> u8 {
        match self {
            Self::ImageLoading => 5,
            Self::BackgroundEstimation => 40,
            Self::AlphaFeathering => 50,
            Self::Finalizing => 95,
            Self::Completed => 100,
        }
    }
}

/// Snapshot handed to reporters when a stage starts
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub stage: ProcessingStage,
    pub progress: u8,
    pub description: String,
    /// Milliseconds since the current item started loading
    pub elapsed_ms: u64,
}

impl ProgressUpdate {
    #[must_use]
    pub fn new(stage: ProcessingStage, item_start: Instant) -> Self {
        Self {
            stage,
            progress: stage.progress_percentage(),
            description: stage.description().to_string(),
            elapsed_ms: item_start.elapsed().as_millis() as u64,
        }
    }
}

/// Sink for stage updates, completions and failures
pub trait ProgressReporter: Send + Sync {
    fn report_progress(&self, update: ProgressUpdate);

    fn report_completion(&self, timings: ProcessingTimings);

    /// `stage` is the last stage entered before the failure
    fn report_error(&self, stage: ProcessingStage, error: &str);
}

pub struct NoOpProgressReporter;

impl ProgressReporter for NoOpProgressReporter {
    fn report_progress(&self, _update: ProgressUpdate) {}

    fn report_completion(&self, _timings: ProcessingTimings) {}

    fn report_error(&self, _stage: ProcessingStage, _error: &str) {}
}

/// Reporter that writes stages to the `log` facade
///
/// Everything but failures goes out at debug level unless `verbose` is set.
pub struct ConsoleProgressReporter {
    verbose: bool,
}

impl ConsoleProgressReporter {
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ProgressReporter for ConsoleProgressReporter {
    fn report_progress(&self, update: ProgressUpdate) {
        if self.verbose {
            log::info!(
                "{:>3}% {} (+{}ms)",
                update.progress,
                update.description,
                update.elapsed_ms
            );
        } else {
            log::debug!("{:>3}% {}", update.progress, update.description);
        }
    }

    fn report_completion(&self, timings: ProcessingTimings) {
        if self.verbose {
            log::info!(
                "Cutout ready in {}ms (decode {}ms, estimate {}ms, feather {}ms)",
                timings.total_ms,
                timings.image_decode_ms,
                timings.estimation_ms,
                timings.feathering_ms
            );
        } else {
            log::debug!("Cutout ready in {}ms", timings.total_ms);
        }
    }

    fn report_error(&self, stage: ProcessingStage, error: &str) {
        log::error!("{} failed: {}", stage.description(), error);
    }
}

/// Remembers the current stage and the start of the current item
pub struct ProgressTracker {
    reporter: Box<dyn ProgressReporter>,
    item_start: Instant,
    current_stage: Option<ProcessingStage>,
}

impl ProgressTracker {
    #[must_use]
    pub fn new(reporter: Box<dyn ProgressReporter>) -> Self {
        Self {
            reporter,
            item_start: Instant::now(),
            current_stage: None,
        }
    }

    #[must_use]
    pub fn no_op() -> Self {
        Self::new(Box::new(NoOpProgressReporter))
    }

    /// Enter `stage`; entering [`ProcessingStage::ImageLoading`] starts a new item
    pub fn report_stage(&mut self, stage: ProcessingStage) {
        if stage == ProcessingStage::ImageLoading {
            self.item_start = Instant::now();
        }
        self.current_stage = Some(stage);
        self.reporter
            .report_progress(ProgressUpdate::new(stage, self.item_start));
    }

    pub fn report_completion(&self, timings: ProcessingTimings) {
        self.reporter.report_completion(timings);
    }

    /// Report a failure against the stage last entered
    pub fn report_error(&self, error: &str) {
        let stage = self.current_stage.unwrap_or(ProcessingStage::ImageLoading);
        self.reporter.report_error(stage, error);
    }

    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        self.item_start.elapsed().as_millis() as u64
    }

    #[must_use]
    pub fn current_stage(&self) -> Option<ProcessingStage> {
        self.current_stage
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::no_op()
    }
}

/// Reporter used by the `designs4u` binary
#[must_use]
pub fn create_cli_progress_reporter(verbose: bool) -> Box<dyn ProgressReporter> {
    Box::new(ConsoleProgressReporter::new(verbose))
}
