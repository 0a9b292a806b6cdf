pub mod automation;
pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod request;
pub mod scanner;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{CliOverrides, Config, EngineConfig, EngineKind, InputConfig, OutputConfig};
pub use error::{ConvertError, Result, UserFriendlyError};

// Core functionality re-exports
pub use automation::{AutomationHost, OfficeHost, OoxmlHost};
pub use extractor::{ConversionProgress, ConversionReport, StructuredWriter, TextExtractor};
pub use request::{ConversionRequest, FileTask};
pub use scanner::{DocumentScanner, FileFilter};
pub use ui::{GracefulShutdown, OutputFormatter, OutputMode, ProgressManager};

use chrono::Utc;
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use ui::output::ProgressAwareOutput;

/// What a run would do: the resolved request, one task per eligible file
/// and the enumerated files that were left out.
#[derive(Debug, Clone)]
pub struct ConversionPlan {
    pub request: ConversionRequest,
    pub tasks: Vec<FileTask>,
    pub skipped: Vec<String>,
}

impl ConversionPlan {
    pub fn files_found(&self) -> usize {
        self.tasks.len() + self.skipped.len()
    }
}

/// Main library interface: converts the Word documents of a source into
/// structured text files.
pub struct Word2Json {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    shutdown: GracefulShutdown,
    verbose: bool,
}

impl Word2Json {
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(show_progress(output_mode, quiet));
        let shutdown = GracefulShutdown::new()?;

        Ok(Self {
            config,
            output_formatter,
            progress_manager,
            shutdown,
            verbose: verbose > 0 && !quiet,
        })
    }

    /// Create an instance for testing (no signal handler, no progress bar)
    #[cfg(test)]
    pub fn new_for_test(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        Self {
            config,
            output_formatter: OutputFormatter::new(output_mode, verbose, quiet),
            progress_manager: ProgressManager::new(false),
            shutdown: GracefulShutdown::new_for_test(),
            verbose: verbose > 0 && !quiet,
        }
    }

    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match cli_args.output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        };

        Self::new(config, output_mode, cli_args.verbosity_level(), cli_args.quiet)
    }

    /// Resolves the request and lists the files it covers. Nothing is
    /// created or opened.
    pub fn plan(&self, source: Option<&Path>) -> Result<ConversionPlan> {
        let request = ConversionRequest::resolve(
            source,
            self.config.output.directory.as_deref(),
            &self.config.output.format,
            self.verbose,
        )?;

        if source.map_or(true, |s| s.as_os_str().is_empty()) {
            self.output_formatter.info(&format!(
                "Set the default source with current folder. Folder: {}",
                request.source_path.display()
            ));
        }

        let mut scanner = DocumentScanner::new();
        let files = scanner.scan(&request.source_path)?;
        for scan_error in scanner.scan_errors() {
            self.output_formatter.warning(scan_error);
        }

        let filter = FileFilter::new(&self.config.input);
        let mut tasks = Vec::new();
        let mut skipped = Vec::new();

        for file in files {
            if filter.is_eligible(&file) {
                self.output_formatter
                    .info(&format!("Add the file {}", file.display()));
                tasks.push(request.task_for(&file));
            } else {
                self.output_formatter
                    .debug(&format!("Skip the file {}", file.display()));
                skipped.push(file.display().to_string());
            }
        }

        self.output_formatter.info(&format!(
            "Source:      {}",
            request.source_path.display()
        ));
        self.output_formatter.info(&format!(
            "Destination: {}",
            request.destination_path.display()
        ));

        Ok(ConversionPlan {
            request,
            tasks,
            skipped,
        })
    }

    /// Converts every eligible file with the configured engine.
    pub fn run(&self, source: Option<&Path>) -> Result<ConversionReport> {
        let host = automation::host_for(&self.config.engine);
        self.run_with_host(source, host.as_ref())
    }

    /// Only an invalid source (or an unusable destination directory) fails
    /// the run; per-file errors are reported and recorded in the report.
    pub fn run_with_host(
        &self,
        source: Option<&Path>,
        host: &dyn AutomationHost,
    ) -> Result<ConversionReport> {
        let started_at = Utc::now();
        let plan = self.plan(source)?;
        let request = &plan.request;

        if !request.destination_path.is_dir() {
            fs::create_dir_all(&request.destination_path)?;
            self.output_formatter.debug(&format!(
                "Created destination directory {}",
                request.destination_path.display()
            ));
        }

        let mut progress = ConversionProgress::new(plan.files_found());
        for _ in &plan.skipped {
            progress.record_skip();
        }

        let file_progress = self
            .progress_manager
            .create_file_progress(plan.tasks.len() as u64);
        let output = ProgressAwareOutput::new(&self.output_formatter, Some(&self.progress_manager));

        let release_errors = RefCell::new(Vec::new());
        let reporter = |error: ConvertError| {
            let message = error.user_message();
            output.warning(&message);
            release_errors.borrow_mut().push(message);
        };

        let mut cancelled = false;
        for task in &plan.tasks {
            if self.shutdown.check_shutdown().is_err() {
                cancelled = true;
                break;
            }

            progress.begin_file(task.display_source());
            ui::progress::update_file_progress(&file_progress, &progress);
            output.processing(&task.display_source());

            match self.convert_file(host, task, request, &reporter) {
                Ok(lines) => {
                    output.debug(&format!(
                        "Wrote {} item(s) to {}",
                        lines,
                        task.dest_file.display()
                    ));
                    progress.record_success(lines);
                }
                Err(error) => {
                    output.error(&error);
                    progress.record_failure(task.display_source(), error.user_message());
                }
            }
        }

        ui::progress::finish_progress_with_summary(
            &file_progress,
            &format!("Converted {} of {} document(s)", progress.converted, plan.tasks.len()),
            progress.elapsed(),
        );
        self.progress_manager.clear();

        progress.release_errors = release_errors.take();

        if cancelled {
            self.output_formatter.warning(&ConvertError::Cancelled.user_message());
        }

        Ok(ConversionReport::new(
            request.source_path.clone(),
            request.destination_path.clone(),
            request.output_format.clone(),
            host.name().to_string(),
            started_at,
            &progress,
            cancelled,
        ))
    }

    /// One file through open, extract and write. The session is fully
    /// released before the output is written.
    fn convert_file(
        &self,
        host: &dyn AutomationHost,
        task: &FileTask,
        request: &ConversionRequest,
        reporter: automation::ReleaseReporter<'_>,
    ) -> Result<usize> {
        let writer = StructuredWriter::for_format(&request.output_format)?;

        if !task.source_file.is_file() {
            return Err(ConvertError::DocumentOpen {
                path: task.display_source(),
                message: "The file does not exist".to_string(),
            });
        }

        if task.dest_file.is_file() {
            fs::remove_file(&task.dest_file)?;
        }

        let extracted = automation::with_session(host, &task.source_file, reporter, |document| {
            TextExtractor::extract(document, &task.source_file, reporter)
        })?;

        writer.write(&task.dest_file, &extracted.lines)
    }

    /// Prints the figures of a finished run followed by the terminal count line.
    pub fn print_report(&self, report: &ConversionReport) {
        self.output_formatter.print_conversion_summary(report);
        self.output_formatter.print_final_count(report);
    }

    pub fn print_plan(&self, plan: &ConversionPlan) {
        self.output_formatter.print_dry_run_plan(
            &plan.request.destination_path,
            &plan.tasks,
            &plan.skipped,
        );
    }

    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        fs::write(output_path.as_ref(), sample_config)?;
        Ok(())
    }

    pub fn request_shutdown(&self) {
        self.shutdown.request_shutdown();
    }

    pub fn handle_error(&self, error: &ConvertError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

fn show_progress(output_mode: OutputMode, quiet: bool) -> bool {
    !quiet && output_mode == OutputMode::Human && console::Term::stderr().is_term()
}
