use crate::error::{ConvertError, UserFriendlyError};
use crate::extractor::ConversionReport;
use crate::request::FileTask;
use crate::ui::progress::format_duration;
use crate::ui::ProgressManager;
use console::{style, Emoji, Term};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
    Plain,
}

static CROSS: Emoji = Emoji("❌ ", "✗ ");
static INFO: Emoji = Emoji("ℹ️  ", "i ");
static WARNING: Emoji = Emoji("⚠️  ", "! ");
static PAGE: Emoji = Emoji("📄 ", "- ");
static SPARKLES: Emoji = Emoji("✨ ", "* ");

/// Console messages. Everything goes to standard output, errors included.
pub struct OutputFormatter {
    mode: OutputMode,
    use_colors: bool,
    verbose_level: u8,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let use_colors = match mode {
            OutputMode::Human => Term::stdout().features().colors_supported() && !quiet,
            _ => false,
        };

        Self {
            mode,
            use_colors,
            verbose_level: if quiet { 0 } else { verbose },
            quiet,
        }
    }

    /// Shown in quiet mode too.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Error, message),
            OutputMode::Json => self.print_json_message("error", message),
            OutputMode::Plain => println!("ERROR: {}", message),
        }
    }

    pub fn warning(&self, message: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Warning, message),
                OutputMode::Json => self.print_json_message("warning", message),
                OutputMode::Plain => println!("WARNING: {}", message),
            }
        }
    }

    pub fn info(&self, message: &str) {
        if self.should_show_message(1) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Info, message),
                OutputMode::Json => self.print_json_message("info", message),
                OutputMode::Plain => println!("INFO: {}", message),
            }
        }
    }

    pub fn debug(&self, message: &str) {
        if self.should_show_message(2) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("  {}", style(message).dim());
                    } else {
                        println!("  DEBUG: {}", message);
                    }
                }
                OutputMode::Json => self.print_json_message("debug", message),
                OutputMode::Plain => println!("DEBUG: {}", message),
            }
        }
    }

    /// Announces the document about to be converted.
    pub fn processing(&self, file: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("{}Processing {}", PAGE, style(file).bold());
                    } else {
                        println!("Processing {}", file);
                    }
                }
                OutputMode::Json => self.print_json_object(&serde_json::json!({
                    "type": "processing",
                    "file": file,
                    "timestamp": chrono::Utc::now().to_rfc3339()
                })),
                OutputMode::Plain => println!("Processing {}", file),
            }
        }
    }

    pub fn print_user_friendly_error(&self, error: &ConvertError) {
        let user_message = error.user_message();
        self.error(&user_message);

        if let Some(suggestion) = error.suggestion() {
            if !self.should_show_message(1) {
                return;
            }

            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!(
                            "{}{}",
                            INFO,
                            style(&format!("Suggestion: {}", suggestion)).cyan()
                        );
                    } else {
                        println!("Suggestion: {}", suggestion);
                    }
                }
                OutputMode::Json => {
                    self.print_json_object(&serde_json::json!({
                        "type": "suggestion",
                        "message": suggestion
                    }));
                }
                OutputMode::Plain => {
                    println!("SUGGESTION: {}", suggestion);
                }
            }
        }
    }

    /// The terminal line of every run; printed in quiet mode as well.
    pub fn print_final_count(&self, report: &ConversionReport) {
        let message = final_count_message(report);

        match self.mode {
            OutputMode::Human => {
                if self.use_colors {
                    println!("{}{}", SPARKLES, style(&message).green().bold());
                } else {
                    println!("{}", message);
                }
            }
            OutputMode::Json => self.print_json_object(&serde_json::json!({
                "type": "finished",
                "message": message,
                "count": report.count(),
                "timestamp": chrono::Utc::now().to_rfc3339()
            })),
            OutputMode::Plain => println!("{}", message),
        }
    }

    /// Detailed figures: always in JSON mode, otherwise only when verbose.
    pub fn print_conversion_summary(&self, report: &ConversionReport) {
        match self.mode {
            OutputMode::Json => {
                self.print_json_object(&serde_json::json!({
                    "type": "report",
                    "report": report
                }));
            }
            OutputMode::Human if self.should_show_message(1) => self.print_human_summary(report),
            OutputMode::Plain if self.should_show_message(1) => self.print_plain_summary(report),
            _ => {}
        }
    }

    pub fn print_dry_run_plan(&self, destination: &Path, tasks: &[FileTask], skipped: &[String]) {
        match self.mode {
            OutputMode::Json => {
                let files: Vec<_> = tasks
                    .iter()
                    .map(|task| {
                        serde_json::json!({
                            "source": task.source_file,
                            "destination": task.dest_file
                        })
                    })
                    .collect();
                self.print_json_object(&serde_json::json!({
                    "type": "plan",
                    "destination": destination,
                    "files": files,
                    "skipped": skipped
                }));
            }
            _ => {
                self.print_header("Dry run");
                println!("Destination: {}", destination.display());
                for task in tasks {
                    println!("  {} -> {}", task.display_source(), task.dest_file.display());
                }
                if !skipped.is_empty() && self.should_show_message(1) {
                    println!("Skipped:");
                    for file in skipped {
                        println!("  {}", file);
                    }
                }
                println!("{} document(s) would be converted", tasks.len());
            }
        }
    }

    pub fn print_header(&self, title: &str) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                if self.use_colors {
                    println!("{} {}", SPARKLES, style(title).bold().cyan());
                } else {
                    println!("=== {} ===", title);
                }
            }
            OutputMode::Json => {
                self.print_json_object(&serde_json::json!({
                    "type": "header",
                    "title": title
                }));
            }
            OutputMode::Plain => {
                println!("=== {} ===", title);
            }
        }
    }

    fn should_show_message(&self, min_verbose_level: u8) -> bool {
        !self.quiet && self.verbose_level >= min_verbose_level
    }

    fn print_human_message(&self, msg_type: MessageType, message: &str) {
        if self.use_colors {
            let (emoji, styled) = match msg_type {
                MessageType::Error => (CROSS, style(message).red().bold()),
                MessageType::Warning => (WARNING, style(message).yellow().bold()),
                MessageType::Info => (INFO, style(message).cyan()),
            };
            println!("{}{}", emoji, styled);
        } else {
            match msg_type {
                MessageType::Error => println!("{}", message),
                MessageType::Warning => println!("! {}", message),
                MessageType::Info => println!("{}", message),
            }
        }
    }

    fn print_json_message(&self, level: &str, message: &str) {
        self.print_json_object(&serde_json::json!({
            "type": "message",
            "level": level,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339()
        }));
    }

    fn print_json_object(&self, obj: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string(obj).unwrap_or_else(|_| "{}".to_string())
        );
    }

    fn print_human_summary(&self, report: &ConversionReport) {
        let value = |v: String| {
            if self.use_colors {
                style(v).cyan().bold().to_string()
            } else {
                v
            }
        };

        println!();
        println!("  Source:      {}", report.source.display());
        println!("  Destination: {}", report.destination.display());
        println!("  Engine:      {}", report.engine);
        println!("  Converted:   {}", value(report.converted.to_string()));
        println!("  Failed:      {}", value(report.failed().to_string()));
        println!("  Skipped:     {}", report.skipped);
        println!("  Lines:       {}", report.lines_written);
        println!("  Time taken:  {}", value(format_duration(report.duration)));

        if !report.release_errors.is_empty() {
            println!("  Release errors: {}", report.release_errors.len());
        }
        if report.cancelled {
            println!("  Cancelled before all documents were converted");
        }
    }

    fn print_plain_summary(&self, report: &ConversionReport) {
        println!("Converted: {}", report.converted);
        println!("Failed: {}", report.failed());
        println!("Skipped: {}", report.skipped);
        println!("Duration: {:?}", report.duration);
        if report.cancelled {
            println!("Cancelled: true");
        }
    }
}

pub fn final_count_message(report: &ConversionReport) -> String {
    format!("All files finished. Count: {}", report.count())
}

#[derive(Debug, Clone, Copy)]
enum MessageType {
    Error,
    Warning,
    Info,
}

/// Routes messages through the progress manager so they do not tear the bar.
pub struct ProgressAwareOutput<'a> {
    formatter: &'a OutputFormatter,
    progress_manager: Option<&'a ProgressManager>,
}

impl<'a> ProgressAwareOutput<'a> {
    pub fn new(
        formatter: &'a OutputFormatter,
        progress_manager: Option<&'a ProgressManager>,
    ) -> Self {
        Self {
            formatter,
            progress_manager,
        }
    }

    pub fn suspend_and_print<F>(&self, f: F)
    where
        F: FnOnce(&OutputFormatter),
    {
        if let Some(pm) = self.progress_manager {
            pm.suspend(|| f(self.formatter));
        } else {
            f(self.formatter);
        }
    }

    pub fn processing(&self, file: &str) {
        self.suspend_and_print(|f| f.processing(file));
    }

    pub fn error(&self, error: &ConvertError) {
        self.suspend_and_print(|f| f.print_user_friendly_error(error));
    }

    pub fn warning(&self, message: &str) {
        self.suspend_and_print(|f| f.warning(message));
    }

    pub fn debug(&self, message: &str) {
        self.suspend_and_print(|f| f.debug(message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::ConversionProgress;
    use std::path::PathBuf;

    #[test]
    fn test_quiet_mode() {
        let formatter = OutputFormatter::new(OutputMode::Human, 2, true);
        assert_eq!(formatter.verbose_level, 0);
        assert!(!formatter.use_colors);
        assert!(!formatter.should_show_message(0));
    }

    #[test]
    fn test_should_show_message() {
        let formatter = OutputFormatter::new(OutputMode::Plain, 1, false);
        assert!(formatter.should_show_message(0));
        assert!(formatter.should_show_message(1));
        assert!(!formatter.should_show_message(2));
    }

    #[test]
    fn test_final_count_message() {
        let mut progress = ConversionProgress::new(3);
        progress.begin_file("a.docx".to_string());
        progress.begin_file("c.doc".to_string());

        let report = ConversionReport::new(
            PathBuf::from("in"),
            PathBuf::from("in"),
            "json".to_string(),
            "ooxml".to_string(),
            chrono::Utc::now(),
            &progress,
            false,
        );

        assert_eq!(final_count_message(&report), "All files finished. Count: 2");
    }
}
