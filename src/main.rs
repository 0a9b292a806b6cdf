use anyhow::Context;
use std::path::{Path, PathBuf};
use std::process;
use word2json::{Cli, ConvertError, OutputFormatter, OutputMode, UserFriendlyError, Word2Json};

fn main() {
    let exit_code = run();
    process::exit(exit_code);
}

fn run() -> i32 {
    let cli = Cli::parse_lenient();

    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let word2json = match Word2Json::from_cli(&cli) {
        Ok(word2json) => word2json,
        Err(e) => {
            print_startup_error(&e);
            return 1;
        }
    };

    let source = cli.source_arg().map(Path::new);

    if cli.dry_run {
        return handle_dry_run(&word2json, source);
    }

    match word2json.run(source) {
        Ok(report) => {
            word2json.print_report(&report);

            if report.cancelled {
                130 // Interrupted (SIGINT)
            } else {
                0
            }
        }
        Err(e) => {
            word2json.handle_error(&e);

            match e {
                // reported like any other run outcome
                ConvertError::InvalidSource { .. } => 0,
                ConvertError::Cancelled => 130,
                _ => 1,
            }
        }
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("word2json.toml"));

    match write_sample_config(&config_path) {
        Ok(()) => {
            println!(
                "Generated sample configuration file: {}",
                config_path.display()
            );
            println!("\nTo use this configuration:");
            println!("  word2json -s <folder> --config {}", config_path.display());
            println!("\nEdit the file to customize settings for your needs.");
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {:#}", e);
            1
        }
    }
}

fn write_sample_config(path: &Path) -> anyhow::Result<()> {
    Word2Json::generate_sample_config(path)
        .with_context(|| format!("cannot write {}", path.display()))
}

fn handle_dry_run(word2json: &Word2Json, source: Option<&Path>) -> i32 {
    match word2json.plan(source) {
        Ok(plan) => {
            word2json.print_plan(&plan);
            0
        }
        Err(e) => {
            word2json.handle_error(&e);
            match e {
                ConvertError::InvalidSource { .. } => 0,
                _ => 1,
            }
        }
    }
}

fn print_startup_error(error: &ConvertError) {
    let formatter = OutputFormatter::new(OutputMode::Human, 1, false);
    formatter.print_user_friendly_error(error);
    if error.suggestion().is_none() {
        formatter.info("Run with --help for usage.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_generate_config_command() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");
        let cli = Cli::try_parse_lenient([
            "word2json",
            "--generate-config",
            "--config",
            config_path.to_str().unwrap(),
        ])
        .unwrap();

        assert_eq!(handle_generate_config(&cli), 0);

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[engine]"));
    }

    #[test]
    fn test_generate_config_into_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("missing").join("test.toml");
        let cli = Cli::try_parse_lenient([
            "word2json",
            "--generate-config",
            "--config",
            config_path.to_str().unwrap(),
        ])
        .unwrap();

        assert_eq!(handle_generate_config(&cli), 1);
    }
}
