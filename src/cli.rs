//! Command-line interface for inspecting and exercising the log

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config::{config_file_path, LoggerConfig};
use crate::logging::{LogLevel, Logger};

#[derive(Parser, Debug)]
#[command(name = "yamlog")]
#[command(about = "Inspect and drive the YAM Launcher event log")]
pub struct Cli {
    /// Config file (defaults to <data dir>/yamlauncher/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the log directory from the config
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Do not mirror entries to stderr
    #[arg(long, short, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Print the active log (or the rotated backup)
    Show {
        #[arg(long)]
        backup: bool,
    },
    /// Print the active log size in bytes
    Size,
    /// Print the active and backup log paths
    Path,
    /// Reset the log to a fresh header
    Clear,
    /// Append one entry
    Log {
        #[arg(long, short, default_value = "info")]
        level: LogLevel,
        tag: String,
        message: String,
    },
    /// Log from several threads at once and report what landed on disk
    Stress {
        #[arg(long, default_value_t = 4)]
        threads: usize,
        #[arg(long, default_value_t = 1000)]
        count: usize,
        #[arg(long, default_value = "Stress")]
        tag: String,
    },
}

impl Cli {
    /// Resolve the logger configuration from the config file and flags
    pub fn logger_config(&self) -> Result<LoggerConfig> {
        let path = self.config.clone().unwrap_or_else(config_file_path);
        let mut config = LoggerConfig::load_from(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        if let Some(dir) = &self.log_dir {
            config.log_dir = dir.clone();
        }
        if self.quiet {
            config.console_mirror = false;
        }
        Ok(config)
    }
}

/// Run a parsed command against `out`, shutting the logger down before returning
pub fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
    let config = cli.logger_config()?;
    let logger = Arc::new(Logger::new(config));
    let result = execute(&cli.command, &logger, out);
    logger.shutdown();
    result
}

fn execute(command: &Command, logger: &Arc<Logger>, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Show { backup } => {
            let content = if *backup {
                logger.backup_content()
            } else {
                logger.log_content()
            };
            out.write_all(content.as_bytes())?;
        }
        Command::Size => {
            writeln!(out, "{}", logger.log_file_size())?;
        }
        Command::Path => {
            writeln!(out, "{}", logger.paths().active.display())?;
            writeln!(out, "{}", logger.paths().backup.display())?;
        }
        Command::Clear => {
            logger.clear_logs();
            logger.flush();
            writeln!(out, "cleared {}", logger.paths().active.display())?;
        }
        Command::Log {
            level,
            tag,
            message,
        } => {
            logger.log(*level, tag, message.as_str(), None);
        }
        Command::Stress {
            threads,
            count,
            tag,
        } => {
            let count = *count;
            let handles: Vec<_> = (0..*threads)
                .map(|t| {
                    let logger = Arc::clone(logger);
                    let tag = tag.clone();
                    thread::spawn(move || {
                        for i in 0..count {
                            logger.debug(&tag, format!("thread {} entry {}", t, i));
                        }
                    })
                })
                .collect();

            for handle in handles {
                if handle.join().is_err() {
                    anyhow::bail!("stress thread panicked");
                }
            }
            logger.flush();

            writeln!(
                out,
                "wrote {} entries, active log is {} bytes",
                threads * count,
                logger.log_file_size()
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("yamlog").chain(args.iter().copied())).unwrap()
    }

    fn run_in(temp_dir: &TempDir, args: &[&str]) -> String {
        let config = temp_dir.path().join("config.toml");
        let log_dir = temp_dir.path().join("logs");
        let mut full = vec![
            "--quiet",
            "--config",
            config.to_str().unwrap(),
            "--log-dir",
            log_dir.to_str().unwrap(),
        ];
        full.extend_from_slice(args);

        let mut out = Vec::new();
        run(parse(&full), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_log_command() {
        let cli = parse(&["log", "--level", "warn", "Weather", "no network"]);
        assert_eq!(
            cli.command,
            Command::Log {
                level: LogLevel::Warn,
                tag: "Weather".to_string(),
                message: "no network".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_rejects_unknown_level() {
        let result = Cli::try_parse_from(["yamlog", "log", "--level", "verbose", "T", "m"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, "max_entries = 7\n").unwrap();

        let cli = parse(&[
            "-q",
            "--config",
            config_path.to_str().unwrap(),
            "--log-dir",
            "/tmp/elsewhere",
            "size",
        ]);
        let config = cli.logger_config().unwrap();

        assert_eq!(config.max_entries, 7);
        assert_eq!(config.log_dir, PathBuf::from("/tmp/elsewhere"));
        assert!(!config.console_mirror);
    }

    #[test]
    fn test_log_then_show() {
        let temp_dir = TempDir::new().unwrap();

        run_in(&temp_dir, &["log", "Settings", "theme changed"]);
        let shown = run_in(&temp_dir, &["show"]);

        assert!(shown.contains("YAM Launcher Log File"));
        assert!(shown.ends_with("INFO/Settings: theme changed\n"));
    }

    #[test]
    fn test_clear_then_size() {
        let temp_dir = TempDir::new().unwrap();
        run_in(&temp_dir, &["log", "-l", "error", "Lock", "service died"]);

        let cleared = run_in(&temp_dir, &["clear"]);
        assert!(cleared.starts_with("cleared "));

        let shown = run_in(&temp_dir, &["show"]);
        assert!(!shown.contains("service died"));
        let size: u64 = run_in(&temp_dir, &["size"]).trim().parse().unwrap();
        assert_eq!(size, shown.len() as u64);
    }

    #[test]
    fn test_stress_writes_every_entry() {
        let temp_dir = TempDir::new().unwrap();

        let report = run_in(&temp_dir, &["stress", "--threads", "3", "--count", "40"]);
        assert!(report.starts_with("wrote 120 entries"));

        let shown = run_in(&temp_dir, &["show"]);
        assert_eq!(shown.matches("DEBUG/Stress: thread ").count(), 120);
    }

    #[test]
    fn test_path_lists_both_files() {
        let temp_dir = TempDir::new().unwrap();
        let paths = run_in(&temp_dir, &["path"]);
        let lines: Vec<&str> = paths.lines().collect();

        assert!(lines[0].ends_with("yam_launcher.log"));
        assert!(lines[1].ends_with("yam_launcher.log.old"));
    }
}
