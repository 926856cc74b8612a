//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Render a percentage pair as "measured% / target%"
pub fn format_percent_pair(measured: f64, target: f64) -> String {
    format!("{:.1}% / {:.1}%", measured, target)
}

/// Format a megabyte count
pub fn format_mb(mb: f64) -> String {
    if mb >= 1024.0 {
        format!("{:.2}GiB", mb / 1024.0)
    } else {
        format!("{:.1}MiB", mb)
    }
}
