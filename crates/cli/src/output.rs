//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Pretty-print any response as JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Render rows as a rounded table
pub fn print_table<T: Tabled>(rows: Vec<T>) {
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format a fraction as a percentage
pub fn format_percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

/// Format a signed factor contribution
pub fn format_contribution(feature: &str, contribution: f64) -> String {
    format!("{} ({:+.3})", feature, contribution)
}

/// Format an RFC 3339 timestamp for table output
pub fn format_timestamp(ts: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(ts) {
        dt.format("%Y-%m-%d %H:%M").to_string()
    } else {
        ts.to_string()
    }
}

/// Color a risk score by band
pub fn color_risk(score: f64) -> String {
    let formatted = format!("{:.3}", score);
    if score >= 0.8 {
        formatted.red().bold().to_string()
    } else if score >= 0.5 {
        formatted.yellow().to_string()
    } else {
        formatted.green().to_string()
    }
}

/// Color a ranking metric where higher is better
pub fn color_metric(value: f64) -> String {
    let formatted = format!("{:.3}", value);
    if value >= 0.8 {
        formatted.green().to_string()
    } else if value >= 0.6 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(0.25), "25.0%");
        assert_eq!(format_percent(0.0), "0.0%");
    }

    #[test]
    fn test_format_contribution_sign() {
        assert_eq!(format_contribution("errorRate", 1.23456), "errorRate (+1.235)");
        assert_eq!(format_contribution("avgCpuPct", -0.5), "avgCpuPct (-0.500)");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp("2024-06-01T09:50:00Z"), "2024-06-01 09:50");
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }

    #[test]
    fn test_color_risk_keeps_value() {
        colored::control::set_override(false);
        assert_eq!(color_risk(0.912), "0.912");
        assert_eq!(color_metric(0.5), "0.500");
    }
}
