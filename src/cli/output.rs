//! Colored output helpers for the CLI
//!
//! Every printer has a plain fallback so output stays readable when piped or
//! when `--no-color` is passed.

use crate::types::{Investor, RunRecord, RunStatus, Step};
use owo_colors::OwoColorize;

/// Width of a table column before truncation.
const COLUMN_WIDTH: usize = 28;

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    pub fn new() -> Self {
        Self { colored: true }
    }

    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Print a success message with a checkmark
    pub fn success(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "✓".green().bold(), message.green());
        } else {
            println!("  [OK] {}", message);
        }
    }

    pub fn info(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "•".blue(), message);
        } else {
            println!("  [INFO] {}", message);
        }
    }

    pub fn warning(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            println!("  [WARN] {}", message);
        }
    }

    /// Print an error message to stderr
    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    /// Print a header for a section
    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    pub fn subheader(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.cyan().bold());
        } else {
            println!("\n  --- {} ---", title);
        }
    }

    /// Print a key-value pair
    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    pub fn list_item(&self, item: &str) {
        if self.colored {
            println!("    {} {}", "•".blue(), item);
        } else {
            println!("    - {}", item);
        }
    }

    /// Print a hint/tip message
    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {}", message.dimmed().italic());
        } else {
            println!("\n  [TIP] {}", message);
        }
    }

    /// Status label colored by outcome
    pub fn status_label(&self, status: RunStatus) -> String {
        let label = status.as_str();
        if !self.colored {
            return label.to_uppercase();
        }
        match status {
            RunStatus::Succeeded => label.green().bold().to_string(),
            RunStatus::Failed => label.red().bold().to_string(),
            RunStatus::Running => label.yellow().to_string(),
            RunStatus::Pending => label.dimmed().to_string(),
        }
    }

    /// Print the step catalogue of a run, marking steps that never ran.
    pub fn steps(&self, run: &RunRecord) {
        for step in Step::ALL {
            match run.step_status(step) {
                Some(status) => {
                    println!("    {:<16} {}", step.as_str(), self.status_label(status))
                }
                None if self.colored => {
                    println!("    {:<16} {}", step.as_str().dimmed(), "skipped".dimmed())
                }
                None => println!("    {:<16} -", step.as_str()),
            }
        }
    }

    /// Print investors as a fixed-width table.
    pub fn investors(&self, investors: &[Investor]) {
        self.table_header(&["Name", "Website", "Location", "Source"]);
        for investor in investors {
            let name = if investor.is_warm_lead {
                format!("{} *", investor.name)
            } else {
                investor.name.clone()
            };
            self.table_row(&[
                &name,
                investor.website.as_deref().unwrap_or("-"),
                investor.location.as_deref().unwrap_or("-"),
                investor.source.as_deref().unwrap_or("-"),
            ]);
        }
    }

    /// Print a table header row
    pub fn table_header(&self, columns: &[&str]) {
        let header = render_row(columns);
        let rule_width = columns.len() * (COLUMN_WIDTH + 1);
        if self.colored {
            println!("    {}", header.bright_white().bold());
            println!("    {}", "─".repeat(rule_width).dimmed());
        } else {
            println!("    {}", header);
            println!("    {}", "-".repeat(rule_width));
        }
    }

    pub fn table_row(&self, values: &[&str]) {
        println!("    {}", render_row(values));
    }

    pub fn newline(&self) {
        println!();
    }
}

fn render_row(values: &[&str]) -> String {
    values
        .iter()
        .map(|v| format!("{:<width$}", truncate(v, COLUMN_WIDTH), width = COLUMN_WIDTH))
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut cut: String = value.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
