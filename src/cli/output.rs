// Output formatting and display for CLI

use crate::health::HealthStatus;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

/// Width of banners and separators
const SCREEN_WIDTH: usize = 80;

/// Column width of the endpoint in the API listing
const ENDPOINT_WIDTH: usize = 40;

/// Print an error message to stderr
pub fn print_error(error: &str) {
    eprintln!("{} {}", "✗ Error:".red().bold(), error);
}

/// Print a warning message to stderr
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠ Warning:".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Print a success message
pub fn print_success_msg(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Describe the result of a status probe
pub fn render_status(status: &HealthStatus, version: &str) -> String {
    match status {
        HealthStatus::Healthy { status } => format!(
            "{}\n  {}: {}\n  {}: {}",
            "✓ Server is UP".green().bold(),
            "Version".bold(),
            version.cyan(),
            "Status code".bold(),
            status
        ),
        HealthStatus::BadStatus { status } => format!(
            "{} {}",
            "✗ Server is DOWN: responding with status code".red().bold(),
            status
        ),
        HealthStatus::Unreachable { .. } => {
            format!("{}", "✗ Server is DOWN or not responding".red().bold())
        }
    }
}

/// Centered title between two rules
pub fn render_banner(title: &str) -> String {
    let rule = "=".repeat(SCREEN_WIDTH);
    format!(
        "\n{}\n{}\n{}\n",
        rule,
        format!("{:^width$}", title, width = SCREEN_WIDTH).bold(),
        rule
    )
}

/// Numbered table of env settings
pub fn render_settings_table(settings: &[(String, String)]) -> String {
    #[derive(Tabled)]
    struct SettingRow {
        #[tabled(rename = "#")]
        index: usize,
        #[tabled(rename = "Key")]
        key: String,
        #[tabled(rename = "Value")]
        value: String,
    }

    if settings.is_empty() {
        return format!("{}", "No settings defined".yellow());
    }

    let rows: Vec<SettingRow> = settings
        .iter()
        .enumerate()
        .map(|(i, (key, value))| SettingRow {
            index: i + 1,
            key: key.clone(),
            value: truncate(value, 50),
        })
        .collect();

    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));

    table.to_string()
}

/// Format the API endpoints file for display
///
/// `# Title` lines become underlined section headers and
/// `- endpoint - description` lines are laid out in two columns. Anything else
/// is passed through.
pub fn render_endpoints(content: &str) -> String {
    let mut lines = Vec::new();

    for line in content.split('\n') {
        if line.starts_with('#') {
            let title = line.get(2..).unwrap_or("");
            lines.push(String::new());
            lines.push(title.blue().bold().to_string());
            lines.push("-".repeat(title.chars().count()));
        } else if line.starts_with('-') {
            let item = line.get(2..).unwrap_or("");
            match item.split_once(" - ") {
                Some((endpoint, description)) => lines.push(format!(
                    "{} {}",
                    format!("{:<width$}", endpoint, width = ENDPOINT_WIDTH)
                        .green()
                        .bold(),
                    description
                )),
                None => lines.push(item.to_string()),
            }
        } else {
            lines.push(line.to_string());
        }
    }

    lines.join("\n")
}

/// Print the endpoint listing between banners
pub fn print_endpoints(content: &str) {
    println!("{}", render_banner("API ENDPOINTS"));
    println!("{}", render_endpoints(content));
    println!("\n{}\n", "=".repeat(SCREEN_WIDTH));
}

/// Truncate a string to a maximum length
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}

/// Create a spinner for operations that wait on the network
pub fn create_progress_bar(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Clear a spinner so the final result can be printed in its place
pub fn finish_progress(pb: ProgressBar) {
    pb.finish_and_clear();
}
