// Interactive terminal editor for env settings and versions

use crate::cli::commands::{self, EnvSync};
use crate::cli::output;
use crate::config::Config;
use crate::error::{Result, WardenError};
use crate::health::HealthProbe;
use crate::version::{env_file, VersionStore};
use colored::*;
use std::io::{BufRead, Write};

/// ANSI sequence clearing the screen and homing the cursor
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Menu-driven editor over any line input and any output
///
/// Settings are edited on a draft; the env file is only written on save,
/// keeping comments and the original order of the file.
pub struct SettingsEditor<R, W> {
    config: Config,
    settings: Vec<(String, String)>,
    input: R,
    out: W,
}

impl<R: BufRead, W: Write> SettingsEditor<R, W> {
    /// Load the env settings, creating a default env file first if missing
    pub fn new(config: &Config, input: R, out: W) -> Result<Self> {
        let mut editor = Self {
            config: config.clone(),
            settings: Vec::new(),
            input,
            out,
        };
        editor.load_settings()?;
        Ok(editor)
    }

    pub fn settings(&self) -> &[(String, String)] {
        &self.settings
    }

    fn load_settings(&mut self) -> Result<()> {
        let path = self.config.env_file();
        if !path.exists() {
            writeln!(self.out, "No env file found. Creating a default one...")?;
            commands::create_env_file(&self.config)?;
        }

        let content = std::fs::read_to_string(&path).map_err(|e| {
            WardenError::EnvFileError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        self.settings = env_file::parse_settings(&content);
        Ok(())
    }

    /// Top-level menu; returns on `0` or end of input
    pub async fn main_menu(&mut self) -> Result<()> {
        loop {
            write!(self.out, "{}", CLEAR_SCREEN)?;
            writeln!(self.out, "{}", output::render_banner("TERMINAL SYSTEM EDITOR"))?;
            writeln!(self.out, "1. Edit Environment Settings")?;
            writeln!(self.out, "2. View API Endpoints")?;
            writeln!(self.out, "3. Check Server Status")?;
            writeln!(self.out, "4. Update Version")?;
            writeln!(self.out, "0. Exit")?;

            let Some(choice) = self.prompt("\nEnter your choice: ")? else {
                return Ok(());
            };

            match choice.trim() {
                "1" => self.edit_settings()?,
                "2" => {
                    self.view_endpoints()?;
                    self.pause()?;
                }
                "3" => {
                    self.show_status().await?;
                    self.pause()?;
                }
                "4" => {
                    self.update_version()?;
                    self.pause()?;
                }
                "0" => return Ok(()),
                _ => {}
            }
        }
    }

    /// Settings submenu: add, edit, delete, save or quit
    pub fn edit_settings(&mut self) -> Result<()> {
        let mut draft = self.settings.clone();

        loop {
            write!(self.out, "{}", CLEAR_SCREEN)?;
            writeln!(self.out, "{}", output::render_banner("ENVIRONMENT SETTINGS EDITOR"))?;
            writeln!(self.out, "Current Settings:")?;
            writeln!(self.out, "{}", output::render_settings_table(&draft))?;
            writeln!(self.out, "\nOptions:")?;
            writeln!(self.out, "A. Add new setting")?;
            writeln!(self.out, "E. Edit setting")?;
            writeln!(self.out, "D. Delete setting")?;
            writeln!(self.out, "S. Save changes")?;
            writeln!(self.out, "Q. Quit without saving")?;

            let Some(choice) = self.prompt("\nEnter your choice: ")? else {
                return Ok(());
            };

            match choice.trim().to_uppercase().as_str() {
                "A" => {
                    let key = self.prompt("Enter new setting name: ")?.unwrap_or_default();
                    let key = key.trim();
                    if !key.is_empty() {
                        let value = self
                            .prompt(&format!("Enter value for {}: ", key))?
                            .unwrap_or_default();
                        match draft.iter_mut().find(|(k, _)| k.as_str() == key) {
                            Some(entry) => entry.1 = value.clone(),
                            None => draft.push((key.to_string(), value.clone())),
                        }
                        writeln!(self.out, "Added {}={}", key, value)?;
                        self.pause()?;
                    }
                }
                "E" => {
                    if let Some(index) = self.select_setting(&draft, "edit")? {
                        let (key, current) = draft[index].clone();
                        let message =
                            format!("Enter new value for {} (current: {}): ", key, current);
                        let value = self.prompt(&message)?.unwrap_or_default();
                        draft[index].1 = value.clone();
                        writeln!(self.out, "Updated {}={}", key, value)?;
                    }
                    self.pause()?;
                }
                "D" => {
                    if let Some(index) = self.select_setting(&draft, "delete")? {
                        let key = draft[index].0.clone();
                        let confirm = self
                            .prompt(&format!("Are you sure you want to delete {}? (y/n): ", key))?
                            .unwrap_or_default();
                        if confirm.trim().eq_ignore_ascii_case("y") {
                            draft.remove(index);
                            writeln!(self.out, "Deleted {}", key)?;
                        }
                    }
                    self.pause()?;
                }
                "S" => {
                    match self.save_settings(&draft) {
                        Ok(()) => {
                            self.settings = draft;
                            writeln!(self.out, "{}", "Settings saved successfully!".green())?;
                        }
                        Err(e) => writeln!(self.out, "{} {}", "Error saving settings:".red(), e)?,
                    }
                    self.pause()?;
                    return Ok(());
                }
                "Q" => {
                    let confirm = self.prompt("Discard changes? (y/n): ")?.unwrap_or_default();
                    if confirm.trim().eq_ignore_ascii_case("y") {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
    }

    /// Ask for a 1-based setting number; `None` after reporting bad input
    fn select_setting(
        &mut self,
        draft: &[(String, String)],
        action: &str,
    ) -> Result<Option<usize>> {
        let answer = self
            .prompt(&format!("Enter setting number to {}: ", action))?
            .unwrap_or_default();

        match answer.trim().parse::<usize>() {
            Ok(n) if (1..=draft.len()).contains(&n) => Ok(Some(n - 1)),
            Ok(_) => {
                writeln!(self.out, "Invalid setting number")?;
                Ok(None)
            }
            Err(_) => {
                writeln!(self.out, "Please enter a valid number")?;
                Ok(None)
            }
        }
    }

    fn save_settings(&self, draft: &[(String, String)]) -> Result<()> {
        let path = self.config.env_file();
        let original = if path.exists() {
            std::fs::read_to_string(&path)?
        } else {
            String::new()
        };

        std::fs::write(&path, env_file::apply_settings(&original, draft)).map_err(|e| {
            WardenError::EnvFileError(format!("Failed to write {}: {}", path.display(), e))
        })
    }

    fn view_endpoints(&mut self) -> Result<()> {
        let path = self.config.endpoints_file();
        if !path.exists() {
            writeln!(self.out, "API endpoints file not found.")?;
            return Ok(());
        }

        let content = std::fs::read_to_string(&path)?;
        writeln!(self.out, "{}", output::render_banner("API ENDPOINTS"))?;
        writeln!(self.out, "{}", output::render_endpoints(&content))?;
        Ok(())
    }

    async fn show_status(&mut self) -> Result<()> {
        let probe = HealthProbe::from_config(&self.config)?;
        let version = VersionStore::from_config(&self.config).read_persisted()?;
        let status = probe.check().await;
        writeln!(self.out, "{}", output::render_status(&status, &version))?;
        Ok(())
    }

    fn update_version(&mut self) -> Result<()> {
        let version = self.prompt("Enter new version (x.y.z): ")?;
        let request = match commands::request_version(&self.config, version.as_deref()) {
            Ok(request) => request,
            Err(e) => {
                writeln!(self.out, "{} {}", "✗ Error:".red().bold(), e)?;
                return Ok(());
            }
        };

        writeln!(
            self.out,
            "{} Version file updated to {}. The supervisor will apply the change.",
            "✓".green().bold(),
            request.version
        )?;
        match request.env_sync {
            EnvSync::Updated => {
                writeln!(self.out, "{} Updated version in env file", "✓".green().bold())?
            }
            EnvSync::Missing => {}
            EnvSync::Failed(e) => writeln!(
                self.out,
                "{} Could not update env file: {}",
                "⚠ Warning:".yellow().bold(),
                e
            )?,
        }
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.prompt("\nPress Enter to continue...")?;
        Ok(())
    }

    /// Print `message` and read one line; `None` at end of input
    fn prompt(&mut self, message: &str) -> Result<Option<String>> {
        write!(self.out, "{}", message)?;
        self.out.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}
