//! Init command implementation
//!
//! Writes a starter `jockey.toml`, `.env.example` and `.gitignore`, and
//! creates the runs and exports directories.

use super::output::Output;
use crate::utils::toml_config::JockeyConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of the init operation
#[derive(Debug, PartialEq, Eq)]
pub enum InitResult {
    Success,
    /// jockey.toml exists and `--force` was not given
    AlreadyExists,
    Error(String),
}

pub struct InitConfig {
    pub path: PathBuf,
    pub force: bool,
    /// Turn on Apollo mock mode in the generated file
    pub mock: bool,
}

/// Run the init command
pub fn run(config: &InitConfig, output: &Output) -> InitResult {
    output.header("Initializing Jockey");

    let base = &config.path;
    let config_path = base.join("jockey.toml");
    if config_path.exists() && !config.force {
        output.warning("jockey.toml already exists");
        output.hint("Use --force to overwrite existing files");
        return InitResult::AlreadyExists;
    }

    let defaults = JockeyConfig::default();
    for dir in [&defaults.storage.runs_dir, &defaults.storage.exports_dir] {
        let dir_path = base.join(dir);
        if dir_path.exists() {
            output.info(&format!("{} already exists", dir.display()));
            continue;
        }
        if let Err(e) = fs::create_dir_all(&dir_path) {
            output.error(&format!("Failed to create {}: {}", dir.display(), e));
            return InitResult::Error(e.to_string());
        }
        output.success(&format!("created directory {}", dir.display()));
    }

    let files = [
        ("jockey.toml", generate_jockey_toml(config.mock), config.force),
        (".env.example", generate_env_example(&defaults), config.force),
        (".gitignore", generate_gitignore(), false),
    ];
    for (name, content, overwrite) in files {
        match write_file(&base.join(name), &content, overwrite) {
            Ok(true) => output.success(&format!("created {}", name)),
            Ok(false) => output.info(&format!("kept existing {}", name)),
            Err(e) => {
                output.error(&format!("Failed to write {}: {}", name, e));
                return InitResult::Error(e.to_string());
            }
        }
    }

    output.header("Next Steps");
    output.list_item("cp .env.example .env and fill in the API keys");
    output.list_item("jockey config --validate");
    output.list_item("jockey orchestrate \"seed fintech investors in Berlin\"");

    InitResult::Success
}

/// Returns `false` when an existing file was left untouched.
fn write_file(path: &Path, content: &str, overwrite: bool) -> std::io::Result<bool> {
    if path.exists() && !overwrite {
        return Ok(false);
    }
    fs::write(path, content)?;
    Ok(true)
}

fn generate_jockey_toml(mock: bool) -> String {
    format!(
        r#"# Jockey configuration
# Secrets are read from the environment variables named by *_env keys.

[logging]
level = "info"       # overridden by RUST_LOG
format = "pretty"    # or "json"

[storage]
backend = "file"     # or "memory"
runs_dir = "./runs"
exports_dir = "./exports"

[orchestration]
step_timeout_secs = 60
# "fail_run" fails the whole run when calendar, email_draft or
# create_project fails; "degrade" records the step as failed and continues.
optional_step_failure = "fail_run"

[openai]
api_key_env = "OPENAI_API_KEY"
api_base = "https://api.openai.com/v1"
model = "gpt-4o-mini"
temperature = 0.1

[airtable]
api_key_env = "AIRTABLE_API_KEY"
base_id_env = "AIRTABLE_BASE_ID"
investors_table = "Investors"
projects_table = "Projects"
project_field = "Project Tag"

[apollo]
api_key_env = "APOLLO_API_KEY"
enable_mock = {mock}
per_page_cap = 25

[calendar]
slot_hours = [9, 13, 17]
slot_minutes = 30
timezone = "UTC"
"#
    )
}

fn generate_env_example(defaults: &JockeyConfig) -> String {
    format!(
        "# Copy to .env and fill in\n{}=\n{}=\n{}=\n{}=\n# APOLLO_ENABLE_MOCK=1\n# RUST_LOG=jockey=debug\n",
        defaults.openai.api_key_env,
        defaults.airtable.api_key_env,
        defaults.airtable.base_id_env,
        defaults.apollo.api_key_env,
    )
}

fn generate_gitignore() -> String {
    "/target\n.env\n/runs\n/exports\n".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn init_config(dir: &TempDir, force: bool) -> InitConfig {
        InitConfig {
            path: dir.path().to_path_buf(),
            force,
            mock: true,
        }
    }

    #[test]
    fn test_generated_toml_parses_and_validates() {
        let config: JockeyConfig = toml::from_str(&generate_jockey_toml(true)).unwrap();
        assert!(config.apollo.enable_mock);
        assert!(config.validate().is_ok());

        let config: JockeyConfig = toml::from_str(&generate_jockey_toml(false)).unwrap();
        assert!(!config.apollo.enable_mock);
    }

    #[test]
    fn test_init_creates_files() {
        let dir = TempDir::new().unwrap();
        let result = run(&init_config(&dir, false), &Output::no_color());

        assert_eq!(result, InitResult::Success);
        assert!(dir.path().join("jockey.toml").exists());
        assert!(dir.path().join(".env.example").exists());
        assert!(dir.path().join(".gitignore").exists());
        assert!(dir.path().join("runs").is_dir());
        assert!(dir.path().join("exports").is_dir());

        let env = fs::read_to_string(dir.path().join(".env.example")).unwrap();
        assert!(env.contains("OPENAI_API_KEY="));
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("jockey.toml"), "# mine").unwrap();

        assert_eq!(
            run(&init_config(&dir, false), &Output::no_color()),
            InitResult::AlreadyExists
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("jockey.toml")).unwrap(),
            "# mine"
        );

        assert_eq!(
            run(&init_config(&dir, true), &Output::no_color()),
            InitResult::Success
        );
        assert_ne!(
            fs::read_to_string(dir.path().join("jockey.toml")).unwrap(),
            "# mine"
        );
    }

    #[test]
    fn test_existing_gitignore_is_kept() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".gitignore"), "custom\n").unwrap();

        run(&init_config(&dir, true), &Output::no_color());
        assert_eq!(
            fs::read_to_string(dir.path().join(".gitignore")).unwrap(),
            "custom\n"
        );
    }
}
