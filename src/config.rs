use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cli::{HistoryArgs, ReportArgs, RunArgs};
use crate::error::{Error, Result};

pub const HISTORY_FILE: &str = "sizing_history.csv";
pub const LOG_FILE: &str = "sizemon.log";

const DEFAULT_API_URL: &str = "https://localhost:55000";

/// Directories that get a column in the history table when they exist.
/// Mirrors the layout of a stock Wazuh manager host.
const DEFAULT_DIRS: &[(&str, &str)] = &[
    ("var", "/var"),
    ("var_log", "/var/log"),
    ("var_lib", "/var/lib"),
    ("var_ossec", "/var/ossec"),
    ("root", "/"),
    ("usr", "/usr"),
    ("home", "/home"),
    ("opt", "/opt"),
];

#[derive(Debug, Clone)]
pub struct MonitoredDir {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Read API credentials from the environment, loading `.env` first if
    /// one is present. Missing variables fail fast before any collection.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let username = env::var("WAZUH_USER")
            .map_err(|_| Error::Configuration("WAZUH_USER is not set".to_string()))?;
        let password = env::var("WAZUH_PASS")
            .map_err(|_| Error::Configuration("WAZUH_PASS is not set".to_string()))?;

        Ok(Credentials { username, password })
    }
}

#[derive(Debug)]
pub struct Config {
    pub dirs: Vec<MonitoredDir>,
    pub api_url: String,
    pub verify_tls: bool,
    pub output_dir: PathBuf,
    pub credentials: Option<Credentials>,
    pub collect_agents: bool,
    pub require_agents: bool,
    pub verbose: bool,
}

/// On-disk config file schema. Every field is optional; defaults cover a
/// stock single-host deployment.
#[derive(Deserialize, Default)]
struct FileConfig {
    api_url: Option<String>,
    output_dir: Option<PathBuf>,
    verify_tls: Option<bool>,
    #[serde(default)]
    dirs: Vec<FileDir>,
}

#[derive(Deserialize)]
struct FileDir {
    name: String,
    path: PathBuf,
}

impl Config {
    pub fn from_run_args(args: &RunArgs) -> Result<Self> {
        let mut config = Config::load(args.config.as_deref(), args.output.as_deref(), args.verbose)?;
        config.collect_agents = !args.no_agents;
        config.require_agents = args.require_agents;

        if config.collect_agents {
            config.credentials = Some(Credentials::from_env()?);
        }

        Ok(config)
    }

    pub fn from_report_args(args: &ReportArgs) -> Result<Self> {
        Config::load(args.config.as_deref(), args.output.as_deref(), args.verbose)
    }

    pub fn from_history_args(args: &HistoryArgs) -> Result<Self> {
        Config::load(args.config.as_deref(), args.output.as_deref(), false)
    }

    /// Build a config from the file (explicit path, or the default location
    /// if it exists) with CLI overrides applied on top.
    pub fn load(config_path: Option<&Path>, output: Option<&Path>, verbose: bool) -> Result<Self> {
        let file = match config_path {
            Some(path) => read_config_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => read_config_file(&path)?,
                _ => FileConfig::default(),
            },
        };

        let dirs = if file.dirs.is_empty() {
            default_dirs()
        } else {
            file.dirs
                .into_iter()
                .map(|d| MonitoredDir { name: d.name, path: d.path })
                .collect()
        };
        validate_dir_names(&dirs)?;

        let output_dir = match output {
            Some(path) => path.to_path_buf(),
            None => match file.output_dir {
                Some(path) => path,
                None => default_output_dir()?,
            },
        };

        Ok(Config {
            dirs,
            api_url: file.api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            verify_tls: file.verify_tls.unwrap_or(false),
            output_dir,
            credentials: None,
            collect_agents: false,
            require_agents: false,
            verbose,
        })
    }

    pub fn history_path(&self) -> PathBuf {
        self.output_dir.join(HISTORY_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.output_dir.join(LOG_FILE)
    }
}

fn read_config_file(path: &Path) -> Result<FileConfig> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        Error::Configuration(format!("cannot read config file {}: {e}", path.display()))
    })?;

    toml::from_str(&text).map_err(|e| {
        Error::Configuration(format!("cannot parse config file {}: {e}", path.display()))
    })
}

/// Built-in monitored set, filtered to the directories present on this host.
fn default_dirs() -> Vec<MonitoredDir> {
    DEFAULT_DIRS
        .iter()
        .filter(|(_, path)| Path::new(path).exists())
        .map(|(name, path)| MonitoredDir {
            name: (*name).to_string(),
            path: PathBuf::from(path),
        })
        .collect()
}

/// Directory names become CSV column names, so they must be usable there.
fn validate_dir_names(dirs: &[MonitoredDir]) -> Result<()> {
    for dir in dirs {
        if dir.name.is_empty() || dir.name.contains(',') || dir.name.contains(char::is_whitespace) {
            return Err(Error::Configuration(format!(
                "invalid directory name {:?}: names must be non-empty and contain no commas or whitespace",
                dir.name
            )));
        }
    }
    Ok(())
}

fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "sizemon")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Default output location (~/.local/share/sizemon or platform equivalent)
fn default_output_dir() -> Result<PathBuf> {
    directories::ProjectDirs::from("", "", "sizemon")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| Error::Configuration("could not determine data directory".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_without_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load(None, Some(tmp.path()), false).unwrap();

        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(!config.verify_tls);
        assert_eq!(config.output_dir, tmp.path());
        // defaults are filtered to existing paths, so every entry must exist
        assert!(config.dirs.iter().all(|d| d.path.exists()));
    }

    #[test]
    fn file_values_and_cli_overrides() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
api_url = "https://siem.example.net:55000"
output_dir = "/srv/monitor"
verify_tls = true

[[dirs]]
name = "var"
path = "/var"

[[dirs]]
name = "backups"
path = "/srv/backups"
"#
        )
        .unwrap();

        let override_out = tmp.path().join("out");
        let config = Config::load(Some(config_path.as_path()), Some(override_out.as_path()), true).unwrap();

        assert_eq!(config.api_url, "https://siem.example.net:55000");
        assert!(config.verify_tls);
        // cli --output wins over the file's output_dir
        assert_eq!(config.output_dir, override_out);
        assert_eq!(config.dirs.len(), 2);
        assert_eq!(config.dirs[1].name, "backups");
        assert!(config.verbose);
    }

    #[test]
    fn rejects_dir_name_unusable_as_column() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(
            &config_path,
            "[[dirs]]\nname = \"var log\"\npath = \"/var/log\"\n",
        )
        .unwrap();

        let err = Config::load(Some(config_path.as_path()), Some(tmp.path()), false).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn missing_config_file_is_fatal() {
        let err = Config::load(Some(Path::new("/nonexistent/config.toml")), None, false).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
