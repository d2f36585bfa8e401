use crate::audit::ExecutionMode;
use clap::{Parser, ValueEnum, ValueHint, value_parser};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use url::Url;

/// Default values used throughout the project.
pub mod defaults {
    /// Number of workers used for concurrent audits.
    pub const WORKERS: u8 = 5;

    /// The PageSpeed Insights endpoint every audit is sent to.
    pub const ENDPOINT: &str = "https://www.googleapis.com/pagespeedonline/v5/runPagespeed";

    /// The default user agent header value used for network requests.
    pub const USER_AGENT: &str = concat!(
        "Mozilla/5.0 (compatible; PageSpeedAudit/",
        env!("CARGO_PKG_VERSION"),
        ")"
    );

    /// Config file picked up from the working directory when `--config` is not given.
    pub const CONFIG_FILE: &str = ".pagespeed-audit.toml";
}

/// The device class the API emulates while auditing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Desktop,
    Mobile,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Desktop => "desktop",
            Strategy::Mobile => "mobile",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expands `~` and environment variables in a path given on the command line.
pub fn expand_path(s: &str) -> Result<PathBuf, String> {
    shellexpand::full(s)
        .map(|p| PathBuf::from(p.as_ref()))
        .map_err(|e| format!("Invalid path '{}': {}", s, e))
}

#[derive(Debug, Parser)]
#[command(version, about, term_width = 80)]
pub struct Cli {
    #[arg(
        short = 'u',
        long,
        help = "The path to the file containing the URLs to be audited",
        value_hint = ValueHint::FilePath,
        value_parser = expand_path
    )]
    pub urls: Option<PathBuf>,

    #[arg(
        short = 'k',
        long,
        help = "The path to the file containing the PageSpeed API key",
        value_hint = ValueHint::FilePath,
        value_parser = expand_path
    )]
    pub key: Option<PathBuf>,

    #[arg(
        short = 's',
        long,
        help = "The device on which to perform the Web Vitals audit",
        value_enum
    )]
    pub strategy: Option<Strategy>,

    #[arg(
        short = 'd',
        long,
        help = "Only audit URLs starting with this prefix, e.g. `https://example.com`"
    )]
    pub domain: Option<String>,

    #[arg(
        short = 'r',
        long,
        help = "The name of the results file, written as `<RESULT>.csv`"
    )]
    pub result: Option<String>,

    #[arg(
        short = 'p',
        long,
        short_alias = 'c',
        alias = "concurrent",
        help = "Run the audits concurrently on a pool of workers"
    )]
    pub parallel: bool,

    #[arg(
        short = 'w',
        long,
        help = "Number of concurrent workers when `--parallel` is set [default: 5]",
        value_parser = value_parser!(u8).range(1..=50)
    )]
    pub workers: Option<u8>,

    #[arg(
        long,
        help = "The PageSpeed Insights API endpoint",
        value_hint = ValueHint::Url,
        value_parser = value_parser!(Url)
    )]
    pub endpoint: Option<Url>,

    #[arg(long, help = "Custom User-Agent header to be used in requests")]
    pub user_agent: Option<String>,

    #[arg(
        long,
        help = "Path to a TOML config file [default: ./.pagespeed-audit.toml]",
        value_hint = ValueHint::FilePath,
        value_parser = expand_path
    )]
    pub config: Option<PathBuf>,
}

/// Values read from a TOML config file. Every field is optional; anything
/// given on the command line wins over the file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub urls: Option<String>,
    pub key: Option<String>,
    pub strategy: Option<Strategy>,
    pub domain: Option<String>,
    pub result: Option<String>,
    pub parallel: Option<bool>,
    pub workers: Option<u8>,
    pub endpoint: Option<String>,
    pub user_agent: Option<String>,
}

impl ConfigFile {
    /// Loads the config file at `path`. Without an explicit path the default
    /// file in the working directory is used if it exists.
    pub fn load(path: Option<&PathBuf>) -> Result<ConfigFile, String> {
        let path = match path {
            Some(p) if !p.exists() => {
                return Err(format!("Config file not found: {}", p.display()));
            }
            Some(p) => p.clone(),
            None => {
                let default = PathBuf::from(defaults::CONFIG_FILE);
                if !default.exists() {
                    return Ok(ConfigFile::default());
                }
                default
            }
        };

        let content = std::fs::read_to_string(&path)
            .map_err(|e| format!("Could not read config file {}: {}", path.display(), e))?;
        toml::from_str(&content)
            .map_err(|e| format!("Invalid config file {}: {}", path.display(), e))
    }
}

/// The fully resolved options of one run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub urls: PathBuf,
    pub key: PathBuf,
    pub strategy: Strategy,
    pub domain: String,
    pub result: String,
    pub mode: ExecutionMode,
    pub endpoint: Url,
    pub user_agent: String,
}

impl Cli {
    /// Fills every option not given on the command line from `config`.
    ///
    /// # Errors
    ///
    /// Returns a message naming the config value if one that would be used is invalid.
    pub fn apply_config(&mut self, config: &ConfigFile) -> Result<(), String> {
        fn config_path(value: &Option<String>, name: &str) -> Result<Option<PathBuf>, String> {
            value
                .as_deref()
                .map(|s| expand_path(s).map_err(|e| format!("Invalid config value `{}`: {}", name, e)))
                .transpose()
        }

        if self.urls.is_none() {
            self.urls = config_path(&config.urls, "urls")?;
        }
        if self.key.is_none() {
            self.key = config_path(&config.key, "key")?;
        }
        if self.strategy.is_none() {
            self.strategy = config.strategy;
        }
        if self.domain.is_none() {
            self.domain = config.domain.clone();
        }
        if self.result.is_none() {
            self.result = config.result.clone();
        }
        if !self.parallel {
            self.parallel = config.parallel.unwrap_or(false);
        }
        if self.workers.is_none() {
            if let Some(workers) = config.workers {
                if !(1..=50).contains(&workers) {
                    return Err(format!(
                        "Invalid config value `workers = {}`: must be between 1 and 50",
                        workers
                    ));
                }
                self.workers = Some(workers);
            }
        }
        if self.endpoint.is_none() {
            self.endpoint = config
                .endpoint
                .as_deref()
                .map(|s| {
                    Url::parse(s)
                        .map_err(|e| format!("Invalid config value `endpoint = \"{}\"`: {}", s, e))
                })
                .transpose()?;
        }
        if self.user_agent.is_none() {
            self.user_agent = config.user_agent.clone();
        }
        Ok(())
    }

    /// Resolves the merged options, reporting the first required one that is missing.
    pub fn settings(&self) -> Result<RunSettings, String> {
        fn required<T: Clone>(value: &Option<T>, flag: &str) -> Result<T, String> {
            value
                .clone()
                .ok_or_else(|| format!("The option `--{}` is required", flag))
        }

        let mode = if self.parallel {
            ExecutionMode::Concurrent {
                workers: self.workers.unwrap_or(defaults::WORKERS) as usize,
            }
        } else {
            ExecutionMode::Sequential
        };

        let endpoint = match &self.endpoint {
            Some(url) => url.clone(),
            None => Url::parse(defaults::ENDPOINT).map_err(|e| e.to_string())?,
        };

        Ok(RunSettings {
            urls: required(&self.urls, "urls")?,
            key: required(&self.key, "key")?,
            strategy: required(&self.strategy, "strategy")?,
            domain: self.domain.clone().unwrap_or_default(),
            result: required(&self.result, "result")?,
            mode,
            endpoint,
            user_agent: self
                .user_agent
                .clone()
                .unwrap_or_else(|| defaults::USER_AGENT.to_string()),
        })
    }
}
