use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::quote::{CompanyInfo, DEFAULT_VALIDITY_DAYS};

pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["orcamento.toml", "config/orcamento.toml"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub company: CompanyConfig,
    pub quote: QuoteConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

/// Issuer block copied into every new quote.
#[derive(Clone, Debug, Default)]
pub struct CompanyConfig {
    pub name: String,
    pub cnpj: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub site: String,
}

#[derive(Clone, Debug)]
pub struct QuoteConfig {
    pub validity_days: u32,
    pub salesperson: String,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub company_name: Option<String>,
    pub salesperson: Option<String>,
    pub validity_days: Option<u32>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://orcamento.db".to_string(),
                max_connections: 1,
                timeout_secs: 30,
            },
            company: CompanyConfig::default(),
            quote: QuoteConfig {
                validity_days: DEFAULT_VALIDITY_DAYS,
                salesperson: String::new(),
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl CompanyConfig {
    pub fn to_company_info(&self) -> CompanyInfo {
        CompanyInfo {
            name: self.name.clone(),
            cnpj: self.cnpj.clone(),
            address: self.address.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
            site: self.site.clone(),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options
                .config_path
                .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_CANDIDATES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(company) = patch.company {
            let fields = [
                (company.name, &mut self.company.name),
                (company.cnpj, &mut self.company.cnpj),
                (company.address, &mut self.company.address),
                (company.phone, &mut self.company.phone),
                (company.email, &mut self.company.email),
                (company.site, &mut self.company.site),
            ];
            for (value, slot) in fields {
                if let Some(value) = value {
                    *slot = value;
                }
            }
        }

        if let Some(quote) = patch.quote {
            if let Some(validity_days) = quote.validity_days {
                self.quote.validity_days = validity_days;
            }
            if let Some(salesperson) = quote.salesperson {
                self.quote.salesperson = salesperson;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("ORCAMENTO_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("ORCAMENTO_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("ORCAMENTO_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("ORCAMENTO_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("ORCAMENTO_DATABASE_TIMEOUT_SECS", &value)?;
        }

        let company_fields = [
            ("ORCAMENTO_COMPANY_NAME", &mut self.company.name),
            ("ORCAMENTO_COMPANY_CNPJ", &mut self.company.cnpj),
            ("ORCAMENTO_COMPANY_ADDRESS", &mut self.company.address),
            ("ORCAMENTO_COMPANY_PHONE", &mut self.company.phone),
            ("ORCAMENTO_COMPANY_EMAIL", &mut self.company.email),
            ("ORCAMENTO_COMPANY_SITE", &mut self.company.site),
        ];
        for (key, slot) in company_fields {
            if let Some(value) = read_env(key) {
                *slot = value;
            }
        }

        if let Some(value) = read_env("ORCAMENTO_QUOTE_VALIDITY_DAYS") {
            self.quote.validity_days = parse_u32("ORCAMENTO_QUOTE_VALIDITY_DAYS", &value)?;
        }
        if let Some(value) = read_env("ORCAMENTO_QUOTE_SALESPERSON") {
            self.quote.salesperson = value;
        }

        let log_level =
            read_env("ORCAMENTO_LOGGING_LEVEL").or_else(|| read_env("ORCAMENTO_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("ORCAMENTO_LOGGING_FORMAT").or_else(|| read_env("ORCAMENTO_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(company_name) = overrides.company_name {
            self.company.name = company_name;
        }
        if let Some(salesperson) = overrides.salesperson {
            self.quote.salesperson = salesperson;
        }
        if let Some(validity_days) = overrides.validity_days {
            self.quote.validity_days = validity_days;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_company(&self.company)?;
        validate_quote(&self.quote)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// The config file that [`AppConfig::load`] would read, if any.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

/// `:memory:` keeps everything in process; anything else must be a sqlite URL.
pub fn is_in_memory_url(url: &str) -> bool {
    url.trim() == ":memory:"
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let supported =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || is_in_memory_url(url);
    if !supported {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`) or `:memory:`"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_company(company: &CompanyConfig) -> Result<(), ConfigError> {
    let email = company.email.trim();
    if !email.is_empty() && !email.contains('@') {
        return Err(ConfigError::Validation(format!(
            "company.email `{email}` is not an e-mail address"
        )));
    }

    let cnpj_digits = company.cnpj.chars().filter(char::is_ascii_digit).count();
    if !company.cnpj.trim().is_empty() && cnpj_digits != 14 {
        return Err(ConfigError::Validation(
            "company.cnpj must contain 14 digits when set".to_string(),
        ));
    }

    Ok(())
}

fn validate_quote(quote: &QuoteConfig) -> Result<(), ConfigError> {
    if quote.validity_days == 0 || quote.validity_days > 3650 {
        return Err(ConfigError::Validation(
            "quote.validity_days must be in range 1..=3650".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    company: Option<CompanyPatch>,
    quote: Option<QuotePatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct CompanyPatch {
    name: Option<String>,
    cnpj: Option<String>,
    address: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    site: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct QuotePatch {
    validity_days: Option<u32>,
    salesperson: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
