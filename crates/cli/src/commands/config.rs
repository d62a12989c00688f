use std::env;
use std::fs;
use std::path::Path;

use orcamento_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

/// Effective configuration, one line per key with where its value came from.
pub fn run(options: &LoadOptions) -> String {
    let config = match AppConfig::load(options.clone()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(options.config_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let overrides = &options.overrides;

    let fields: [(&str, String, &[&str], bool); 14] = [
        (
            "database.url",
            config.database.url.clone(),
            &["ORCAMENTO_DATABASE_URL"],
            overrides.database_url.is_some(),
        ),
        (
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["ORCAMENTO_DATABASE_MAX_CONNECTIONS"],
            false,
        ),
        (
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["ORCAMENTO_DATABASE_TIMEOUT_SECS"],
            false,
        ),
        (
            "company.name",
            display_or_unset(&config.company.name),
            &["ORCAMENTO_COMPANY_NAME"],
            overrides.company_name.is_some(),
        ),
        ("company.cnpj", display_or_unset(&config.company.cnpj), &["ORCAMENTO_COMPANY_CNPJ"], false),
        (
            "company.address",
            display_or_unset(&config.company.address),
            &["ORCAMENTO_COMPANY_ADDRESS"],
            false,
        ),
        (
            "company.phone",
            display_or_unset(&config.company.phone),
            &["ORCAMENTO_COMPANY_PHONE"],
            false,
        ),
        (
            "company.email",
            display_or_unset(&config.company.email),
            &["ORCAMENTO_COMPANY_EMAIL"],
            false,
        ),
        ("company.site", display_or_unset(&config.company.site), &["ORCAMENTO_COMPANY_SITE"], false),
        (
            "quote.validity_days",
            config.quote.validity_days.to_string(),
            &["ORCAMENTO_QUOTE_VALIDITY_DAYS"],
            overrides.validity_days.is_some(),
        ),
        (
            "quote.salesperson",
            display_or_unset(&config.quote.salesperson),
            &["ORCAMENTO_QUOTE_SALESPERSON"],
            overrides.salesperson.is_some(),
        ),
        (
            "logging.level",
            config.logging.level.clone(),
            &["ORCAMENTO_LOGGING_LEVEL", "ORCAMENTO_LOG_LEVEL"],
            overrides.log_level.is_some(),
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format).to_lowercase(),
            &["ORCAMENTO_LOGGING_FORMAT", "ORCAMENTO_LOG_FORMAT"],
            false,
        ),
        (
            "config.file",
            config_file_path
                .as_deref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "<none>".to_string()),
            &[],
            options.config_path.is_some(),
        ),
    ];

    let mut lines =
        vec!["effective config (source precedence: flag > env > file > default):".to_string()];
    for (key_path, value, env_keys, overridden) in fields {
        let source = if overridden {
            "flag".to_string()
        } else {
            field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
        };
        lines.push(render_line(key_path, &value, source));
    }

    lines.join("\n")
}

fn display_or_unset(value: &str) -> String {
    if value.trim().is_empty() {
        "<unset>".to_string()
    } else {
        value.to_string()
    }
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
