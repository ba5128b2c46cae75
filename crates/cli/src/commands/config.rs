use std::env;
use std::fs;
use std::path::Path;

use roster_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let entries: [(&str, String, &[&str]); 10] = [
        ("database.url", config.database.url.clone(), &["ROSTER_DATABASE_URL"]),
        (
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["ROSTER_DATABASE_MAX_CONNECTIONS"],
        ),
        (
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["ROSTER_DATABASE_TIMEOUT_SECS"],
        ),
        ("llm.base_url", config.llm.base_url.clone(), &["ROSTER_LLM_BASE_URL"]),
        ("llm.model", config.llm.model.clone(), &["ROSTER_LLM_MODEL"]),
        ("llm.timeout_secs", config.llm.timeout_secs.to_string(), &["ROSTER_LLM_TIMEOUT_SECS"]),
        (
            "llm.manage_server",
            config.llm.manage_server.to_string(),
            &["ROSTER_LLM_MANAGE_SERVER"],
        ),
        (
            "llm.startup_grace_ms",
            config.llm.startup_grace_ms.to_string(),
            &["ROSTER_LLM_STARTUP_GRACE_MS"],
        ),
        (
            "logging.level",
            config.logging.level.clone(),
            &["ROSTER_LOGGING_LEVEL", "ROSTER_LOG_LEVEL"],
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format).to_lowercase(),
            &["ROSTER_LOGGING_FORMAT", "ROSTER_LOG_FORMAT"],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key_path, value, env_keys) in &entries {
        let source = field_source(
            key_path,
            env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(key_path, value, source));
    }

    lines.join("\n")
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
    // Blank env values are ignored by the loader, so they do not count here either.
    if let Some(env_key) = env_keys
        .iter()
        .find(|key| env::var(key).map(|value| !value.trim().is_empty()).unwrap_or(false))
    {
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

#[cfg(test)]
mod tests {
    use super::{contains_path, field_source};

    #[test]
    fn file_source_requires_full_key_path() {
        let doc: toml::Value = "[llm]\nmodel = \"llama3.2\"\n".parse().expect("toml");

        assert!(contains_path(&doc, "llm.model"));
        assert!(!contains_path(&doc, "llm.base_url"));
        assert!(!contains_path(&doc, "database.url"));
    }

    #[test]
    fn unset_keys_fall_back_to_default_source() {
        let doc: toml::Value = "[llm]\nmodel = \"llama3.2\"\n".parse().expect("toml");
        let path = std::path::Path::new("roster.toml");

        assert_eq!(
            field_source("llm.model", &["ROSTER_TEST_UNSET_SOURCE_KEY"], Some(&doc), Some(path)),
            "file (roster.toml)"
        );
        assert_eq!(
            field_source("llm.timeout_secs", &["ROSTER_TEST_UNSET_SOURCE_KEY"], Some(&doc), None),
            "default"
        );
    }
}
