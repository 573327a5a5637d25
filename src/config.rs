use anyhow::Result;
use clap::Parser;
use serde::Deserialize;
use serde_yaml;
use std::env;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "opgave")]
#[command(about = "Runs the opgave to-do service", long_about = None)]
pub struct Cli {
    #[arg(short = 'c', long = "config")]
    pub config_path: Option<String>,
}

pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".opgave")
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.yaml")
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct App {
    database: String,
    port: i32,
    #[serde(default)]
    pub turso_url: Option<String>,
    #[serde(default)]
    pub turso_auth_token: Option<String>,
    #[serde(default = "default_sync_interval")]
    pub sync_interval_seconds: u64,
}

fn default_sync_interval() -> u64 {
    60
}

impl App {
    pub fn get_db(&self) -> &str {
        &self.database
    }

    pub fn get_port(&self) -> i32 {
        self.port
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub app: App,
}

impl Config {
    pub fn new(path: &str) -> Result<Self> {
        let cfg = Config::load_config(path)?;
        Ok(cfg)
    }

    fn load_config(path: &str) -> Result<Config> {
        let yaml_str = fs::read_to_string(path)?;
        let yaml_with_env = Config::substitute_env_vars(&yaml_str)?;
        let config: Config = serde_yaml::from_str(&yaml_with_env)?;
        Ok(config)
    }

    fn substitute_env_vars(yaml_str: &str) -> Result<String> {
        let mut result = yaml_str.to_string();
        let mut offset = 0;

        while let Some(start) = result[offset..].find("${") {
            let actual_start = offset + start;
            if let Some(end) = result[actual_start..].find("}") {
                let var_name = &result[actual_start + 2..actual_start + end];

                // Handle default values like ${VAR:-default}
                let env_value = if let Some(default_start) = var_name.find(":-") {
                    let actual_var = &var_name[..default_start];
                    let default_val = &var_name[default_start + 2..];
                    env::var(actual_var).unwrap_or_else(|_| default_val.to_string())
                } else {
                    env::var(var_name).unwrap_or_else(|_| {
                        tracing::warn!("environment variable '{}' not found", var_name);
                        String::new()
                    })
                };

                result.replace_range(actual_start..actual_start + end + 1, &env_value);
                offset = actual_start + env_value.len();
            } else {
                break;
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let yaml = "app:\n  database: opgave.db\n  port: 8080\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.app.get_db(), "opgave.db");
        assert_eq!(cfg.app.get_port(), 8080);
        assert!(cfg.app.turso_url.is_none());
        assert_eq!(cfg.app.sync_interval_seconds, 60);
    }

    #[test]
    fn substitutes_env_var_defaults() {
        let yaml =
            "app:\n  database: ${OPGAVE_TEST_DB_UNSET:-fallback.db}\n  port: ${OPGAVE_TEST_PORT_UNSET:-9090}\n";
        let substituted = Config::substitute_env_vars(yaml).unwrap();
        let cfg: Config = serde_yaml::from_str(&substituted).unwrap();
        assert_eq!(cfg.app.get_db(), "fallback.db");
        assert_eq!(cfg.app.get_port(), 9090);
    }

    #[test]
    fn substitutes_env_var_values() {
        unsafe { env::set_var("OPGAVE_TEST_DB_SET", "from-env.db") };
        let yaml = "app:\n  database: ${OPGAVE_TEST_DB_SET}\n  port: 8080\n";
        let substituted = Config::substitute_env_vars(yaml).unwrap();
        let cfg: Config = serde_yaml::from_str(&substituted).unwrap();
        assert_eq!(cfg.app.get_db(), "from-env.db");
    }
}
