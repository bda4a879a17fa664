//! Configuración central de la aplicación.
//! Lee las variables `STYLEFLOW_*` (y `.env`, vía `style-persistence`) y
//! expone una estructura inmutable. Un valor inválido es un error, nunca se
//! reemplaza en silencio por el valor por defecto.
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use style_core::constants::DEFAULT_MAX_ITERATIONS;

use crate::errors::ConfigError;

pub const DEFAULT_WORKER_TIMEOUT_SECS: u64 = 120;

/// Cómo se dispara el workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum RunMode {
    /// Un run con los siete stages para el documento completo.
    #[default]
    Document,
    /// Un run escritor/validador por cada campo pedido.
    PerField,
}

impl FromStr for RunMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "document" => Ok(RunMode::Document),
            "per-field" => Ok(RunMode::PerField),
            other => Err(ConfigError::Invalid { key: "STYLEFLOW_RUN_MODE".into(),
                                                value: other.to_string() }),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Document => f.write_str("document"),
            RunMode::PerField => f.write_str("per-field"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Tope del bucle escritor/validador (>= 1).
    pub max_iterations: u32,
    /// Timeout por invocación de worker.
    pub worker_timeout: Duration,
    pub run_mode: RunMode,
    /// Re-ejecuciones completas ante `InvocationFailure`.
    pub invocation_retries: u32,
    /// Comando del worker externo; `None` = workers stub.
    pub worker_cmd: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { max_iterations: DEFAULT_MAX_ITERATIONS,
               worker_timeout: Duration::from_secs(DEFAULT_WORKER_TIMEOUT_SECS),
               run_mode: RunMode::Document,
               invocation_retries: 0,
               worker_cmd: None }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        style_persistence::init_dotenv();
        Self::from_lookup(|k| env::var(k).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
        where F: Fn(&str) -> Option<String>
    {
        let defaults = Self::default();
        let max_iterations = parse_or(&lookup, "STYLEFLOW_MAX_ITERATIONS", defaults.max_iterations)?;
        if max_iterations == 0 {
            return Err(ConfigError::Invalid { key: "STYLEFLOW_MAX_ITERATIONS".into(),
                                              value: "0".into() });
        }
        let timeout_secs = parse_or(&lookup, "STYLEFLOW_WORKER_TIMEOUT_SECS", DEFAULT_WORKER_TIMEOUT_SECS)?;
        let run_mode = match lookup("STYLEFLOW_RUN_MODE") {
            Some(raw) => raw.parse()?,
            None => defaults.run_mode,
        };
        let invocation_retries = parse_or(&lookup, "STYLEFLOW_INVOCATION_RETRIES", defaults.invocation_retries)?;
        let worker_cmd = lookup("STYLEFLOW_WORKER_CMD").filter(|c| !c.trim().is_empty());
        Ok(Self { max_iterations,
                  worker_timeout: Duration::from_secs(timeout_secs),
                  run_mode,
                  invocation_retries,
                  worker_cmd })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
    where F: Fn(&str) -> Option<String>,
          T: FromStr
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { key: key.to_string(),
                                                                           value: raw.clone() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let cfg = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.max_iterations, 3);
        assert_eq!(cfg.worker_timeout, Duration::from_secs(120));
    }

    #[test]
    fn reads_every_variable() {
        let cfg = AppConfig::from_lookup(lookup(&[("STYLEFLOW_MAX_ITERATIONS", "5"),
                                                  ("STYLEFLOW_WORKER_TIMEOUT_SECS", "10"),
                                                  ("STYLEFLOW_RUN_MODE", "per-field"),
                                                  ("STYLEFLOW_INVOCATION_RETRIES", "2"),
                                                  ("STYLEFLOW_WORKER_CMD", "python worker.py")])).unwrap();
        assert_eq!(cfg.max_iterations, 5);
        assert_eq!(cfg.worker_timeout, Duration::from_secs(10));
        assert_eq!(cfg.run_mode, RunMode::PerField);
        assert_eq!(cfg.invocation_retries, 2);
        assert_eq!(cfg.worker_cmd.as_deref(), Some("python worker.py"));
    }

    #[test]
    fn invalid_values_are_errors() {
        let zero = AppConfig::from_lookup(lookup(&[("STYLEFLOW_MAX_ITERATIONS", "0")]));
        assert!(matches!(zero, Err(ConfigError::Invalid { .. })));
        let mode = AppConfig::from_lookup(lookup(&[("STYLEFLOW_RUN_MODE", "batch")]));
        assert!(matches!(mode, Err(ConfigError::Invalid { key, .. }) if key == "STYLEFLOW_RUN_MODE"));
        let retries = AppConfig::from_lookup(lookup(&[("STYLEFLOW_INVOCATION_RETRIES", "-1")]));
        assert!(retries.is_err());
    }
}
