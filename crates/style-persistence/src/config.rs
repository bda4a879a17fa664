//! Carga de configuración de conexión desde variables de entorno.
//! Usa la convención `DATABASE_URL` y parámetros opcionales de pool.

use std::env;

use dotenvy::dotenv;
use once_cell::sync::Lazy;

use crate::error::PersistenceError;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub url: String,
    pub min_connections: u32,
    pub max_connections: u32,
}

impl DbConfig {
    pub fn from_env() -> Result<Self, PersistenceError> {
        Lazy::force(&DOTENV_LOADED);
        Self::from_lookup(|k| env::var(k).ok())
    }

    /// Igual que `from_env` con una fuente de variables arbitraria.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PersistenceError>
        where F: Fn(&str) -> Option<String>
    {
        let url = lookup("DATABASE_URL").ok_or_else(|| PersistenceError::Config("DATABASE_URL no definido".into()))?;
        let min_connections = parse_or(&lookup, "DATABASE_MIN_CONNECTIONS", 2)?;
        let max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 16)?;
        Ok(Self { url,
                  min_connections,
                  max_connections })
    }
}

fn parse_or<F>(lookup: &F, key: &str, default: u32) -> Result<u32, PersistenceError>
    where F: Fn(&str) -> Option<String>
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim()
                        .parse()
                        .map_err(|_| PersistenceError::Config(format!("{key} debe ser un entero, se recibió '{raw}'"))),
    }
}

/// Forzar carga temprana de .env desde aplicaciones externas.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
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
    fn defaults_pool_sizes() {
        let cfg = DbConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://x")])).unwrap();
        assert_eq!((cfg.min_connections, cfg.max_connections), (2, 16));
    }

    #[test]
    fn missing_url_and_bad_numbers_are_errors() {
        assert!(matches!(DbConfig::from_lookup(lookup(&[])), Err(PersistenceError::Config(_))));
        let bad = DbConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://x"), ("DATABASE_MAX_CONNECTIONS", "lots")]));
        assert!(matches!(bad, Err(PersistenceError::Config(_))));
    }
}
