use crate::error::{ConfigErrorKind, InfraError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where the data directory lives when the server runs inside its container image.
pub const DOCKER_DATA_DIR: &str = "/gameserver/data";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,
    #[serde(default)]
    pub world: WorldConfig,
}

/// Tuning for the world maintenance loops.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Replenishment keeps the spore count near this
    pub max_spores: usize,
    pub replenish_interval_ms: u64,
    /// Upper bound on spores created per replenish tick
    pub replenish_batch: usize,
    pub replenish_pause_ms: u64,
    /// Spores per batch when streaming the world to a player that just joined
    pub spore_batch_size: usize,
    pub spore_batch_delay_ms: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            max_spores: 1000,
            replenish_interval_ms: 2000,
            replenish_batch: 10,
            replenish_pause_ms: 50,
            spore_batch_size: 20,
            spore_batch_delay_ms: 50,
        }
    }
}

impl WorldConfig {
    pub fn replenish_interval(&self) -> Duration {
        Duration::from_millis(self.replenish_interval_ms)
    }

    pub fn replenish_pause(&self) -> Duration {
        Duration::from_millis(self.replenish_pause_ms)
    }

    pub fn spore_batch_delay(&self) -> Duration {
        Duration::from_millis(self.spore_batch_delay_ms)
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_data_path() -> PathBuf {
    PathBuf::from(".")
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, InfraError> {
        let path = path.as_ref();
        let config_err = |source| InfraError::Config {
            path: path.to_path_buf(),
            source,
        };

        let data = std::fs::read_to_string(path).map_err(|e| config_err(ConfigErrorKind::Read(e)))?;
        let cfg: Self = toml::from_str(&data).map_err(|e| config_err(ConfigErrorKind::Parse(e)))?;
        Ok(cfg)
    }

    /// Reads `PORT` and `DATA_PATH` (after loading `env_file`, if present) and resolves
    /// the data directory.
    pub fn from_env(env_file: &Path) -> Result<Self, InfraError> {
        if dotenvy::from_filename(env_file).is_err() {
            tracing::debug!(path = %env_file.display(), "no env file loaded");
        }

        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(%raw, "error parsing PORT, using {}", DEFAULT_PORT);
                DEFAULT_PORT
            }),
            Err(_) => DEFAULT_PORT,
        };

        let mut candidates = Vec::new();
        if let Ok(p) = std::env::var("DATA_PATH") {
            if !p.is_empty() {
                candidates.push(PathBuf::from(p));
            }
        }
        candidates.push(PathBuf::from(DOCKER_DATA_DIR));
        candidates.push(PathBuf::from("."));

        let data_path = coalesce_paths(&candidates).ok_or_else(|| InfraError::Config {
            path: env_file.to_path_buf(),
            source: ConfigErrorKind::NoDataDir(format!("{candidates:?}")),
        })?;

        Ok(Self {
            port,
            data_path,
            world: WorldConfig::default(),
        })
    }
}

/// First path that exists on disk, trying them in order.
pub fn coalesce_paths(candidates: &[PathBuf]) -> Option<PathBuf> {
    for (i, path) in candidates.iter().enumerate() {
        if path.exists() {
            tracing::info!(path = %path.display(), "file/folder found");
            return Some(path.clone());
        }

        match candidates.get(i + 1) {
            Some(next) => tracing::info!(
                path = %path.display(),
                next = %next.display(),
                "file/folder not found, trying next"
            ),
            None => tracing::warn!(path = %path.display(), "file/folder not found, no more fallbacks to try"),
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coalesce_takes_first_existing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let present = dir.path().join("present");
        std::fs::create_dir(&present).unwrap();

        let found = coalesce_paths(&[missing.clone(), present.clone(), dir.path().to_path_buf()]);
        assert_eq!(found, Some(present));
        assert_eq!(coalesce_paths(&[missing]), None);
    }

    #[test]
    fn load_toml_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("server.toml");
        std::fs::write(&file, "port = 9000\n\n[world]\nmax_spores = 50\n").unwrap();

        let cfg = Config::load(&file).unwrap();
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.data_path, PathBuf::from("."));
        assert_eq!(cfg.world.max_spores, 50);
        assert_eq!(cfg.world.replenish_batch, 10);
        assert_eq!(cfg.world.replenish_interval(), Duration::from_secs(2));
    }

    #[test]
    fn load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("broken.toml");
        std::fs::write(&file, "port = \"not a number\"").unwrap();

        match Config::load(&file) {
            Err(InfraError::Config { path, source: ConfigErrorKind::Parse(_) }) => assert_eq!(path, file),
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
