//! Engine configuration
//!
//! Defaults, overlaid by `BESEC_*` environment variables (a `.env` file is
//! loaded by the binary before this is read).

use std::path::PathBuf;

pub const ENV_PRACTICES_DIR: &str = "BESEC_PRACTICES_DIR";
pub const ENV_DELTA_DIR: &str = "BESEC_DELTA_DIR";
pub const ENV_PARALLEL_LOAD: &str = "BESEC_PARALLEL_LOAD";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Directory of base practice definitions
    pub practices_dir: PathBuf,
    /// Optional directory of deployment-specific deltas
    pub delta_dir: Option<PathBuf>,
    /// Parse practice files concurrently
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            practices_dir: PathBuf::from("./practices"),
            delta_dir: None,
            parallel: true,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(dir) = get(ENV_PRACTICES_DIR) {
            config.practices_dir = PathBuf::from(dir);
        }
        if let Some(dir) = get(ENV_DELTA_DIR) {
            config.delta_dir = Some(PathBuf::from(dir));
        }
        if let Some(flag) = get(ENV_PARALLEL_LOAD) {
            config.parallel = !matches!(flag.to_lowercase().as_str(), "0" | "false" | "no" | "off");
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_without_env() {
        let config = EngineConfig::from_lookup(|_| None);
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_lookup_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (ENV_PRACTICES_DIR, "/srv/practices"),
            (ENV_DELTA_DIR, " /srv/local "),
            (ENV_PARALLEL_LOAD, "false"),
        ]);
        let config = EngineConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.practices_dir, PathBuf::from("/srv/practices"));
        assert_eq!(config.delta_dir, Some(PathBuf::from("/srv/local")));
        assert!(!config.parallel);
    }

    #[test]
    fn test_empty_delta_dir_is_unset() {
        let config = EngineConfig::from_lookup(|k| (k == ENV_DELTA_DIR).then(|| "  ".to_string()));
        assert_eq!(config.delta_dir, None);
    }
}
