use anyhow::{Context, Result, bail};
use log::debug;
use serde::{Deserialize, Serialize};

/// Overrides [`ResolverConfig::isolate_listener_panics`].
pub const ISOLATE_LISTENER_PANICS_ENV: &str = "MODWIRE_ISOLATE_LISTENER_PANICS";

/// Overrides [`ResolverConfig::boot_delegation`], comma separated.
pub const BOOT_DELEGATION_ENV: &str = "MODWIRE_BOOT_DELEGATION";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Log and skip a panicking listener instead of unwinding through the
    /// caller of `resolve`.
    pub isolate_listener_panics: bool,
    /// Package prefixes loaded straight from the parent loader.
    pub boot_delegation: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            isolate_listener_panics: true,
            boot_delegation: vec!["java.".to_string()],
        }
    }
}

impl ResolverConfig {
    /// Defaults overridden by `MODWIRE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ISOLATE_LISTENER_PANICS_ENV) {
            config.isolate_listener_panics = parse_flag(&value)
                .with_context(|| format!("Invalid value for {}", ISOLATE_LISTENER_PANICS_ENV))?;
        }
        if let Some(value) = lookup(BOOT_DELEGATION_ENV) {
            config.boot_delegation = value
                .split(',')
                .map(str::trim)
                .filter(|prefix| !prefix.is_empty())
                .map(String::from)
                .collect();
        }

        debug!("Resolver config: {:?}", config);
        Ok(config)
    }

    /// Whether classes of `package` bypass module wiring.
    ///
    /// A prefix ending in `.` also covers the package it names: `java.`
    /// matches `java` as well as `java.lang`.
    pub fn is_boot_delegated(&self, package: &str) -> bool {
        self.boot_delegation.iter().any(|prefix| {
            package.starts_with(prefix.as_str())
                || (prefix.ends_with('.') && package == prefix.trim_end_matches('.'))
        })
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("Expected a boolean, got '{}'", other),
    }
}
