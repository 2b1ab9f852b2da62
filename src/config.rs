//! Configuration surface (§6): `Local.Bypass(bool)`.
//!
//! Follows the teacher's layered `config` crate convention — defaults set
//! in code, overridable by environment variables — rather than requiring a
//! config file on disk; the spec's Non-goals exclude "CLI/config loading"
//! as a feature, but the struct and its env layering are the ambient
//! pattern this workspace's components are configured through, so they're
//! carried regardless.

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// The local in-memory broker's configuration (§6).
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct LocalConfig {
    /// When `true`, the local backend's `Report` delivers envelopes
    /// straight into the store state, skipping the `to` channel hop
    /// (§4.5's "it simulates a network hop entirely in memory" — bypass
    /// skips that simulated hop). Default `false`.
    #[serde(default)]
    pub bypass: bool,
}

/// Root configuration for `relay-core`. Loadable with zero configuration
/// (all defaults) or layered with environment variables prefixed `RELAY_`,
/// e.g. `RELAY_LOCAL_BYPASS=true`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub local: LocalConfig,
}

impl RelayConfig {
    /// Load configuration from the process environment, layered over the
    /// struct's defaults.
    pub fn from_env() -> std::result::Result<Self, ConfigError> {
        Config::builder()
            .set_default("local.bypass", false)?
            .add_source(Environment::with_prefix("RELAY").separator("_"))
            .build()?
            .try_deserialize()
    }
}
