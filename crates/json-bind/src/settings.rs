use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What to do with an input property that has no binding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownPolicy {
    #[default]
    Skip,
    Fail,
}

/// Engine-wide options, fixed when a [`crate::JsonBind`] is built.
///
/// Deserializable so it can come from a config file; every field has a
/// default, so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Skip properties whose value equals the type default when encoding.
    pub omit_defaults: bool,
    /// Build the positional array format for declarations that ask for it.
    pub allow_array_format: bool,
    pub unknown_properties: UnknownPolicy,
    /// Property name carrying the variant tag of polymorphic values.
    pub discriminator: String,
    /// Upper bound on how long a thread waits for a codec another thread
    /// is still analyzing.
    pub placeholder_timeout_ms: u64,
    /// Reject input with non-whitespace content after the top-level value.
    pub verify_trailing: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            omit_defaults: false,
            allow_array_format: true,
            unknown_properties: UnknownPolicy::Skip,
            discriminator: "$type".to_string(),
            placeholder_timeout_ms: 5_000,
            verify_trailing: true,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_omit_defaults(mut self, omit: bool) -> Self {
        self.omit_defaults = omit;
        self
    }

    pub fn with_array_format(mut self, allow: bool) -> Self {
        self.allow_array_format = allow;
        self
    }

    pub fn with_unknown_properties(mut self, policy: UnknownPolicy) -> Self {
        self.unknown_properties = policy;
        self
    }

    pub fn with_discriminator(mut self, name: impl Into<String>) -> Self {
        self.discriminator = name.into();
        self
    }

    pub fn with_placeholder_timeout(mut self, timeout: Duration) -> Self {
        self.placeholder_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_verify_trailing(mut self, verify: bool) -> Self {
        self.verify_trailing = verify;
        self
    }

    pub fn placeholder_timeout(&self) -> Duration {
        Duration::from_millis(self.placeholder_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        assert_eq!(Settings::from_json("{}").unwrap(), Settings::default());
    }

    #[test]
    fn partial_config() {
        let s = Settings::from_json(r#"{"omit_defaults":true,"unknown_properties":"fail"}"#)
            .unwrap();
        assert!(s.omit_defaults);
        assert_eq!(s.unknown_properties, UnknownPolicy::Fail);
        assert_eq!(s.discriminator, "$type");
    }

    #[test]
    fn builder_methods() {
        let s = Settings::default()
            .with_discriminator("kind")
            .with_placeholder_timeout(Duration::from_millis(20));
        assert_eq!(s.discriminator, "kind");
        assert_eq!(s.placeholder_timeout(), Duration::from_millis(20));
    }
}
