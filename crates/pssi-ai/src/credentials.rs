use crate::provider::ProviderKind;
use std::collections::HashMap;

/// Provider API keys resolved from the environment.
#[derive(Clone, Default)]
pub struct Credentials {
    keys: HashMap<ProviderKind, String>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve every provider through `lookup`, taking the first non-empty
    /// value among its variable names.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut keys = HashMap::new();
        for kind in ProviderKind::ALL {
            let key = kind
                .env_vars()
                .iter()
                .filter_map(|name| lookup(name))
                .find(|value| !value.trim().is_empty());

            match key {
                Some(key) => {
                    tracing::info!("{} is configured", kind.display_name());
                    keys.insert(kind, key);
                }
                None => tracing::warn!("{} API key not found", kind.display_name()),
            }
        }
        Self { keys }
    }

    pub fn with_key(mut self, kind: ProviderKind, key: impl Into<String>) -> Self {
        self.keys.insert(kind, key.into());
        self
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&str> {
        self.keys.get(&kind).map(String::as_str)
    }

    pub fn is_configured(&self, kind: ProviderKind) -> bool {
        self.keys.contains_key(&kind)
    }

    /// Configured providers, in auto-selection order.
    pub fn configured(&self) -> Vec<ProviderKind> {
        ProviderKind::ALL
            .into_iter()
            .filter(|kind| self.is_configured(*kind))
            .collect()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("configured", &self.configured())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_prefers_build_time_name() {
        let creds = Credentials::from_lookup(lookup_from(&[
            ("VITE_OPENAI_API_KEY", "vite-key"),
            ("OPENAI_API_KEY", "server-key"),
        ]));
        assert_eq!(creds.get(ProviderKind::OpenAI), Some("vite-key"));
    }

    #[test]
    fn test_falls_back_to_server_name() {
        let creds = Credentials::from_lookup(lookup_from(&[("ANTHROPIC_API_KEY", "server-key")]));
        assert_eq!(creds.get(ProviderKind::Anthropic), Some("server-key"));
        assert!(!creds.is_configured(ProviderKind::OpenAI));
    }

    #[test]
    fn test_empty_values_count_as_absent() {
        let creds = Credentials::from_lookup(lookup_from(&[
            ("VITE_GEMINI_API_KEY", ""),
            ("GEMINI_API_KEY", "  "),
        ]));
        assert!(creds.configured().is_empty());
    }

    #[test]
    fn test_configured_keeps_selection_order() {
        let creds = Credentials::new()
            .with_key(ProviderKind::Gemini, "g")
            .with_key(ProviderKind::OpenAI, "o");
        assert_eq!(
            creds.configured(),
            vec![ProviderKind::OpenAI, ProviderKind::Gemini]
        );
    }

    #[test]
    fn test_debug_does_not_leak_keys() {
        let creds = Credentials::new().with_key(ProviderKind::OpenAI, "sk-secret");
        let printed = format!("{:?}", creds);
        assert!(!printed.contains("sk-secret"));
    }
}
