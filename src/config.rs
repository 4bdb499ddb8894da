//! Runtime configuration.
//!
//! Configuration is a YAML document describing the HTTP client, the
//! pipeline timings and the list of sources with their selector profiles.
//! A default document ships inside the binary (`config/sources.yaml`); a
//! file passed with `--config` replaces it wholesale.
//!
//! Every tuning constant (timeouts, enrichment pause, title floor,
//! description cap, index-path depth, item caps) lives here rather than in
//! the pipeline code.

use crate::error::ConfigError;
use crate::fetch::{ClientConfig, DEFAULT_USER_AGENT};
use crate::scrapers::profile::SelectorProfile;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

const BUILTIN_CONFIG: &str = include_str!("../config/sources.yaml");

/// Top-level configuration document.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Timeout for a source's entry page.
    #[serde(default = "default_listing_timeout_secs")]
    pub listing_timeout_secs: u64,
    /// Timeout for article pages fetched during enrichment.
    #[serde(default = "default_detail_timeout_secs")]
    pub detail_timeout_secs: u64,
    /// Pause after every enrichment fetch.
    #[serde(default = "default_enrichment_delay_ms")]
    pub enrichment_delay_ms: u64,
    /// Upper bound on a whole aggregation. `None` waits for every source.
    #[serde(default)]
    pub deadline_secs: Option<u64>,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

/// One configured news site.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub display_name: String,
    pub url: String,
    #[serde(default = "default_active")]
    pub active: bool,
    pub profile: SelectorProfile,
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_max_redirects() -> usize {
    10
}

fn default_listing_timeout_secs() -> u64 {
    30
}

fn default_detail_timeout_secs() -> u64 {
    10
}

fn default_enrichment_delay_ms() -> u64 {
    1000
}

fn default_active() -> bool {
    true
}

impl Settings {
    /// The configuration compiled into the binary.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_yaml(BUILTIN_CONFIG)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_yaml::from_str(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load the configuration at `path`, or the built-in one when `path` is
    /// `None`.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let settings = match path {
            Some(path) => {
                let yaml =
                    tokio::fs::read_to_string(path)
                        .await
                        .map_err(|source| ConfigError::Io {
                            path: path.to_string(),
                            source,
                        })?;
                Self::from_yaml(&yaml)?
            }
            None => Self::builtin()?,
        };
        info!(
            sources = settings.sources.len(),
            builtin = path.is_none(),
            "Loaded configuration"
        );
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        let mut prefixes = HashSet::new();
        for source in &self.sources {
            let invalid = |reason: &str| ConfigError::InvalidSource {
                name: source.name.clone(),
                reason: reason.to_string(),
            };
            if source.name.trim().is_empty() {
                return Err(invalid("name must not be empty"));
            }
            if !seen.insert(source.name.as_str()) {
                return Err(invalid("duplicate source name"));
            }
            // Article ids are `{id_prefix}_{n}` and must not collide across sources.
            if !prefixes.insert(source.profile.id_prefix.as_str()) {
                return Err(invalid("id_prefix is already used by another source"));
            }
            if Url::parse(&source.url).is_err() {
                return Err(invalid("entry url is not an absolute URL"));
            }
            if source.profile.max_items == 0 {
                return Err(invalid("max_items must be at least 1"));
            }
        }
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            user_agent: self.user_agent.clone(),
            max_redirects: self.max_redirects,
        }
    }

    pub fn listing_timeout(&self) -> Duration {
        Duration::from_secs(self.listing_timeout_secs)
    }

    pub fn detail_timeout(&self) -> Duration {
        Duration::from_secs(self.detail_timeout_secs)
    }

    pub fn enrichment_delay(&self) -> Duration {
        Duration::from_millis(self.enrichment_delay_ms)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::profile::{LinkRule, TitlePolicy};

    #[test]
    fn test_builtin_config_loads() {
        let settings = Settings::builtin().unwrap();
        assert_eq!(settings.listing_timeout(), Duration::from_secs(30));
        assert_eq!(settings.detail_timeout(), Duration::from_secs(10));
        assert_eq!(settings.enrichment_delay(), Duration::from_secs(1));
        assert_eq!(settings.deadline(), None);

        let names: Vec<_> = settings.sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["thedailystar", "cnn"]);
    }

    #[test]
    fn test_builtin_profiles() {
        let settings = Settings::builtin().unwrap();
        let star = &settings.sources[0].profile;
        assert_eq!(star.max_items, 10);
        assert_eq!(star.title_policy, TitlePolicy::FirstTerminator);
        assert_eq!(star.image.len(), 2);
        assert!(star.link_filter.is_some());

        let cnn = &settings.sources[1].profile;
        assert_eq!(cnn.max_items, 15);
        assert!(cnn.dedup_by_title);
        assert_eq!(cnn.title_policy, TitlePolicy::Keep);
        assert!(matches!(cnn.link, LinkRule::OwnHref));
        assert!(cnn.image.is_empty());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let yaml = r#"
sources:
  - name: a
    display_name: A
    url: "https://a.example.com/"
    profile: { id_prefix: a, containers: ".c", title: ["h2"], link: { kind: own_href }, max_items: 1 }
  - name: a
    display_name: A again
    url: "https://a.example.com/"
    profile: { id_prefix: a, containers: ".c", title: ["h2"], link: { kind: own_href }, max_items: 1 }
"#;
        let err = Settings::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSource { .. }));
    }

    #[test]
    fn test_shared_id_prefix_rejected() {
        let yaml = r#"
sources:
  - name: a
    display_name: A
    url: "https://a.example.com/"
    profile: { id_prefix: news, containers: ".c", title: ["h2"], link: { kind: own_href }, max_items: 1 }
  - name: b
    display_name: B
    url: "https://b.example.com/"
    profile: { id_prefix: news, containers: ".c", title: ["h2"], link: { kind: own_href }, max_items: 1 }
"#;
        match Settings::from_yaml(yaml).unwrap_err() {
            ConfigError::InvalidSource { name, reason } => {
                assert_eq!(name, "b");
                assert!(reason.contains("id_prefix"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_builtin_id_prefixes_are_distinct() {
        let settings = Settings::builtin().unwrap();
        let prefixes: HashSet<_> = settings
            .sources
            .iter()
            .map(|s| s.profile.id_prefix.as_str())
            .collect();
        assert_eq!(prefixes.len(), settings.sources.len());
    }

    #[test]
    fn test_relative_entry_url_rejected() {
        let yaml = r#"
sources:
  - name: a
    display_name: A
    url: "/front"
    profile: { id_prefix: a, containers: ".c", title: ["h2"], link: { kind: own_href }, max_items: 1 }
"#;
        assert!(Settings::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let settings = Settings::from_yaml("deadline_secs: 5").unwrap();
        assert_eq!(settings.max_redirects, 10);
        assert_eq!(settings.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(settings.deadline(), Some(Duration::from_secs(5)));
        assert!(settings.sources.is_empty());
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = Settings::load(Some("/nonexistent/top_news.yaml"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
