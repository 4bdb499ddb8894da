//! Source registry.
//!
//! Built once at start-up from [`Settings`] and shared read-only afterwards.
//! Each entry pairs the public [`Source`] metadata with its parsed entry URL
//! and [`SelectorProfile`].

use crate::config::Settings;
use crate::error::ConfigError;
use crate::models::Source;
use crate::scrapers::profile::SelectorProfile;
use std::sync::Arc;
use url::Url;

#[derive(Debug)]
pub struct RegisteredSource {
    pub source: Source,
    pub entry: Url,
    pub profile: SelectorProfile,
}

impl RegisteredSource {
    pub fn name(&self) -> &str {
        &self.source.name
    }
}

/// Immutable, ordered collection of configured sources.
#[derive(Debug, Default)]
pub struct SourceRegistry {
    entries: Vec<Arc<RegisteredSource>>,
}

impl SourceRegistry {
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let entries = settings
            .sources
            .iter()
            .map(|cfg| {
                let entry = Url::parse(&cfg.url).map_err(|e| ConfigError::InvalidSource {
                    name: cfg.name.clone(),
                    reason: e.to_string(),
                })?;
                Ok(Arc::new(RegisteredSource {
                    source: Source {
                        name: cfg.name.clone(),
                        display_name: cfg.display_name.clone(),
                        url: cfg.url.clone(),
                        active: cfg.active,
                    },
                    entry,
                    profile: cfg.profile.clone(),
                }))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(Self { entries })
    }

    pub fn get(&self, name: &str) -> Option<&Arc<RegisteredSource>> {
        self.entries.iter().find(|e| e.name() == name)
    }

    /// Active sources in configuration order.
    pub fn active(&self) -> Vec<Arc<RegisteredSource>> {
        self.entries
            .iter()
            .filter(|e| e.source.active)
            .cloned()
            .collect()
    }

    /// Public metadata of every source, active or not.
    pub fn sources(&self) -> Vec<Source> {
        self.entries.iter().map(|e| e.source.clone()).collect()
    }
}
