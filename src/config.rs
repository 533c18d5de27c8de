use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_API_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MAX_INPUT_CHARS: usize = 8000;

/// Models sometimes answer with a comma-joined list, so names may not contain it.
pub const CATEGORY_SEPARATOR: char = ',';

pub const DEFAULT_CATEGORIES: [&str; 10] = [
    "🚀 Developer Productivity",
    "🤖 AI/ML Engineering",
    "🏗️ Tech Infrastructure",
    "💡 Industry Insights",
    "🛠️ Product Innovation",
    "🎯 Leadership & Culture",
    "📊 Tech Strategy",
    "🔮 Future of Development",
    "📚 Lessons Learned",
    "🤝 Community & Open Source",
];

/// Categories from the newsletter era. Any of these in a stored list means the
/// list predates the LinkedIn set and gets replaced wholesale.
const LEGACY_CATEGORIES: [&str; 6] = [
    "Employee Milestones",
    "Customer Wins",
    "Product Announcements",
    "Company News",
    "Industry Updates",
    "Team Updates",
];

/// Options page shows stored keys as dots; saving those back must not clobber the real key.
const MASK_CHAR: char = '•';

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub openai_api_key: String,
    pub openai_model: String,
    pub api_base_url: String,
    pub categories: Vec<String>,
    pub max_input_chars: usize,
    pub request_timeout_secs: u64,
    pub result_ttl_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            openai_model: DEFAULT_MODEL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            categories: default_categories(),
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            request_timeout_secs: 60,
            result_ttl_secs: 900,
        }
    }
}

pub fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
}

/// `<platform config dir>/postcraft`, falling back to the working directory.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("postcraft")
}

impl AppConfig {
    pub fn load(config_dir: &Path) -> Self {
        let config_path = config_dir.join("config.json");
        let mut config = if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                    log::warn!("Ignoring invalid {}: {}", config_path.display(), e);
                    Self::default()
                }),
                Err(e) => {
                    log::warn!("Could not read {}: {}", config_path.display(), e);
                    Self::default()
                }
            }
        } else {
            let c = Self::default();
            if let Err(e) = c.save(config_dir) {
                log::warn!("Could not write default config: {}", e);
            }
            c
        };

        if config.migrate_categories() {
            log::info!("Migrated to LinkedIn-focused categories");
        }

        // Environment wins over the stored file
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                config.openai_api_key = key;
            }
        }
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            if !model.is_empty() {
                config.openai_model = model;
            }
        }

        config
    }

    pub fn save(&self, config_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(config_dir)?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_dir.join("config.json"), content)?;
        Ok(())
    }

    /// Replaces an empty or legacy category list with the defaults.
    /// Returns whether anything changed.
    pub fn migrate_categories(&mut self) -> bool {
        let stale = self.categories.is_empty()
            || self
                .categories
                .iter()
                .any(|c| LEGACY_CATEGORIES.contains(&c.as_str()));
        if stale {
            self.categories = default_categories();
        }
        stale
    }

    pub fn add_category(&mut self, category: &str) -> bool {
        let category = category.trim();
        if category.is_empty()
            || category.contains(CATEGORY_SEPARATOR)
            || self.categories.iter().any(|c| c == category)
        {
            return false;
        }
        self.categories.push(category.to_string());
        true
    }

    pub fn remove_category(&mut self, category: &str) -> bool {
        let before = self.categories.len();
        self.categories.retain(|c| c != category);
        self.categories.len() != before
    }

    pub fn reset_categories(&mut self) {
        self.categories = default_categories();
    }

    /// Stores a new key unless it is blank or still the masked placeholder.
    pub fn set_api_key(&mut self, key: &str) -> bool {
        let key = key.trim();
        if key.is_empty() || key.contains(MASK_CHAR) {
            return false;
        }
        self.openai_api_key = key.to_string();
        true
    }

    /// Immutable snapshot used for a single pipeline invocation.
    pub fn settings(&self) -> Settings {
        Settings {
            api_key: self.openai_api_key.clone(),
            model: Some(self.openai_model.clone()).filter(|m| !m.trim().is_empty()),
            categories: self.categories.clone(),
            api_base_url: self.api_base_url.clone(),
            max_input_chars: self.max_input_chars,
            request_timeout_secs: self.request_timeout_secs,
        }
    }
}

/// Per-invocation settings. Read once, never mutated while a call is in flight.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    pub model: Option<String>,
    pub categories: Vec<String>,
    pub api_base_url: String,
    pub max_input_chars: usize,
    pub request_timeout_secs: u64,
}

impl Settings {
    pub fn new(api_key: impl Into<String>, categories: Vec<String>) -> Self {
        let defaults = AppConfig::default();
        Self {
            api_key: api_key.into(),
            model: None,
            categories,
            api_base_url: defaults.api_base_url,
            max_input_chars: defaults.max_input_chars,
            request_timeout_secs: defaults.request_timeout_secs,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// Fails fast on anything that would make the network call pointless.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(PipelineError::missing_api_key());
        }
        if self.categories.iter().all(|c| c.trim().is_empty()) {
            return Err(PipelineError::Configuration(
                "No categories configured. Add at least one category in Settings.".to_string(),
            ));
        }
        if let Some(bad) = self
            .categories
            .iter()
            .find(|c| c.trim().is_empty() || c.contains(CATEGORY_SEPARATOR))
        {
            return Err(PipelineError::Configuration(format!(
                "Invalid category {:?}. Names must be non-empty and cannot contain '{}'.",
                bad, CATEGORY_SEPARATOR
            )));
        }
        Ok(())
    }
}
