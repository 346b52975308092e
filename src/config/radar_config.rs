use crate::services::error_handling::GenerationError;
use crate::services::generator::GeneratorSettings;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

pub const API_KEY_ENV: &str = "PERPLEXITY_API_KEY";

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a JSON generator. Output ONLY valid JSON. Your response must be parseable by JSON.parse().

FORMAT REQUIREMENTS:
- Start with [ character
- End with ] character
- NO markdown code blocks
- NO explanatory text before or after
- NO extra fields beyond the 5 required

REQUIRED FIELDS (use these EXACT field names):
1. "label" - string, max 5 words, title case
2. "quadrant" - MUST be one of: "Technology", "Society", "Economy", "Environment"
3. "ring" - MUST be one of: "0-2 Years", "2-5 Years", "5-10 Years"
4. "impact" - MUST be one of: "High", "Medium", "Low"
5. "summary" - string, max 15 words, descriptive

CORRECT EXAMPLES:
[{"label":"AI Tutoring Systems","quadrant":"Technology","ring":"0-2 Years","impact":"High","summary":"Schools deploy AI for personalized student learning"}]

[{"label":"Remote Work Culture","quadrant":"Society","ring":"2-5 Years","impact":"Medium","summary":"Hybrid work becomes standard practice globally"}]

WRONG - DO NOT USE THESE FIELD NAMES:
- "name" (use "label")
- "description" (use "summary")
- "impact_level" (use "impact")
- "timeline" (use "ring")
- "sources" (do not include)

Return the JSON array now."#;

pub const DEFAULT_USER_PROMPT: &str = r#"Generate 48 emerging trends for: {domain}

REQUIREMENTS:
- Distribute evenly across all 4 quadrants (Technology, Society, Economy, Environment)
- Distribute evenly across all 3 time rings (0-2 Years, 2-5 Years, 5-10 Years)
- Use exactly these field names: label, quadrant, ring, impact, summary
- No additional fields

Return only the JSON array starting with [ and ending with ]."#;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RadarConfig {
    /// Perplexity API key
    pub api_key: Option<String>,

    /// Replaces the built-in system prompt when set
    pub system_prompt: Option<String>,

    /// Replaces the built-in user prompt when set (supports {domain})
    pub user_prompt: Option<String>,

    /// Chat completions endpoint
    pub endpoint: String,

    pub model: String,

    pub temperature: f64,

    pub max_tokens: u32,

    /// Maximum time to wait for one generation request (in seconds)
    pub timeout_seconds: u64,

    /// How many searches the history lists
    pub history_limit: usize,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            system_prompt: None,
            user_prompt: None,
            endpoint: "https://api.perplexity.ai/chat/completions".to_string(),
            model: "sonar-pro".to_string(),
            temperature: 0.2,
            max_tokens: 8000,
            timeout_seconds: 120,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl RadarConfig {
    /// Load configuration from the default location, creating it on first use.
    /// `PERPLEXITY_API_KEY` overrides the stored key.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            let default_config = Self::default();
            default_config.save()?;
            default_config
        };
        config.apply_env();
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("trendradar").join("config.toml"))
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.api_key = Some(key.trim().to_string());
            }
        }
    }

    pub fn set_api_key(&mut self, key: &str) {
        let key = key.trim();
        self.api_key = if key.is_empty() { None } else { Some(key.to_string()) };
    }

    pub fn clear_api_key(&mut self) {
        self.api_key = None;
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    pub fn set_prompts(&mut self, system_prompt: Option<String>, user_prompt: Option<String>) {
        self.system_prompt = system_prompt.filter(|p| !p.trim().is_empty());
        self.user_prompt = user_prompt.filter(|p| !p.trim().is_empty());
    }

    pub fn reset_prompts(&mut self) {
        self.system_prompt = None;
        self.user_prompt = None;
    }

    pub fn effective_system_prompt(&self) -> &str {
        self.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }

    /// User prompt with the first `{domain}` filled in.
    pub fn render_user_prompt(&self, domain: &str) -> String {
        render_user_prompt(self.user_prompt.as_deref(), domain)
    }

    /// Settings threaded into a generator call.
    pub fn generator_settings(&self) -> Result<GeneratorSettings, GenerationError> {
        let credential = self
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(GenerationError::MissingCredential)?;

        Ok(GeneratorSettings {
            credential: credential.to_string(),
            system_prompt_override: self.system_prompt.clone(),
            user_prompt_override: self.user_prompt.clone(),
        })
    }
}

pub fn render_user_prompt(template: Option<&str>, domain: &str) -> String {
    template
        .unwrap_or(DEFAULT_USER_PROMPT)
        .replacen("{domain}", domain, 1)
}
