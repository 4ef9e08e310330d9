use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::content::question::DifficultyFilter;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_question_count")]
    pub question_count: usize,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
    #[serde(default = "default_true")]
    pub shuffle_questions: bool,
    #[serde(default = "default_true")]
    pub shuffle_options: bool,
    #[serde(default = "default_true")]
    pub show_explanations: bool,
    #[serde(default)]
    pub auto_submit: bool,
    #[serde(default = "default_content_dir")]
    pub content_dir: String,
}

fn default_question_count() -> usize {
    20
}
fn default_difficulty() -> String {
    "all".to_string()
}
fn default_true() -> bool {
    true
}
fn default_content_dir() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gramdr")
        .join("content")
        .to_string_lossy()
        .to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            question_count: default_question_count(),
            difficulty: default_difficulty(),
            shuffle_questions: default_true(),
            shuffle_options: default_true(),
            show_explanations: default_true(),
            auto_submit: false,
            content_dir: default_content_dir(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    #[allow(dead_code)]
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gramdr")
            .join("config.toml")
    }

    pub fn content_dir(&self) -> PathBuf {
        PathBuf::from(&self.content_dir)
    }

    /// Clamp stale or hand-edited values back into range. Call after
    /// deserialization.
    pub fn normalize(&mut self) {
        if self.question_count == 0 {
            self.question_count = default_question_count();
        }
        self.question_count = self.question_count.min(100);
        if DifficultyFilter::parse(&self.difficulty).is_none() {
            self.difficulty = default_difficulty();
        }
    }
}
