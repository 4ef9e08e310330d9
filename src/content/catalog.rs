use std::fs;
use std::path::Path;

use log::warn;
use serde::Deserialize;

use crate::content::ContentAssets;

pub const CATALOG_FILE: &str = "config.json";

#[derive(Clone, Debug, Deserialize)]
pub struct Topic {
    pub id: String,
    pub name: String,
    pub file: String,
    #[serde(rename = "weightage")]
    pub weight: u32,
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    topics: Vec<Topic>,
    #[serde(rename = "testConfigs")]
    test_configs: RawTestConfigs,
}

#[derive(Debug, Deserialize)]
struct RawTestConfigs {
    #[serde(rename = "fullTest")]
    full_test: RawFullTest,
}

#[derive(Debug, Deserialize)]
struct RawFullTest {
    distribution: serde_json::Map<String, serde_json::Value>,
}

/// Topic list plus the full-test distribution, in the order the catalog
/// document declares them. Loaded once at startup and treated as immutable.
#[derive(Clone, Debug)]
pub struct Catalog {
    pub topics: Vec<Topic>,
    pub distribution: Vec<(String, u32)>,
}

impl Catalog {
    /// Read the catalog document from the content directory, falling back to
    /// the bundled default when the file is missing or unparseable.
    pub fn load(content_dir: &Path) -> Self {
        let path = content_dir.join(CATALOG_FILE);
        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(content) => match serde_json::from_str::<RawCatalog>(&content) {
                    Ok(raw) => return Self::from_raw(raw),
                    Err(e) => warn!(
                        "invalid catalog at {}: {e}; using bundled default",
                        path.display()
                    ),
                },
                Err(e) => warn!(
                    "cannot read catalog at {}: {e}; using bundled default",
                    path.display()
                ),
            }
        }
        Self::bundled()
    }

    fn bundled() -> Self {
        let raw = ContentAssets::get(CATALOG_FILE)
            .and_then(|f| serde_json::from_slice::<RawCatalog>(f.data.as_ref()).ok());
        match raw {
            Some(raw) => Self::from_raw(raw),
            None => {
                warn!("bundled catalog is missing or unreadable");
                Self {
                    topics: Vec::new(),
                    distribution: Vec::new(),
                }
            }
        }
    }

    fn from_raw(raw: RawCatalog) -> Self {
        let mut distribution = Vec::with_capacity(raw.test_configs.full_test.distribution.len());
        for (topic_id, value) in raw.test_configs.full_test.distribution {
            match value.as_u64() {
                Some(count) if count > 0 => distribution.push((topic_id, count as u32)),
                _ => warn!("dropping distribution entry {topic_id}: count must be a positive integer"),
            }
        }
        Self {
            topics: raw.topics,
            distribution,
        }
    }

    pub fn topic(&self, id: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.topic(id).is_some()
    }

    /// Human name for a scope key: a topic id, or "all" for the mixed test.
    pub fn display_name(&self, key: &str) -> &str {
        if key == "all" {
            return "All Topics";
        }
        self.topic(key).map(|t| t.name.as_str()).unwrap_or("Mixed Topics")
    }
}
