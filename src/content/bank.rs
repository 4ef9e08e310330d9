use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use log::{debug, warn};

use crate::content::ContentAssets;
use crate::content::catalog::Catalog;
use crate::content::question::Question;

/// Per-topic question cache. The first `load` for a topic reads its file and
/// caches the parsed result; every later call returns the cache without I/O.
pub struct QuestionBank {
    content_dir: PathBuf,
    cache: HashMap<String, Vec<Question>>,
}

impl QuestionBank {
    pub fn new(content_dir: PathBuf) -> Self {
        Self {
            content_dir,
            cache: HashMap::new(),
        }
    }

    /// Bank with a pre-seeded cache and no backing files, for tests and
    /// benches that need deterministic content.
    pub fn with_topics(topics: HashMap<String, Vec<Question>>) -> Self {
        Self {
            content_dir: PathBuf::new(),
            cache: topics,
        }
    }

    /// Questions for a topic. Any failure (unknown topic, missing file,
    /// parse error) resolves to an empty slice with a logged warning, so a
    /// mixed assembly proceeds with whatever topics did load.
    pub fn load(&mut self, catalog: &Catalog, topic_id: &str) -> &[Question] {
        if !self.cache.contains_key(topic_id) {
            let questions = self.fetch(catalog, topic_id);
            self.cache.insert(topic_id.to_string(), questions);
        }
        self.cache.get(topic_id).map(Vec::as_slice).unwrap_or_default()
    }

    fn fetch(&self, catalog: &Catalog, topic_id: &str) -> Vec<Question> {
        let Some(topic) = catalog.topic(topic_id) else {
            warn!("topic {topic_id} not found in catalog");
            return Vec::new();
        };
        let Some(content) = self.read_source(&topic.file) else {
            warn!("no question file {} for topic {topic_id}", topic.file);
            return Vec::new();
        };
        match serde_json::from_str::<Vec<Question>>(&content) {
            Ok(parsed) => {
                let before = parsed.len();
                let mut questions: Vec<Question> =
                    parsed.into_iter().filter(|q| q.is_well_formed()).collect();
                if questions.len() < before {
                    warn!(
                        "dropped {} malformed question(s) from topic {topic_id}",
                        before - questions.len()
                    );
                }
                for q in &mut questions {
                    q.topic = topic_id.to_string();
                }
                debug!("loaded {} questions for topic {topic_id}", questions.len());
                questions
            }
            Err(e) => {
                warn!("cannot parse questions for topic {topic_id}: {e}");
                Vec::new()
            }
        }
    }

    /// Content directory first, bundled assets second.
    fn read_source(&self, file: &str) -> Option<String> {
        let path = self.content_dir.join(file);
        if let Ok(content) = fs::read_to_string(&path) {
            return Some(content);
        }
        ContentAssets::get(file).and_then(|f| String::from_utf8(f.data.into_owned()).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::catalog::Topic;
    use tempfile::TempDir;

    fn make_catalog(dir_topics: &[(&str, &str)]) -> Catalog {
        Catalog {
            topics: dir_topics
                .iter()
                .map(|(id, file)| Topic {
                    id: id.to_string(),
                    name: id.to_string(),
                    file: file.to_string(),
                    weight: 1,
                })
                .collect(),
            distribution: Vec::new(),
        }
    }

    #[test]
    fn test_load_stamps_topic_id() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("t1.json"),
            r#"[{ "id": 1, "question": "Q?", "options": ["a", "b"], "answer": "a" }]"#,
        )
        .unwrap();

        let catalog = make_catalog(&[("t1", "t1.json")]);
        let mut bank = QuestionBank::new(dir.path().to_path_buf());
        let questions = bank.load(&catalog, "t1");
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].topic, "t1");
    }

    #[test]
    fn test_second_load_serves_the_cache() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t1.json");
        std::fs::write(
            &path,
            r#"[{ "id": 1, "question": "Q?", "options": ["a", "b"], "answer": "a" }]"#,
        )
        .unwrap();

        let catalog = make_catalog(&[("t1", "t1.json")]);
        let mut bank = QuestionBank::new(dir.path().to_path_buf());
        assert_eq!(bank.load(&catalog, "t1").len(), 1);

        // Remove the backing file: a cached topic must not re-read it.
        std::fs::remove_file(&path).unwrap();
        assert_eq!(bank.load(&catalog, "t1").len(), 1);
    }

    #[test]
    fn test_unknown_topic_yields_empty() {
        let dir = TempDir::new().unwrap();
        let catalog = make_catalog(&[("t1", "t1.json")]);
        let mut bank = QuestionBank::new(dir.path().to_path_buf());
        assert!(bank.load(&catalog, "missing").is_empty());
    }

    #[test]
    fn test_unparseable_file_yields_empty() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("t1.json"), "[ not json").unwrap();

        let catalog = make_catalog(&[("t1", "t1.json")]);
        let mut bank = QuestionBank::new(dir.path().to_path_buf());
        assert!(bank.load(&catalog, "t1").is_empty());
    }

    #[test]
    fn test_malformed_questions_are_dropped() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("t1.json"),
            r#"[
                { "id": 1, "question": "ok", "options": ["a", "b"], "answer": "a" },
                { "id": 2, "question": "one option", "options": ["a"], "answer": "a" },
                { "id": 3, "question": "answer missing", "options": ["a", "b"], "answer": "z" }
            ]"#,
        )
        .unwrap();

        let catalog = make_catalog(&[("t1", "t1.json")]);
        let mut bank = QuestionBank::new(dir.path().to_path_buf());
        let questions = bank.load(&catalog, "t1");
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].id, 1);
    }

    #[test]
    fn test_missing_file_falls_back_to_bundled_assets() {
        let dir = TempDir::new().unwrap();
        let catalog = make_catalog(&[("tenses", "tenses.json")]);
        let mut bank = QuestionBank::new(dir.path().to_path_buf());
        let questions = bank.load(&catalog, "tenses");
        assert!(!questions.is_empty());
        assert!(questions.iter().all(|q| q.topic == "tenses"));
    }
}
