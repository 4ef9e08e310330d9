use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::engine::selector::Scope;
use crate::engine::stats::{self, TopicTally};
use crate::session::test::TestSession;

/// Persisted snapshot of a completed test, written at submit time and
/// immutable afterwards. Question identity is kept as parallel id/topic
/// sequences because ids repeat across topics.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestRecord {
    pub id: i64,
    pub date: String,
    pub topic: String,
    pub score: u32,
    pub total: u32,
    pub question_ids: Vec<u32>,
    /// Parallel to `question_ids`. Absent on records written before topics
    /// were tracked; such records cannot be replayed.
    #[serde(default)]
    pub question_topics: Option<Vec<String>>,
    pub user_answers: Vec<Option<String>>,
    pub correct_answers: Vec<String>,
}

impl TestRecord {
    pub fn from_session(session: &TestSession, scope: &Scope) -> Self {
        let now = Utc::now();
        let score = session.score();
        Self {
            id: now.timestamp_millis(),
            date: now.format("%Y-%m-%d").to_string(),
            topic: scope.key().to_string(),
            score: score.earned,
            total: score.total,
            question_ids: session.questions().iter().map(|q| q.id).collect(),
            question_topics: Some(session.questions().iter().map(|q| q.topic.clone()).collect()),
            user_answers: session.answers().to_vec(),
            correct_answers: session.questions().iter().map(|q| q.answer.clone()).collect(),
        }
    }

    /// Per-topic tallies, or None for legacy records without topic tracking.
    pub fn topic_breakdown(&self) -> Option<BTreeMap<String, TopicTally>> {
        let topics = self.question_topics.as_ref()?;
        Some(stats::breakdown(topics, &self.user_answers, &self.correct_answers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::question::Question;

    fn make_question(topic: &str, id: u32) -> Question {
        Question {
            id,
            topic: topic.to_string(),
            prompt: format!("{topic} {id}"),
            options: vec!["a".to_string(), "b".to_string()],
            answer: "a".to_string(),
            explanation: String::new(),
            marks: 1,
            difficulty: None,
            question_type: None,
        }
    }

    #[test]
    fn test_from_session_keeps_parallel_sequences() {
        let mut session = TestSession::new(vec![
            make_question("tenses", 1),
            make_question("modals", 1),
            make_question("voice", 2),
        ]);
        session.record_answer(0, "a".to_string()).unwrap();
        session.record_answer(2, "b".to_string()).unwrap();

        let record = TestRecord::from_session(&session, &Scope::All);
        assert_eq!(record.topic, "all");
        assert_eq!(record.question_ids, vec![1, 1, 2]);
        assert_eq!(
            record.question_topics.as_deref(),
            Some(&["tenses".to_string(), "modals".to_string(), "voice".to_string()][..])
        );
        assert_eq!(record.user_answers[1], None);
        assert_eq!(record.correct_answers.len(), 3);
        assert_eq!(record.score, 1);
        assert_eq!(record.total, 3);
        assert_eq!(record.date.len(), 10);
    }

    #[test]
    fn test_topic_scope_key_recorded() {
        let session = TestSession::new(vec![make_question("voice", 1)]);
        let record = TestRecord::from_session(&session, &Scope::Topic("voice".to_string()));
        assert_eq!(record.topic, "voice");
    }

    #[test]
    fn test_legacy_record_deserializes_without_topics() {
        let json = r#"{
            "id": 1700000000000,
            "date": "2023-11-14",
            "topic": "all",
            "score": 2,
            "total": 4,
            "question_ids": [1, 2, 3, 4],
            "user_answers": ["a", null, "c", "d"],
            "correct_answers": ["a", "b", "c", "x"]
        }"#;
        let record: TestRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.question_topics, None);
        assert_eq!(record.topic_breakdown(), None);
    }

    #[test]
    fn test_breakdown_matches_live_semantics() {
        let mut session = TestSession::new(vec![
            make_question("tenses", 1),
            make_question("tenses", 2),
            make_question("modals", 1),
        ]);
        session.record_answer(0, "a".to_string()).unwrap();
        session.record_answer(1, "b".to_string()).unwrap();

        let record = TestRecord::from_session(&session, &Scope::All);
        let stats = record.topic_breakdown().unwrap();
        assert_eq!(stats["tenses"], TopicTally { correct: 1, total: 2 });
        assert_eq!(stats["modals"], TopicTally { correct: 0, total: 1 });
    }
}
