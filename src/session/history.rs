use std::collections::HashMap;

use anyhow::Result;
use log::warn;
use thiserror::Error;

use crate::content::bank::QuestionBank;
use crate::content::catalog::Catalog;
use crate::content::question::Question;
use crate::session::record::TestRecord;
use crate::store::json_store::JsonStore;
use crate::store::schema::HistoryData;

/// Only this many most-recent tests are kept.
pub const HISTORY_CAP: usize = 50;

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum HistoryError {
    #[error("no test at index {0}")]
    NotFound(usize),
    #[error("record predates topic tracking and cannot be replayed")]
    Incompatible,
}

/// Rolling store of past tests, most recent first, persisted through an
/// injected `JsonStore` (or held purely in memory when none is given).
pub struct TestHistory {
    records: Vec<TestRecord>,
    store: Option<JsonStore>,
}

impl TestHistory {
    pub fn load(store: Option<JsonStore>) -> Self {
        let records = store
            .as_ref()
            .map(|s| s.load_history().records)
            .unwrap_or_default();
        Self { records, store }
    }

    pub fn in_memory() -> Self {
        Self {
            records: Vec::new(),
            store: None,
        }
    }

    pub fn records(&self) -> &[TestRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Prepend a record and drop anything past the cap, then persist.
    pub fn append(&mut self, record: TestRecord) -> Result<()> {
        self.records.insert(0, record);
        self.records.truncate(HISTORY_CAP);
        self.persist()
    }

    pub fn get(&self, index: usize) -> Result<&TestRecord, HistoryError> {
        self.records.get(index).ok_or(HistoryError::NotFound(index))
    }

    pub fn clear(&mut self) -> Result<()> {
        self.records.clear();
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        if let Some(store) = &self.store {
            store.save_history(&HistoryData {
                records: self.records.clone(),
                ..HistoryData::default()
            })?;
        }
        Ok(())
    }
}

/// Question sequence rebuilt for retaking a past test. `missing` counts
/// recorded questions that no longer resolve, so a partial retake is always
/// flagged to the caller.
#[derive(Debug)]
pub struct RetakeTest {
    pub questions: Vec<Question>,
    pub missing: usize,
}

/// Every catalog topic's questions, freshly loaded and keyed by
/// `(topic id, question id)`. Ids repeat across topics, so the bare id is
/// never a valid key.
fn question_index(catalog: &Catalog, bank: &mut QuestionBank) -> HashMap<(String, u32), Question> {
    let mut index = HashMap::new();
    for topic in &catalog.topics {
        for question in bank.load(catalog, &topic.id) {
            index.insert((question.topic.clone(), question.id), question.clone());
        }
    }
    index
}

/// Rebuild a record's question sequence for review. Questions that no longer
/// resolve become placeholders carrying the stored correct answer, so the
/// review stays readable instead of failing outright.
pub fn rebuild_for_review(
    record: &TestRecord,
    catalog: &Catalog,
    bank: &mut QuestionBank,
) -> Result<Vec<Question>, HistoryError> {
    let topics = record
        .question_topics
        .as_ref()
        .ok_or(HistoryError::Incompatible)?;
    let index = question_index(catalog, bank);

    let questions = record
        .question_ids
        .iter()
        .enumerate()
        .map(|(i, &id)| {
            let topic = topics.get(i).cloned().unwrap_or_default();
            match index.get(&(topic.clone(), id)) {
                Some(question) => question.clone(),
                None => {
                    warn!("question {topic}/{id} no longer resolves, inserting placeholder");
                    placeholder(
                        id,
                        &topic,
                        record.correct_answers.get(i).cloned().unwrap_or_default(),
                    )
                }
            }
        })
        .collect();
    Ok(questions)
}

/// Rebuild a record's question sequence for a retake. Unresolvable questions
/// are dropped and counted rather than silently shortening the test.
pub fn rebuild_for_retake(
    record: &TestRecord,
    catalog: &Catalog,
    bank: &mut QuestionBank,
) -> Result<RetakeTest, HistoryError> {
    let topics = record
        .question_topics
        .as_ref()
        .ok_or(HistoryError::Incompatible)?;
    let index = question_index(catalog, bank);

    let mut questions = Vec::with_capacity(record.question_ids.len());
    let mut missing = 0;
    for (i, &id) in record.question_ids.iter().enumerate() {
        let topic = topics.get(i).cloned().unwrap_or_default();
        match index.get(&(topic.clone(), id)) {
            Some(question) => questions.push(question.clone()),
            None => {
                warn!("question {topic}/{id} no longer resolves, retake will be partial");
                missing += 1;
            }
        }
    }
    Ok(RetakeTest { questions, missing })
}

fn placeholder(id: u32, topic: &str, answer: String) -> Question {
    Question {
        id,
        topic: topic.to_string(),
        prompt: format!("[Question {id} is no longer available]"),
        options: Vec::new(),
        answer,
        explanation: "The question data could not be loaded.".to_string(),
        marks: 1,
        difficulty: None,
        question_type: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::catalog::Topic;
    use std::collections::HashMap;

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

    fn make_record(pairs: &[(&str, u32)]) -> TestRecord {
        TestRecord {
            id: 1,
            date: "2026-08-01".to_string(),
            topic: "all".to_string(),
            score: 0,
            total: pairs.len() as u32,
            question_ids: pairs.iter().map(|(_, id)| *id).collect(),
            question_topics: Some(pairs.iter().map(|(t, _)| t.to_string()).collect()),
            user_answers: vec![None; pairs.len()],
            correct_answers: vec!["a".to_string(); pairs.len()],
        }
    }

    fn fixture(topics: &[(&str, u32)]) -> (Catalog, QuestionBank) {
        let catalog = Catalog {
            topics: topics
                .iter()
                .map(|(id, _)| Topic {
                    id: id.to_string(),
                    name: id.to_string(),
                    file: format!("{id}.json"),
                    weight: 1,
                })
                .collect(),
            distribution: Vec::new(),
        };
        let cache: HashMap<String, Vec<Question>> = topics
            .iter()
            .map(|(id, count)| {
                let questions = (1..=*count).map(|i| make_question(id, i)).collect();
                (id.to_string(), questions)
            })
            .collect();
        (catalog, QuestionBank::with_topics(cache))
    }

    #[test]
    fn test_append_is_most_recent_first() {
        let mut history = TestHistory::in_memory();
        let mut first = make_record(&[("a", 1)]);
        first.id = 1;
        let mut second = make_record(&[("a", 2)]);
        second.id = 2;
        history.append(first).unwrap();
        history.append(second).unwrap();
        assert_eq!(history.records()[0].id, 2);
        assert_eq!(history.records()[1].id, 1);
    }

    #[test]
    fn test_cap_drops_oldest() {
        let mut history = TestHistory::in_memory();
        for i in 0..(HISTORY_CAP as i64 + 5) {
            let mut record = make_record(&[("a", 1)]);
            record.id = i;
            history.append(record).unwrap();
        }
        assert_eq!(history.len(), HISTORY_CAP);
        // Newest kept at the front, oldest five evicted.
        assert_eq!(history.records()[0].id, HISTORY_CAP as i64 + 4);
        assert_eq!(history.records().last().unwrap().id, 5);
    }

    #[test]
    fn test_get_out_of_range() {
        let history = TestHistory::in_memory();
        assert_eq!(history.get(0).unwrap_err(), HistoryError::NotFound(0));
    }

    #[test]
    fn test_clear_empties() {
        let mut history = TestHistory::in_memory();
        history.append(make_record(&[("a", 1)])).unwrap();
        history.clear().unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn test_retake_resolves_by_topic_and_id() {
        // Both topics contain id 1; the record must get each topic's own.
        let (catalog, mut bank) = fixture(&[("tenses", 3), ("modals", 3)]);
        let record = make_record(&[("modals", 1), ("tenses", 1), ("tenses", 3)]);

        let retake = rebuild_for_retake(&record, &catalog, &mut bank).unwrap();
        assert_eq!(retake.missing, 0);
        let keys: Vec<(String, u32)> = retake
            .questions
            .iter()
            .map(|q| (q.topic.clone(), q.id))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("modals".to_string(), 1),
                ("tenses".to_string(), 1),
                ("tenses".to_string(), 3)
            ]
        );
    }

    #[test]
    fn test_retake_counts_missing_questions() {
        let (catalog, mut bank) = fixture(&[("tenses", 2)]);
        let record = make_record(&[("tenses", 1), ("tenses", 99), ("gone", 1)]);

        let retake = rebuild_for_retake(&record, &catalog, &mut bank).unwrap();
        assert_eq!(retake.questions.len(), 1);
        assert_eq!(retake.missing, 2);
    }

    #[test]
    fn test_review_inserts_placeholder_with_stored_answer() {
        let (catalog, mut bank) = fixture(&[("tenses", 1)]);
        let mut record = make_record(&[("tenses", 1), ("tenses", 7)]);
        record.correct_answers = vec!["a".to_string(), "kept answer".to_string()];

        let questions = rebuild_for_review(&record, &catalog, &mut bank).unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].id, 1);
        assert!(questions[1].options.is_empty());
        assert_eq!(questions[1].answer, "kept answer");
        assert!(questions[1].prompt.contains("no longer available"));
    }

    #[test]
    fn test_legacy_record_is_rejected_not_repaired() {
        let (catalog, mut bank) = fixture(&[("tenses", 2)]);
        let mut record = make_record(&[("tenses", 1)]);
        record.question_topics = None;

        assert_eq!(
            rebuild_for_review(&record, &catalog, &mut bank).unwrap_err(),
            HistoryError::Incompatible
        );
        assert_eq!(
            rebuild_for_retake(&record, &catalog, &mut bank).unwrap_err(),
            HistoryError::Incompatible
        );
    }
}
