use std::collections::BTreeMap;

use crate::session::record::TestRecord;

/// Bucket for questions whose topic was never recorded.
pub const UNKNOWN_TOPIC: &str = "unknown";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TopicTally {
    pub correct: u32,
    pub total: u32,
}

/// Count-based per-topic tallies over parallel answer slices. Pure; the same
/// function serves a live session and a rehydrated history record, so review
/// and in-progress scoring always agree.
pub fn breakdown(
    topics: &[String],
    user_answers: &[Option<String>],
    correct_answers: &[String],
) -> BTreeMap<String, TopicTally> {
    let mut stats: BTreeMap<String, TopicTally> = BTreeMap::new();
    for (i, correct) in correct_answers.iter().enumerate() {
        let topic = topics
            .get(i)
            .filter(|t| !t.is_empty())
            .map(|t| t.as_str())
            .unwrap_or(UNKNOWN_TOPIC);
        let tally = stats.entry(topic.to_string()).or_default();
        tally.total += 1;
        if user_answers.get(i).and_then(|a| a.as_deref()) == Some(correct.as_str()) {
            tally.correct += 1;
        }
    }
    stats
}

/// Rounded percentage, 0 when there is nothing to measure.
pub fn accuracy_percent(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (100.0 * correct as f64 / total as f64).round() as u32
}

/// Share of questions answered correctly in a record, count-based.
pub fn record_accuracy(record: &TestRecord) -> u32 {
    let correct = record
        .correct_answers
        .iter()
        .enumerate()
        .filter(|(i, answer)| {
            record.user_answers.get(*i).and_then(|a| a.as_deref()) == Some(answer.as_str())
        })
        .count() as u32;
    accuracy_percent(correct, record.question_ids.len() as u32)
}

/// Mean of per-record score percentages, rounded.
pub fn average_score(records: &[TestRecord]) -> u32 {
    if records.is_empty() {
        return 0;
    }
    let sum: f64 = records
        .iter()
        .map(|r| {
            if r.total == 0 {
                0.0
            } else {
                r.score as f64 / r.total as f64 * 100.0
            }
        })
        .sum();
    (sum / records.len() as f64).round() as u32
}
