use log::warn;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::content::bank::QuestionBank;
use crate::content::catalog::Catalog;
use crate::content::question::{DifficultyFilter, Question};

/// Test selection mode: one topic, or the distribution-shaped mixed test.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scope {
    All,
    Topic(String),
}

impl Scope {
    pub fn parse(value: &str) -> Self {
        if value == "all" {
            Scope::All
        } else {
            Scope::Topic(value.to_string())
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Scope::All => "all",
            Scope::Topic(id) => id,
        }
    }
}

/// Uniform sample without replacement: shuffle a copy, keep the first
/// `count`. Returns the whole pool when it is not larger than `count`.
pub fn sample<R: Rng>(mut pool: Vec<Question>, count: usize, rng: &mut R) -> Vec<Question> {
    if pool.len() <= count {
        return pool;
    }
    pool.shuffle(rng);
    pool.truncate(count);
    pool
}

/// Assemble a test for the scope: difficulty filtering is applied per topic
/// before sampling, and the mixed mode scales the catalog distribution to the
/// requested size. The result is ordered by distribution topic until
/// `shuffle` is applied.
pub fn assemble<R: Rng>(
    catalog: &Catalog,
    bank: &mut QuestionBank,
    scope: &Scope,
    filter: DifficultyFilter,
    target_count: usize,
    rng: &mut R,
) -> Vec<Question> {
    match scope {
        Scope::Topic(topic_id) => {
            let filtered = filter.apply(bank.load(catalog, topic_id));
            let want = target_count.min(filtered.len());
            sample(filtered, want, rng)
        }
        Scope::All => assemble_mixed(catalog, bank, filter, target_count, rng),
    }
}

fn assemble_mixed<R: Rng>(
    catalog: &Catalog,
    bank: &mut QuestionBank,
    filter: DifficultyFilter,
    target_count: usize,
    rng: &mut R,
) -> Vec<Question> {
    let total: u32 = catalog.distribution.iter().map(|(_, count)| count).sum();
    if total == 0 {
        warn!("full-test distribution is empty, nothing to assemble");
        return Vec::new();
    }
    let scale = target_count as f64 / total as f64;

    let mut test = Vec::new();
    for (topic_id, count) in &catalog.distribution {
        if !catalog.contains(topic_id) {
            warn!("distribution topic {topic_id} not in catalog, skipping");
            continue;
        }
        let questions = bank.load(catalog, topic_id);
        if questions.is_empty() {
            continue;
        }
        let scaled = ((*count as f64 * scale).round() as usize).max(1);
        let filtered = filter.apply(questions);
        test.extend(sample(filtered, scaled, rng));
    }

    if test.len() > target_count {
        test = sample(test, target_count, rng);
    } else if test.len() < target_count {
        // Top-up from the pooled union of all distribution topics. Questions
        // already picked per-topic are not excluded here, so a top-up draw
        // can repeat an earlier pick.
        let mut pool: Vec<Question> = Vec::new();
        for (topic_id, _) in &catalog.distribution {
            pool.extend_from_slice(bank.load(catalog, topic_id));
        }
        let shortfall = target_count - test.len();
        test.extend(sample(filter.apply(&pool), shortfall, rng));
    }

    test
}

/// Optional final randomization: permute the question order, then permute
/// each question's options independently. Correctness is carried by the
/// answer string, so option shuffling can never invalidate it.
pub fn shuffle<R: Rng>(
    test: &mut [Question],
    shuffle_questions: bool,
    shuffle_options: bool,
    rng: &mut R,
) {
    if shuffle_questions {
        test.shuffle(rng);
    }
    if shuffle_options {
        for question in test.iter_mut() {
            question.options.shuffle(rng);
        }
    }
}
