use std::collections::BTreeMap;

use anyhow::Result;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::config::Config;
use crate::content::bank::QuestionBank;
use crate::content::catalog::Catalog;
use crate::content::question::DifficultyFilter;
use crate::engine::selector::{self, Scope};
use crate::engine::stats::TopicTally;
use crate::session::history::TestHistory;
use crate::session::record::TestRecord;
use crate::session::test::{Score, TestSession};
use crate::store::json_store::JsonStore;

/// All long-lived state: the loaded catalog and question cache, the persisted
/// history, the user config, and the rng feeding every sampling decision.
pub struct App {
    pub config: Config,
    pub catalog: Catalog,
    pub bank: QuestionBank,
    pub history: TestHistory,
    rng: SmallRng,
}

impl App {
    pub fn new() -> Self {
        let mut config = Config::load().unwrap_or_default();
        config.normalize();

        let content_dir = config.content_dir();
        let catalog = Catalog::load(&content_dir);
        let bank = QuestionBank::new(content_dir);
        let history = TestHistory::load(JsonStore::new().ok());

        Self {
            config,
            catalog,
            bank,
            history,
            rng: SmallRng::from_entropy(),
        }
    }

    /// App over explicit parts, with a seedable rng. Used by tests; `new` is
    /// the production wiring.
    pub fn with_parts(
        config: Config,
        catalog: Catalog,
        bank: QuestionBank,
        history: TestHistory,
        rng: SmallRng,
    ) -> Self {
        Self {
            config,
            catalog,
            bank,
            history,
            rng,
        }
    }

    /// Assemble a test for the scope and apply the configured shuffling.
    pub fn assemble(
        &mut self,
        scope: &Scope,
        filter: DifficultyFilter,
        count: usize,
    ) -> TestSession {
        let mut questions = selector::assemble(
            &self.catalog,
            &mut self.bank,
            scope,
            filter,
            count,
            &mut self.rng,
        );
        selector::shuffle(
            &mut questions,
            self.config.shuffle_questions,
            self.config.shuffle_options,
            &mut self.rng,
        );
        TestSession::new(questions)
    }

    /// Score a finished session, snapshot it into history, and return the
    /// score together with its per-topic breakdown.
    pub fn submit(
        &mut self,
        session: &TestSession,
        scope: &Scope,
    ) -> Result<(Score, BTreeMap<String, TopicTally>)> {
        let record = TestRecord::from_session(session, scope);
        let score = session.score();
        let breakdown = record.topic_breakdown().unwrap_or_default();
        self.history.append(record)?;
        Ok((score, breakdown))
    }
}
