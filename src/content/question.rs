use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// One multiple-choice question. `id` is only unique within a topic, so every
/// lookup key in the crate is the `(topic, id)` pair, never the bare id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    /// Stamped by the bank at load time; question files do not carry it.
    #[serde(default)]
    pub topic: String,
    #[serde(rename = "question")]
    pub prompt: String,
    pub options: Vec<String>,
    pub answer: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default = "default_marks")]
    pub marks: u32,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub question_type: Option<String>,
}

fn default_marks() -> u32 {
    1
}

impl Question {
    /// A question is usable when it offers a real choice and its answer is
    /// one of the offered options.
    pub fn is_well_formed(&self) -> bool {
        self.options.len() >= 2 && self.options.iter().any(|o| o == &self.answer)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DifficultyFilter {
    All,
    Only(Difficulty),
}

impl DifficultyFilter {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "all" => Some(DifficultyFilter::All),
            "easy" => Some(DifficultyFilter::Only(Difficulty::Easy)),
            "medium" => Some(DifficultyFilter::Only(Difficulty::Medium)),
            "hard" => Some(DifficultyFilter::Only(Difficulty::Hard)),
            _ => None,
        }
    }

    pub fn matches(&self, question: &Question) -> bool {
        match self {
            DifficultyFilter::All => true,
            DifficultyFilter::Only(level) => question.difficulty == Some(*level),
        }
    }

    pub fn apply(&self, questions: &[Question]) -> Vec<Question> {
        questions
            .iter()
            .filter(|q| self.matches(q))
            .cloned()
            .collect()
    }
}
