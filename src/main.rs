mod app;
mod config;
mod content;
mod engine;
mod session;
mod store;

use std::collections::BTreeMap;
use std::io::{self, Write};

use anyhow::Result;
use clap::{Parser, Subcommand};

use app::App;
use content::question::{DifficultyFilter, Question};
use engine::selector::Scope;
use engine::stats::{self, TopicTally};
use session::history::{self, HistoryError};
use session::record::TestRecord;
use session::test::TestSession;

#[derive(Parser)]
#[command(
    name = "gramdr",
    version,
    about = "Terminal grammar quiz trainer with weighted topic tests"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Take a new test
    Take {
        #[arg(short, long, help = "Number of questions")]
        count: Option<usize>,
        #[arg(short, long, default_value = "all", help = "Topic id, or \"all\" for a mixed test")]
        topic: String,
        #[arg(short, long, help = "Difficulty filter: all, easy, medium or hard")]
        difficulty: Option<String>,
    },
    /// List the topics in the catalog
    Topics,
    /// Print every question of a topic with answers and explanations
    Questions { topic: String },
    /// Show past test results
    History,
    /// Review a past test question by question (1 = most recent)
    Review { index: usize },
    /// Retake a past test with the same questions (1 = most recent)
    Retake { index: usize },
    /// Delete all saved test results
    ClearHistory,
}

fn main() -> Result<()> {
    pretty_env_logger::init();
    let cli = Cli::parse();
    let mut app = App::new();

    // With no subcommand, drop straight into a full test.
    let command = cli.command.unwrap_or(Command::Take {
        count: None,
        topic: "all".to_string(),
        difficulty: None,
    });

    match command {
        Command::Take {
            count,
            topic,
            difficulty,
        } => take(&mut app, count, &topic, difficulty.as_deref()),
        Command::Topics => {
            list_topics(&mut app);
            Ok(())
        }
        Command::Questions { topic } => {
            list_questions(&mut app, &topic);
            Ok(())
        }
        Command::History => {
            show_history(&app);
            Ok(())
        }
        Command::Review { index } => review(&mut app, index),
        Command::Retake { index } => retake(&mut app, index),
        Command::ClearHistory => clear_history(&mut app),
    }
}

fn take(app: &mut App, count: Option<usize>, topic: &str, difficulty: Option<&str>) -> Result<()> {
    let scope = Scope::parse(topic);
    if let Scope::Topic(id) = &scope {
        if !app.catalog.contains(id) {
            println!("Unknown topic \"{id}\". Run `gramdr topics` to list them.");
            return Ok(());
        }
    }

    let count = count.unwrap_or(app.config.question_count);
    let filter = parse_filter(difficulty.unwrap_or(&app.config.difficulty));
    let session = app.assemble(&scope, filter, count);
    if session.is_empty() {
        println!("No questions available for this selection.");
        return Ok(());
    }

    println!(
        "{}: {} question(s)",
        app.catalog.display_name(scope.key()),
        session.len()
    );
    run_quiz(app, session, &scope)
}

fn parse_filter(value: &str) -> DifficultyFilter {
    DifficultyFilter::parse(value).unwrap_or_else(|| {
        println!("Unknown difficulty \"{value}\", using all.");
        DifficultyFilter::All
    })
}

/// Prompt for every question, then submit. With auto-submit on, a fully
/// answered test is submitted without the confirmation round; otherwise
/// unanswered questions are offered again until the user submits.
fn run_quiz(app: &mut App, mut session: TestSession, scope: &Scope) -> Result<()> {
    for index in 0..session.len() {
        ask(&mut session, index)?;
    }

    while !session.is_complete() && !app.config.auto_submit {
        let open = session.len() - session.answered_count();
        let reply = read_line(&format!("Submit with {open} unanswered? [y/N] "))?;
        if reply.eq_ignore_ascii_case("y") {
            break;
        }
        for index in 0..session.len() {
            if session.answers()[index].is_none() {
                ask(&mut session, index)?;
            }
        }
    }

    let (score, breakdown) = app.submit(&session, scope)?;

    println!("\nYou scored {}/{}", score.earned, score.total);
    if score.total > 0 && score.earned == score.total {
        println!("Perfect score!");
    }
    print_breakdown(app, &breakdown);

    println!();
    for (index, question) in session.questions().iter().enumerate() {
        let given = session.answers()[index].as_deref();
        let correct = given == Some(question.answer.as_str());
        println!(
            "{} Q{}: {}",
            if correct { "✓" } else { "✗" },
            index + 1,
            question.prompt
        );
        if !correct {
            println!("    Your answer: {}", given.unwrap_or("Not attempted"));
            println!("    Correct:     {}", question.answer);
        }
        if app.config.show_explanations && !question.explanation.is_empty() {
            println!("    {}", question.explanation);
        }
    }
    Ok(())
}

fn ask(session: &mut TestSession, index: usize) -> Result<()> {
    // Cloned so recording the answer below can borrow the session mutably.
    let question = session.questions()[index].clone();
    print_question(index + 1, &question);

    loop {
        let last = letter(question.options.len().saturating_sub(1));
        let input = read_line(&format!("Answer [A-{last}], blank to skip: "))?;
        if input.is_empty() {
            return Ok(());
        }
        match option_choice(&input, question.options.len()) {
            Some(choice) => {
                session.record_answer(index, question.options[choice].clone())?;
                return Ok(());
            }
            None => println!("Please answer with a letter between A and {last}."),
        }
    }
}

fn print_question(number: usize, question: &Question) {
    let mut meta = vec![format!(
        "{} mark{}",
        question.marks,
        if question.marks > 1 { "s" } else { "" }
    )];
    if let Some(level) = question.difficulty {
        meta.push(level.as_str().to_string());
    }
    if let Some(kind) = &question.question_type {
        meta.push(kind.clone());
    }
    println!("\nQuestion {number} ({})", meta.join(", "));
    println!("{}", question.prompt);
    for (i, option) in question.options.iter().enumerate() {
        println!("  {}. {option}", letter(i));
    }
}

fn letter(index: usize) -> char {
    (b'A' + index as u8) as char
}

fn option_choice(input: &str, option_count: usize) -> Option<usize> {
    let mut chars = input.chars();
    let ch = chars.next()?;
    if chars.next().is_some() || !ch.is_ascii_alphabetic() {
        return None;
    }
    let index = (ch.to_ascii_uppercase() as u8 - b'A') as usize;
    (index < option_count).then_some(index)
}

fn read_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn print_breakdown(app: &App, breakdown: &BTreeMap<String, TopicTally>) {
    if breakdown.is_empty() {
        return;
    }
    println!("\nTopic performance:");
    for (topic_id, tally) in breakdown {
        println!(
            "  {:<28} {}/{}  {}%",
            topic_name(app, topic_id),
            tally.correct,
            tally.total,
            stats::accuracy_percent(tally.correct, tally.total)
        );
    }
}

fn topic_name<'a>(app: &'a App, topic_id: &'a str) -> &'a str {
    if topic_id == stats::UNKNOWN_TOPIC {
        "General"
    } else {
        app.catalog.display_name(topic_id)
    }
}

fn list_topics(app: &mut App) {
    if app.catalog.topics.is_empty() {
        println!("The catalog is empty.");
        return;
    }
    println!("{:<22} {:<28} {:>6} {:>10}", "ID", "NAME", "WEIGHT", "QUESTIONS");
    for topic in app.catalog.topics.clone() {
        let count = app.bank.load(&app.catalog, &topic.id).len();
        println!(
            "{:<22} {:<28} {:>6} {:>10}",
            topic.id, topic.name, topic.weight, count
        );
    }
}

fn list_questions(app: &mut App, topic: &str) {
    if !app.catalog.contains(topic) {
        println!("Unknown topic \"{topic}\". Run `gramdr topics` to list them.");
        return;
    }
    let questions = app.bank.load(&app.catalog, topic).to_vec();
    if questions.is_empty() {
        println!("No questions found for \"{topic}\".");
        return;
    }
    println!("{}: {} question(s)", app.catalog.display_name(topic), questions.len());
    for (i, question) in questions.iter().enumerate() {
        print_question(i + 1, question);
        println!("  Answer: {}", question.answer);
        if app.config.show_explanations && !question.explanation.is_empty() {
            println!("  {}", question.explanation);
        }
    }
}

fn show_history(app: &App) {
    let records = app.history.records();
    if records.is_empty() {
        println!("No test history yet. Complete a test to see it here.");
        return;
    }
    println!(
        "Total tests: {} | Average score: {}%",
        records.len(),
        stats::average_score(records)
    );
    for (i, record) in records.iter().enumerate() {
        println!(
            "#{:<3} {}  {:<28} {}/{} ({}%)  {}",
            i + 1,
            record.date,
            app.catalog.display_name(&record.topic),
            record.score,
            record.total,
            stats::record_accuracy(record),
            breakdown_summary(app, record)
        );
    }
}

/// One-line topic summary for a history row, e.g. "Tenses: 2/3, Modals: 1/1".
fn breakdown_summary(app: &App, record: &TestRecord) -> String {
    match record.topic_breakdown() {
        Some(breakdown) => breakdown
            .iter()
            .map(|(topic_id, tally)| {
                let name = topic_name(app, topic_id);
                let short = name.split_whitespace().next().unwrap_or(name);
                format!("{short}: {}/{}", tally.correct, tally.total)
            })
            .collect::<Vec<_>>()
            .join(", "),
        None => "(no topic data)".to_string(),
    }
}

fn review(app: &mut App, index: usize) -> Result<()> {
    let Some(record) = fetch_record(app, index) else {
        return Ok(());
    };
    let questions = match history::rebuild_for_review(&record, &app.catalog, &mut app.bank) {
        Ok(questions) => questions,
        Err(e @ HistoryError::Incompatible) => {
            println!("{e}. Take a new test instead.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    println!("Test review: {}", record.date);
    println!("Score: {}/{}", record.score, record.total);
    if let Some(breakdown) = record.topic_breakdown() {
        print_breakdown(app, &breakdown);
    }
    println!();

    for (i, question) in questions.iter().enumerate() {
        let given = record.user_answers.get(i).and_then(|a| a.as_deref());
        let correct_answer = record
            .correct_answers
            .get(i)
            .map(String::as_str)
            .unwrap_or_default();
        let correct = given == Some(correct_answer);
        println!(
            "{} Q{} [{}]: {}",
            if correct { "✓" } else { "✗" },
            i + 1,
            topic_name(app, &question.topic),
            question.prompt
        );
        if question.options.is_empty() {
            println!("    (options unavailable)");
        } else {
            for (j, option) in question.options.iter().enumerate() {
                println!("    {}. {option}", letter(j));
            }
        }
        println!("    Your answer: {}", given.unwrap_or("Not attempted"));
        println!("    Correct:     {correct_answer}");
        if app.config.show_explanations && !question.explanation.is_empty() {
            println!("    {}", question.explanation);
        }
    }
    Ok(())
}

fn retake(app: &mut App, index: usize) -> Result<()> {
    let Some(record) = fetch_record(app, index) else {
        return Ok(());
    };
    let rebuilt = match history::rebuild_for_retake(&record, &app.catalog, &mut app.bank) {
        Ok(rebuilt) => rebuilt,
        Err(e @ HistoryError::Incompatible) => {
            println!("{e}. Take a new test instead.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if rebuilt.missing > 0 {
        println!(
            "Warning: only {} of {} recorded questions could be loaded.",
            rebuilt.questions.len(),
            record.question_ids.len()
        );
    }
    if rebuilt.questions.is_empty() {
        println!("None of the recorded questions are available anymore.");
        return Ok(());
    }

    println!(
        "Retake of the test from {}: {} question(s)",
        record.date,
        rebuilt.questions.len()
    );
    let scope = Scope::parse(&record.topic);
    run_quiz(app, TestSession::new(rebuilt.questions), &scope)
}

/// 1-based history lookup shared by review/retake; prints its own errors.
fn fetch_record(app: &App, index: usize) -> Option<TestRecord> {
    let Some(zero_based) = index.checked_sub(1) else {
        println!("History indices start at 1.");
        return None;
    };
    match app.history.get(zero_based) {
        Ok(record) => Some(record.clone()),
        Err(e) => {
            println!("{e}. Run `gramdr history` to see what is saved.");
            None
        }
    }
}

fn clear_history(app: &mut App) -> Result<()> {
    if app.history.is_empty() {
        println!("No test history to clear.");
        return Ok(());
    }
    let reply = read_line(&format!(
        "This deletes all {} saved test(s). Continue? [y/N] ",
        app.history.len()
    ))?;
    if reply.eq_ignore_ascii_case("y") {
        app.history.clear()?;
        println!("History cleared.");
    }
    Ok(())
}
