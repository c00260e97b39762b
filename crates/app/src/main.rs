mod routes;

use std::fmt;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use backend::{BackendConfig, HttpBackend};
use quiz_core::Clock;
use quiz_core::model::{CardId, UserId};
use services::{DEFAULT_PASS_THRESHOLD, DEFAULT_SUBJECT, SessionStore};

use routes::{Route, Router};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidCount { raw: String },
    InvalidThreshold { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidCount { raw } => write!(f, "invalid --count value: {raw}"),
            ArgsError::InvalidThreshold { raw } => write!(f, "invalid --threshold value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!(
        "  cargo run -p app -- [--url <backend_url>] [--user <id>] [--subject <s>] [--count <n>] [--threshold <pct>]"
    );
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --user player-1");
    eprintln!("  --subject {DEFAULT_SUBJECT}");
    eprintln!("  --count 10");
    eprintln!("  --threshold {DEFAULT_PASS_THRESHOLD}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_BACKEND_URL, QUIZ_USER_ID, QUIZ_SUBJECT, QUIZ_QUESTION_COUNT,");
    eprintln!("  QUIZ_PASS_THRESHOLD");
}

struct Args {
    url: Option<String>,
    user: String,
    subject: String,
    count: u32,
    threshold: u8,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut url = std::env::var("QUIZ_BACKEND_URL").ok();
        let mut user = std::env::var("QUIZ_USER_ID")
            .ok()
            .unwrap_or_else(|| "player-1".into());
        let mut subject = std::env::var("QUIZ_SUBJECT")
            .ok()
            .unwrap_or_else(|| DEFAULT_SUBJECT.into());
        let mut count = std::env::var("QUIZ_QUESTION_COUNT")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(10);
        let mut threshold = std::env::var("QUIZ_PASS_THRESHOLD")
            .ok()
            .and_then(|value| value.parse::<u8>().ok())
            .unwrap_or(DEFAULT_PASS_THRESHOLD);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--url" => url = Some(require_value(args, "--url")?),
                "--user" => user = require_value(args, "--user")?,
                "--subject" => subject = require_value(args, "--subject")?,
                "--count" => {
                    let value = require_value(args, "--count")?;
                    count = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidCount { raw: value.clone() })?;
                }
                "--threshold" => {
                    let value = require_value(args, "--threshold")?;
                    threshold = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidThreshold { raw: value.clone() })?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            url,
            user,
            subject,
            count,
            threshold,
        })
    }
}

fn read_line(prompt: &str) -> io::Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Keeps asking until the player picks one of the listed options.
fn read_selection(options: &[String]) -> io::Result<String> {
    loop {
        for (index, option) in options.iter().enumerate() {
            println!("  {}) {option}", index + 1);
        }
        let raw = read_line("> ")?;
        match raw.parse::<usize>() {
            Ok(n) if (1..=options.len()).contains(&n) => return Ok(options[n - 1].clone()),
            _ => println!("pick a number between 1 and {}", options.len()),
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let config = match &args.url {
        Some(raw) => BackendConfig::new(raw)?,
        None => BackendConfig::from_env()?,
    };
    let backend = Arc::new(HttpBackend::new(config));
    let mut store =
        SessionStore::new(backend, Clock::default()).with_pass_threshold(args.threshold);
    let mut router = Router::new();
    let user = UserId::new(args.user.clone());

    // Home: show the collection before the run starts. A failed sync is
    // logged and ignored; it never blocks the game.
    store.fetch_user_cards(&user).await;
    println!("Welcome, {user}. Collected cards: {}", store.collected_cards().len());

    if let Err(err) = store.start_game(&user, &args.subject, args.count).await {
        eprintln!("{err}");
        std::process::exit(1);
    }
    router.navigate(Route::Game, &store);
    println!(
        "Subject: {} — {} questions, pass at {}%",
        store.subject(),
        store.total_questions(),
        store.pass_threshold()
    );

    while router.current() == Route::Game {
        let Some(question) = store.current_question() else {
            break;
        };
        let question_id = question.id().clone();
        let prompt = question.prompt().to_string();
        let options = question.options().to_vec();

        println!();
        println!(
            "[{}/{}] {prompt}",
            store.current_question_index() + 1,
            store.total_questions()
        );
        let selected = read_selection(&options)?;
        store.register_answer(question_id, selected);

        if store.is_last_question() {
            router.navigate(Route::Result, &store);
        } else {
            store.next_question();
        }
    }

    if let Err(err) = store.submit_results().await {
        eprintln!("{err}");
        std::process::exit(1);
    }

    let Some(result) = store.game_result().cloned() else {
        return Ok(());
    };
    println!();
    println!(
        "Score: {} ({}/{} correct) — {}",
        result.score,
        result.correct_count,
        result.total,
        if result.passed { "passed" } else { "failed" }
    );

    if result.passed && !store.has_scratched() {
        store.mark_scratched();
        let card = CardId::new(format!("{}-champion", store.subject()));
        store.save_card(&user, card.clone()).await;
        println!("Reward card collected: {card} (total {})", store.collected_cards().len());
    }

    if result.has_wrong_questions() {
        let answer = read_line("Generate remedial questions from your misses? [y/N] ")?;
        if answer.eq_ignore_ascii_case("y") {
            match store.generate_remedial_questions().await {
                Ok(batch) => println!("Generated {} remedial questions.", batch.count),
                Err(err) => eprintln!("{err}"),
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
