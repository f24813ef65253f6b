//! The `vivamark exam` command.
//!
//! Interactive terminal exam loop. Every keystroke turn samples the
//! clock and delivers a `Tick` before the user's own action, so the
//! timer can expire between prompts without a background thread.

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;

use vivamark_core::bank::QuestionBank;
use vivamark_core::session::{Action, Phase, SessionEngine};
use vivamark_core::VivaError;
use vivamark_sinks::{create_sink, load_config_from};

pub async fn execute(candidate: String, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let bank = QuestionBank::load(&config.bank_path)
        .with_context(|| format!("failed to load question bank {}", config.bank_path.display()))?;
    let sink = create_sink(&config.sink)?;

    let mut engine = SessionEngine::new(
        Arc::new(bank),
        sink,
        config.session_config(),
        StdRng::from_os_rng(),
    );

    engine
        .dispatch(
            Action::Start {
                candidate_id: candidate,
            },
            Instant::now(),
        )
        .await?;

    let total = engine.session().map(|s| s.questions.len()).unwrap_or(0);
    println!(
        "Exam started: {total} questions, {} minutes.",
        engine.config().duration.as_secs() / 60
    );
    println!("Enter an option letter to answer, n = next, b = back, f = finish.\n");

    let stdin = std::io::stdin();
    loop {
        // Clock sample first: the timer may have expired while the user
        // was thinking.
        match engine.dispatch(Action::Tick, Instant::now()).await {
            Ok(Phase::Complete) => {
                println!("\nTime is up.");
                break;
            }
            Ok(_) => {}
            Err(VivaError::Persistence(_)) => {
                retry_flush(&mut engine, &stdin).await?;
                break;
            }
            Err(e) => return Err(e.into()),
        }

        print_question(&engine);

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            // stdin closed mid-session; nothing was flushed, so the
            // history is untouched.
            anyhow::bail!("input closed before the session finished");
        }

        let input = line.trim();
        let now = Instant::now();
        let outcome = match input {
            "" => continue,
            "n" => engine.dispatch(Action::Next, now).await,
            "b" => engine.dispatch(Action::Back, now).await,
            "f" => engine.dispatch(Action::Finish, now).await,
            label => {
                let index = engine.session().map(|s| s.position).unwrap_or(0);
                engine
                    .dispatch(
                        Action::SelectAnswer {
                            index,
                            label: label.to_string(),
                        },
                        now,
                    )
                    .await
            }
        };

        match outcome {
            Ok(Phase::Complete) => {
                println!("\nExam finished.");
                break;
            }
            Ok(_) => {}
            Err(VivaError::Persistence(_)) => {
                retry_flush(&mut engine, &stdin).await?;
                break;
            }
            Err(e) => println!("  {e}"),
        }
    }

    if let Some(session) = engine.session() {
        let answered = session.answers.iter().filter(|a| a.is_some()).count();
        println!(
            "Answered {answered} of {} questions. Results saved.",
            session.questions.len()
        );
        println!("\nRecorded answers:");
        for record in session.to_records() {
            println!("  {}: {}", record.question_id, record.selected_option);
        }
    }
    engine.dispatch(Action::Reset, Instant::now()).await?;
    Ok(())
}

/// The flush failed but the answers are retained. Offer retries until
/// the sink accepts the rows or the user gives up.
async fn retry_flush(
    engine: &mut SessionEngine<StdRng>,
    stdin: &std::io::Stdin,
) -> Result<()> {
    loop {
        println!("\nSaving results failed. Your answers are retained.");
        print!("Retry now? [Y/n] ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        stdin.read_line(&mut line)?;
        if line.trim().eq_ignore_ascii_case("n") {
            anyhow::bail!("results were not saved; run the exam again or fix the sink");
        }

        match engine.dispatch(Action::Finish, Instant::now()).await {
            Ok(Phase::Complete) => {
                println!("Results saved.");
                return Ok(());
            }
            Ok(_) => return Ok(()),
            Err(VivaError::Persistence(e)) => {
                println!("Still failing: {e}");
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn print_question(engine: &SessionEngine<StdRng>) {
    let Some(session) = engine.session() else {
        return;
    };
    let Some(question) = engine.current_question() else {
        return;
    };
    let remaining = engine
        .remaining(Instant::now())
        .unwrap_or(Duration::ZERO)
        .as_secs();

    println!(
        "\n[{:02}:{:02}] Question {}/{}: {}",
        remaining / 60,
        remaining % 60,
        session.position + 1,
        session.questions.len(),
        question.question
    );
    for (label, text) in &question.options {
        let marker = match &session.answers[session.position] {
            Some(selected) if selected.eq_ignore_ascii_case(label) => "*",
            _ => " ",
        };
        println!(" {marker} {label}) {text}");
    }
    print!("> ");
    let _ = std::io::stdout().flush();
}
