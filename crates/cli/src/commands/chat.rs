//! Chat command handler.
//!
//! Reads questions from stdin, one per line, and keeps a transcript for the
//! lifetime of the session.

use super::{build_pipeline, print_notices};
use agriclimate_core::{config::AppConfig, AppResult};
use agriclimate_pipeline::{example_question, ChatSession, Pipeline, EXAMPLE_QUESTIONS};
use clap::Args;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "Commands: /examples, /example N, /history, /clear, /quit";

/// Interactive question session
#[derive(Args, Debug)]
pub struct ChatCommand {}

/// One line of chat input.
#[derive(Debug, PartialEq, Eq)]
enum ChatInput {
    Question(String),
    Examples,
    Example(usize),
    History,
    Clear,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl ChatInput {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        if !line.starts_with('/') {
            return Self::Question(line.to_string());
        }

        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("/examples"), None) => Self::Examples,
            (Some("/example"), Some(n)) => match n.parse() {
                Ok(n) => Self::Example(n),
                Err(_) => Self::Unknown(line.to_string()),
            },
            (Some("/history"), None) => Self::History,
            (Some("/clear"), None) => Self::Clear,
            (Some("/help"), None) => Self::Help,
            (Some("/quit") | Some("/exit"), None) => Self::Quit,
            _ => Self::Unknown(line.to_string()),
        }
    }
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig, quiet: bool) -> AppResult<()> {
        tracing::info!("Executing chat command");

        let pipeline = build_pipeline(config, quiet)?;
        let mut session = ChatSession::new();

        println!("Ask about Indian agriculture and climate data. {}", HELP);

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            match ChatInput::parse(&line) {
                ChatInput::Question(question) => {
                    answer(&pipeline, &mut session, &question).await;
                }
                ChatInput::Example(n) => match example_question(n) {
                    Some(question) => {
                        println!("{}", question);
                        answer(&pipeline, &mut session, question).await;
                    }
                    None => eprintln!(
                        "No example {}; choose 1-{}",
                        n,
                        EXAMPLE_QUESTIONS.len()
                    ),
                },
                ChatInput::Examples => {
                    for (i, question) in EXAMPLE_QUESTIONS.iter().enumerate() {
                        println!("{}. {}", i + 1, question);
                    }
                }
                ChatInput::History => {
                    if session.transcript().is_empty() {
                        println!("(no messages yet)");
                    }
                    for turn in session.transcript().turns() {
                        println!("{}: {}\n", turn.role, turn.content);
                    }
                }
                ChatInput::Clear => {
                    session.clear();
                    println!("Chat history cleared");
                }
                ChatInput::Help => println!("{}", HELP),
                ChatInput::Quit => break,
                ChatInput::Empty => {}
                ChatInput::Unknown(input) => eprintln!("Unknown command: {}. {}", input, HELP),
            }
        }

        tracing::info!("Chat ended after {} turns", session.transcript().len());

        Ok(())
    }
}

async fn answer(pipeline: &Pipeline, session: &mut ChatSession, question: &str) {
    let outcome = session.ask(pipeline, question).await;
    print_notices(&outcome);
    println!("\n{}\n", outcome.answer);
}
