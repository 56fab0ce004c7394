use anyhow::{Context, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use neelakshi_core::types::ChatMessage;
use std::collections::VecDeque;
use std::io::{self, Write};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::output::{print_error, print_reply};
use crate::relay_client::RelayClient;

/// Client-side conversation, capped at `max_entries` messages
#[derive(Debug)]
pub struct Conversation {
    entries: VecDeque<ChatMessage>,
    max_entries: usize,
}

impl Conversation {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries,
        }
    }

    /// Record one exchange, dropping the oldest entries past the cap
    pub fn record(&mut self, message: &str, reply: &str) {
        self.entries.push_back(ChatMessage::user(message));
        self.entries.push_back(ChatMessage::assistant(reply));
        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
    }

    pub fn history(&self) -> Vec<ChatMessage> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        .template("{spinner} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.set_message("Thinking...");
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

/// Sends one message to the relay and prints the reply
pub async fn run_single_query(prompt: String, client: &RelayClient) -> Result<()> {
    info!("Running single query: {}", prompt);

    let spinner = spinner();
    let result = client.send(&prompt, &[]).await;
    spinner.finish_and_clear();

    match result {
        Ok(reply) => {
            print_reply(&reply);
            Ok(())
        }
        Err(e) => {
            error!("Relay request failed: {:#}", e);
            Err(e.context("Failed to get a reply from the relay"))
        }
    }
}

/// Runs an interactive chat session, keeping history on this side
pub async fn run_interactive_chat(client: &RelayClient, max_history: usize) -> Result<()> {
    println!(
        "Chatting with Neelakshi at {}.",
        client.base_url().cyan()
    );
    println!("Type 'exit' or 'quit' to end the session.");
    println!();

    let mut conversation = Conversation::new(max_history);

    loop {
        print!("{}: ", "You".green().bold());
        io::stdout().flush().context("Failed to flush stdout")?;

        let mut input = String::new();
        let read = io::stdin()
            .read_line(&mut input)
            .context("Failed to read input")?;
        if read == 0 {
            // EOF
            println!();
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            println!("Exiting chat session.");
            break;
        }

        debug!(history = conversation.len(), "Sending message: {}", input);
        let spinner = spinner();
        let result = client.send(input, &conversation.history()).await;
        spinner.finish_and_clear();

        match result {
            Ok(reply) => {
                print_reply(&reply);
                conversation.record(input, &reply);
            }
            Err(e) => {
                error!("Relay request failed: {:#}", e);
                print_error(&format!("{:#}", e));
            }
        }

        println!();
    }

    Ok(())
}
