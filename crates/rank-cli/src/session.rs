//! Interactive session over an in-memory watchlist

use std::io::{self, BufRead, Write};

use rank_core::{FetchOrchestrator, Watchlist};
use tracing::debug;

use crate::render::Renderer;

pub const EMPTY_WATCHLIST: &str = "Please enter at least one ticker.";

const HELP: &str = "Commands:\n\
    list            - show the watchlist\n\
    set <A,B,...>   - replace the watchlist\n\
    add <A,B,...>   - append tickers\n\
    remove <A,...>  - drop tickers\n\
    fetch           - fetch and display the table\n\
    help            - show this help\n\
    quit            - exit";

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Set(String),
    Add(String),
    Remove(String),
    Fetch,
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let (head, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(h, r)| (h, r.trim()));

        let command = match head.to_ascii_lowercase().trim_start_matches('/') {
            "list" | "ls" => Command::List,
            "set" => Command::Set(rest.to_string()),
            "add" => Command::Add(rest.to_string()),
            "remove" | "rm" => Command::Remove(rest.to_string()),
            "fetch" | "f" => Command::Fetch,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            _ => Command::Unknown(line.to_string()),
        };
        Some(command)
    }
}

pub struct Session {
    watchlist: Watchlist,
    orchestrator: FetchOrchestrator,
    renderer: Renderer,
}

impl Session {
    pub fn new(watchlist: Watchlist, orchestrator: FetchOrchestrator, renderer: Renderer) -> Self {
        Self {
            watchlist,
            orchestrator,
            renderer,
        }
    }

    pub fn watchlist(&self) -> &Watchlist {
        &self.watchlist
    }

    /// Apply a command; `None` means the session should end
    pub async fn handle(&mut self, command: Command) -> anyhow::Result<Option<String>> {
        debug!(?command, "Handling command");
        let reply = match command {
            Command::List => self.describe(),
            Command::Set(input) => {
                self.watchlist.replace(&input);
                self.describe()
            },
            Command::Add(input) => {
                let added = self.watchlist.add(&input);
                format!("Added {added}. {}", self.describe())
            },
            Command::Remove(input) => {
                let removed = self.watchlist.remove(&input);
                format!("Removed {removed}. {}", self.describe())
            },
            Command::Fetch => fetch(&self.orchestrator, &self.renderer, &self.watchlist).await?,
            Command::Help => HELP.to_string(),
            Command::Quit => return Ok(None),
            Command::Unknown(line) => format!("Unknown command: {line}\n{HELP}"),
        };
        Ok(Some(reply))
    }

    /// Read commands from stdin until `quit` or EOF
    pub async fn run(&mut self) -> anyhow::Result<()> {
        println!("{HELP}\n");
        println!("{}\n", self.describe());

        let stdin = io::stdin();
        let mut stdout = io::stdout();

        loop {
            print!("rank> ");
            stdout.flush()?;

            let mut input = String::new();
            if stdin.lock().read_line(&mut input)? == 0 {
                println!();
                break;
            }

            let Some(command) = Command::parse(&input) else {
                continue;
            };

            match self.handle(command).await? {
                Some(reply) => println!("{reply}\n"),
                None => break,
            }
        }

        Ok(())
    }

    fn describe(&self) -> String {
        let watchlist = self.watchlist();
        if watchlist.is_empty() {
            "Watchlist is empty.".to_string()
        } else {
            format!("Watchlist ({}): {}", watchlist.len(), watchlist.to_input_string())
        }
    }
}

/// Fetch the watchlist and render it, or explain why nothing was fetched
pub async fn fetch(
    orchestrator: &FetchOrchestrator,
    renderer: &Renderer,
    watchlist: &Watchlist,
) -> anyhow::Result<String> {
    if watchlist.is_empty() {
        return Ok(EMPTY_WATCHLIST.to_string());
    }
    let report = orchestrator.run(watchlist).await;
    renderer.render(&report)
}
