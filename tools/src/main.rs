//! exp-runner: headless JSON-lines driver for the cafe experience engine.
//!
//! Usage:
//!   exp-runner --db cafe.db --data-dir ./data < commands.jsonl
//!
//! Each stdin line is one command (`{"cmd": "create_survey", ...}`); each
//! response is one line of JSON, or `{"error": "..."}`.

use anyhow::Result;
use cafe_experience_core::{command::ExpCommand, engine::ExperienceEngine, store::ExpStore};
use std::env;
use std::io::{self, BufRead, Write};

/// Runner-level control lines, checked before engine commands.
#[derive(serde::Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
enum Control {
    Events,
    Quit,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let db = arg(&args, "--db").unwrap_or(":memory:");
    let data_dir = arg(&args, "--data-dir").unwrap_or("./data");

    log::info!("exp-runner starting: db={db} data_dir={data_dir}");
    let store = if db == ":memory:" {
        ExpStore::in_memory()?
    } else {
        ExpStore::open(db)?
    };
    log::debug!("store backed by {}", store.path().unwrap_or("memory"));
    let engine = ExperienceEngine::build(store, data_dir)?;

    run_loop(&engine)
}

fn arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}

fn run_loop(engine: &ExperienceEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        let line = buffer.trim();
        if line.is_empty() {
            continue;
        }

        if let Ok(control) = serde_json::from_str::<Control>(line) {
            match control {
                Control::Quit => break,
                Control::Events => {
                    writeln!(stdout, "{}", serde_json::to_string(&engine.events()?)?)?;
                    stdout.flush()?;
                    continue;
                }
            }
        }

        let response = match serde_json::from_str::<ExpCommand>(line) {
            Ok(command) => {
                let name = command.name();
                engine.apply(command).unwrap_or_else(|e| {
                    log::warn!("{name} rejected: {e}");
                    serde_json::json!({ "error": e.to_string() })
                })
            }
            Err(e) => serde_json::json!({ "error": e.to_string() }),
        };
        writeln!(stdout, "{response}")?;
        stdout.flush()?;
    }
    Ok(())
}
