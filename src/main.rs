use std::io::{self, BufRead, Write};

use anyhow::Result;
use clap::Parser;
use emberwood::TreeConfig;
use emberwood::console::{Command, Console};
use log::{LevelFilter, info};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

/// Drive a red-black tree from the terminal.
///
/// Commands: insert <key>, delete <key>, update <key> [text], find <key>, lowest, highest,
/// show [pre|in|post], check, clear, redraw, quit.
#[derive(Parser, Debug)]
#[command(name = "emberwood", version)]
struct Args {
    /// Log level for diagnostics written to stderr.
    #[arg(long, default_value = "warn")]
    log_level: LevelFilter,

    /// Node slots to allocate up front.
    #[arg(long, default_value_t = 0)]
    capacity: usize,
}

fn initialize_logging(level: LevelFilter) -> Result<()> {
    TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    initialize_logging(args.log_level)?;

    let mut console = Console::new(TreeConfig::new().capacity(args.capacity));
    info!("console ready");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();

        if line.is_empty() {
            continue;
        }
        if matches!(line, "quit" | "exit") {
            break;
        }

        match line.parse::<Command>().and_then(|command| console.execute(command)) {
            Ok(report) => writeln!(stdout, "{report}")?,
            Err(err) => writeln!(stdout, "{err} - will not apply '{line}'")?,
        }
        stdout.flush()?;
    }

    Ok(())
}
