use std::io::{self, IsTerminal};
use std::process;

use anyhow::Result;
use clap::Parser;
use cmdtree_console::{Cli, Console, DEFAULT_COMMANDS};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.debug);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let console = match &cli.commands {
        Some(path) => Console::from_file(path, cli.output)?,
        None => Console::new(DEFAULT_COMMANDS, cli.output)?,
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if cli.list {
        for line in console.dispatcher().help_lines() {
            println!("{}", line);
        }
        return Ok(());
    }
    if let Some(line) = &cli.complete {
        return console.write_completions(line, &mut out);
    }
    if !cli.execute.is_empty() {
        for line in &cli.execute {
            console.execute(line, &mut out)?;
        }
        return Ok(());
    }

    let stdin = io::stdin();
    let prompt = stdin.is_terminal();
    console.run(stdin.lock(), &mut out, prompt)
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        3 => LevelFilter::TRACE,
        _ => {
            eprintln!("Don't be crazy, max is -d -d -d");
            LevelFilter::TRACE
        }
    };

    // RUST_LOG wins over -d
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let fmt_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE);

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .init();

    tracing::debug!(?level, "logging initialized");
}
