use std::process;

use anyhow::Result;
use sheetq_cli::cli::parse_args;
use sheetq_cli::{execute, prepare_instruction, read_instruction, render, Config};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = parse_args();

    let mut config = Config::load(args.config.as_deref())?;
    config.apply_cli(&args);
    setup_logging(&config);

    let text = read_instruction(&args)?;
    let instruction = prepare_instruction(&config, &args, &text);
    log::debug!("Instruction: {instruction:?}");

    let envelope = execute(&config, &instruction);
    println!("{}", render(&envelope, config.output.pretty)?);
    Ok(())
}

fn setup_logging(config: &Config) {
    let log_level = match config.debug.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .init();
}
