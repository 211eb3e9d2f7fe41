//! shapeshift - chat-driven single-page website builder
//!
//! Describe changes in plain language; the assistant answers with JSON
//! instructions that are applied to the page, rendered to HTML and saved.

#![deny(unsafe_code)]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::all))]

mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use shapeshift::app_config::AppConfig;
use shapeshift::assistant::GeminiAssistant;
use shapeshift::html_renderer::HtmlRenderer;
use shapeshift::storage::FileStore;
use shapeshift::{prompt, Session, TurnReport};
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};

type CliSession = Session<FileStore, HtmlRenderer>;

/// Main entry point for the shapeshift CLI application
fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

/// Run the CLI application
fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if cli.verbose {
        logger.filter_level(log::LevelFilter::Info);
    }
    logger.init();

    match cli.command {
        Commands::Init { force } => handle_init_command(&cli.config, force)?,
        Commands::Chat => handle_chat_command(&load_config(&cli.config)?)?,
        Commands::Apply { input } => handle_apply_command(&load_config(&cli.config)?, input)?,
        Commands::Render => handle_render_command(&load_config(&cli.config)?)?,
        Commands::Show => handle_show_command(&load_config(&cli.config)?)?,
        Commands::Prompt { message } => {
            handle_prompt_command(&load_config(&cli.config)?, &message)?;
        }
        Commands::Reset => handle_reset_command(&load_config(&cli.config)?)?,
    }

    Ok(())
}

/// Load shapeshift.toml, or defaults when it does not exist
fn load_config(path: &Path) -> Result<AppConfig> {
    AppConfig::load_or_default(path).with_context(|| format!("Failed to load {}", path.display()))
}

/// Open the session described by the configuration
fn open_session(config: &AppConfig) -> Result<CliSession> {
    let store = FileStore::new(&config.snapshot_path);
    let session = Session::bootstrap(store, HtmlRenderer)
        .with_context(|| {
            format!(
                "Failed to open document at {}",
                config.snapshot_path.display()
            )
        })?
        .with_title(&config.page_title);
    Ok(session)
}

/// Write the rendered page, creating parent directories as needed
fn write_page(path: &Path, html: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    std::fs::write(path, html).with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Wrote page to {}", path.display());
    Ok(())
}

/// Print a turn's acknowledgements and warnings
fn print_report(report: &TurnReport) {
    for acknowledgement in &report.acknowledgements {
        println!("{}", acknowledgement);
    }
    for warning in &report.warnings {
        eprintln!("warning: {}", warning);
    }
}

/// Print a turn's messages and write the page if it was re-rendered
fn finish_turn(config: &AppConfig, session: &CliSession, report: &TurnReport) -> Result<()> {
    print_report(report);
    if report.rendered {
        write_page(&config.output_path, session.last_render())?;
    }
    Ok(())
}

/// Write the page for a chat turn; a failure becomes a warning and the session goes on
fn write_page_or_warn(path: &Path, html: &str) -> Option<String> {
    match write_page(path, html) {
        Ok(()) => None,
        Err(e) => {
            log::error!("{:#}", e);
            Some(format!("{:#}", e))
        }
    }
}

/// Handle the chat command
fn handle_chat_command(config: &AppConfig) -> Result<()> {
    let assistant = GeminiAssistant::from_config(&config.assistant)
        .context("Failed to set up the assistant")?;
    let mut session = open_session(config)?;
    write_page(&config.output_path, session.last_render())?;

    println!(
        "Editing {} ({} sections). Type /reset to start over, /quit to leave.",
        config.output_path.display(),
        session.document().sections.len()
    );

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("Failed to read from stdin")?;
        let message = line.trim();

        let report = match message {
            "" => continue,
            "/quit" => break,
            "/reset" => session.reset(),
            _ => session.run_turn(&assistant, message),
        };
        print_report(&report);
        if report.rendered {
            if let Some(warning) = write_page_or_warn(&config.output_path, session.last_render()) {
                eprintln!("warning: {}", warning);
            }
        }
    }

    Ok(())
}

/// Handle the apply command
fn handle_apply_command(config: &AppConfig, input: Option<PathBuf>) -> Result<()> {
    let raw = match input {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        _ => {
            let mut raw = String::new();
            io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read stdin")?;
            raw
        }
    };

    let mut session = open_session(config)?;
    let report = session.process_response(&raw);
    finish_turn(config, &session, &report)
}

/// Handle the render command
fn handle_render_command(config: &AppConfig) -> Result<()> {
    let session = open_session(config)?;
    write_page(&config.output_path, session.last_render())?;
    println!(
        "Rendered {} sections to {}",
        session.document().sections.len(),
        config.output_path.display()
    );
    Ok(())
}

/// Handle the show command
fn handle_show_command(config: &AppConfig) -> Result<()> {
    let session = open_session(config)?;
    println!("{}", session.document().to_json_pretty()?);
    Ok(())
}

/// Handle the prompt command
fn handle_prompt_command(config: &AppConfig, message: &str) -> Result<()> {
    let session = open_session(config)?;
    println!("{}", prompt::build_prompt(session.document(), message)?);
    Ok(())
}

/// Handle the reset command
fn handle_reset_command(config: &AppConfig) -> Result<()> {
    let mut session = open_session(config)?;
    let report = session.reset();
    finish_turn(config, &session, &report)
}

/// Handle the init command
fn handle_init_command(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists. Use --force to overwrite",
            path.display()
        );
    }

    AppConfig::default()
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("✓ Wrote {}", path.display());
    Ok(())
}
