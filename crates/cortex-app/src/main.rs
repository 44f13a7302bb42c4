//! Cortex Assist binary - composition root.
//!
//! 1. Parse CLI args and load configuration from TOML
//! 2. Initialize tracing
//! 3. Open an unauthenticated session and log in (retrying on failure)
//! 4. Answer one `--query`, or run the interactive REPL

mod cli;
mod render;
mod repl;

use std::io::{BufRead, Write};
use std::path::Path;

use clap::Parser;
use console::{style, Term};
use cortex_chat::Dispatcher;
use cortex_client::{Credentials, Session};
use cortex_core::AssistantConfig;

use crate::cli::CliArgs;
use crate::repl::{parse_command, Command, HELP};

/// What the REPL should do after a line is handled.
enum Flow {
    Continue,
    Relogin,
    Quit,
}

fn env_filter(level: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level))
}

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_writer(std::io::stderr)
        .init();
}

/// Load the config file, or write the defaults there on first run.
///
/// Runs under a temporary subscriber, since the configured log level is not
/// known until the file has been read.
fn load_config(path: &Path, bootstrap_level: &str) -> AssistantConfig {
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(env_filter(bootstrap_level))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::with_default(bootstrap, || {
        if path.exists() {
            return AssistantConfig::load_or_default(path);
        }
        let config = AssistantConfig::default();
        if let Err(e) = config.save(path) {
            tracing::warn!(path = %path.display(), error = %e, "Could not write default config");
        }
        config
    })
}

/// Print `prompt` and read one line from stdin. `None` on end of input.
fn prompt_line(prompt: &str) -> std::io::Result<Option<String>> {
    print!("{}", prompt);
    std::io::stdout().flush()?;
    let mut line = String::new();
    if std::io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Log in, prompting for whatever the environment does not supply.
///
/// Returns `false` when input ends before a login succeeds.
async fn login_loop(session: &mut Session, args: &CliArgs) -> std::io::Result<bool> {
    let term = Term::stdout();
    let mut env_password = cli::env_password();

    loop {
        let user = match args.resolve_user() {
            Some(u) => u,
            None => match prompt_line("User: ")? {
                Some(u) if !u.trim().is_empty() => u.trim().to_string(),
                Some(_) => continue,
                None => return Ok(false),
            },
        };
        // An environment password is only tried once.
        let password = match env_password.take() {
            Some(p) => p,
            None => {
                term.write_str("Password: ")?;
                term.read_secure_line()?
            }
        };

        match session.login(&Credentials::new(user, password)).await {
            Ok(()) => {
                term.write_line(&style("Logged in.").green().to_string())?;
                return Ok(true);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Login failed");
                term.write_line(&render::render_notice(
                    cortex_chat::NoticeLevel::Error,
                    &e.to_string(),
                ))?;
                if !term.is_term() && args.resolve_user().is_some() {
                    // Non-interactive with fixed credentials: retrying cannot help.
                    return Ok(false);
                }
            }
        }
    }
}

async fn ask(dispatcher: &Dispatcher, session: &Session, query: &str) {
    let state = dispatcher.state();
    if state.is_busy() {
        tracing::warn!(%state, "Query rejected while another is in flight");
        println!(
            "{}\n",
            render::render_notice(
                cortex_chat::NoticeLevel::Warning,
                &format!("a query is already in progress ({})", state)
            )
        );
        return;
    }
    println!("{} {}", style(">").cyan().bold(), query);
    match dispatcher.handle(session, query).await {
        Ok(reply) => {
            tracing::debug!(intent = ?reply.intent, blocks = reply.blocks.len(), "Reply ready");
            println!("{}\n", render::render_reply(&reply));
        }
        Err(e) => println!(
            "{}\n",
            render::render_notice(cortex_chat::NoticeLevel::Warning, &e.to_string())
        ),
    }
}

fn print_banner(session: &Session) {
    println!("{}", style("Cortex AI Assistant").bold().cyan());
    println!(
        "Semantic Model: `{}`",
        session.semantic_model().file_name()
    );
    println!("{}", style("Type :help for commands.").dim());
}

async fn handle_line(
    line: &str,
    dispatcher: &Dispatcher,
    session: &mut Session,
) -> Flow {
    let Some(command) = parse_command(line) else {
        return Flow::Continue;
    };
    let samples = session.config().ui.sample_questions.clone();

    match command {
        Command::Help => println!("{}", HELP),
        Command::Samples => {
            for (i, q) in samples.iter().enumerate() {
                println!("  {}. {}", i + 1, q);
            }
        }
        Command::Sample(n) => match samples.get(n - 1) {
            Some(q) => ask(dispatcher, session, q).await,
            None => println!("No sample question {} (there are {}).", n, samples.len()),
        },
        Command::Model(None) => {
            let current = session.semantic_model().name.clone();
            for m in &session.config().semantic_models.options {
                let marker = if m.name == current { "*" } else { " " };
                println!(" {} {:8} {}", marker, m.name, m.file_name());
            }
        }
        Command::Model(Some(name)) => match session.select_model(&name) {
            Ok(model) => println!("Semantic Model: `{}`", model.file_name()),
            Err(e) => println!(
                "{}",
                render::render_notice(cortex_chat::NoticeLevel::Warning, &e.to_string())
            ),
        },
        Command::Debug(on) => {
            session.set_debug(on);
            println!("Debug mode {}.", if on { "enabled" } else { "disabled" });
        }
        Command::Logout => {
            if let Err(e) = session.logout().await {
                tracing::warn!(error = %e, "Logout request failed");
            }
            println!("Logged out.");
            return Flow::Relogin;
        }
        Command::Quit => return Flow::Quit,
        Command::Ask(query) => ask(dispatcher, session, &query).await,
        Command::Invalid(msg) => println!("{}\n{}", msg, HELP),
    }
    Flow::Continue
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = load_config(&config_file, &args.resolve_log_level("info"));
    init_tracing(&args.resolve_log_level(&config.general.log_level));
    tracing::info!(
        path = %config_file.display(),
        "Starting Cortex Assist v{}",
        env!("CARGO_PKG_VERSION")
    );

    if args.debug {
        config.ui.debug = true;
    }

    let mut session = Session::new(config)?;
    if let Some(ref name) = args.model {
        session.select_model(name)?;
    }
    let dispatcher = Dispatcher::remote();

    print_banner(&session);
    if !login_loop(&mut session, &args).await? {
        return Ok(());
    }

    if let Some(ref query) = args.query {
        ask(&dispatcher, &session, query).await;
        if let Err(e) = session.logout().await {
            tracing::warn!(error = %e, "Logout request failed");
        }
        return Ok(());
    }

    loop {
        let Some(line) = prompt_line("cortex> ")? else {
            break;
        };
        match handle_line(&line, &dispatcher, &mut session).await {
            Flow::Continue => {}
            Flow::Relogin => {
                if !login_loop(&mut session, &args).await? {
                    return Ok(());
                }
            }
            Flow::Quit => break,
        }
    }

    if session.is_authenticated() {
        if let Err(e) = session.logout().await {
            tracing::warn!(error = %e, "Logout request failed");
        }
    }
    println!("Goodbye.");
    Ok(())
}
