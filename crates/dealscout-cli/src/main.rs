use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use dealscout_application::{SearchOrchestrator, SessionGate};
use dealscout_core::identity::IdentityProvider;
use dealscout_core::search::SearchField;
use dealscout_interaction::config::{load_settings, ScoutPaths};
use dealscout_interaction::{GenerativeApiClient, IdentityApiClient};

/// DealScout - private equity target finder
#[derive(Parser)]
#[command(name = "dealscout", version, about)]
struct Cli {
    /// Directory holding config.toml and secret.json
    /// (defaults to ~/.config/dealscout)
    #[arg(long)]
    config_dir: Option<PathBuf>,
}

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: vec![
                "/login".to_string(),
                "/logout".to_string(),
                "/set".to_string(),
                "/fields".to_string(),
                "/find".to_string(),
                "/help".to_string(),
                "/quit".to_string(),
            ],
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Cli::parse();
    let paths = ScoutPaths::new(args.config_dir)?;
    let settings = load_settings(&paths)?;

    let identity: Arc<IdentityApiClient> =
        Arc::new(IdentityApiClient::from_settings(&settings.identity));
    let generative = Arc::new(GenerativeApiClient::from_settings(&settings.generative));

    let gate = SessionGate::new(identity.clone());
    gate.start().await;
    let orchestrator = SearchOrchestrator::new(generative);

    println!("{}", "Private Equity Target Finder".bright_yellow().bold());
    print_help(gate.is_authenticated());

    let mut rl = Editor::<CliHelper, DefaultHistory>::new()?;
    rl.set_helper(Some(CliHelper::new()));

    loop {
        let prompt = if gate.is_authenticated() {
            "dealscout> "
        } else {
            "dealscout (signed out)> "
        };

        match rl.readline(prompt) {
            Ok(line) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                if !dispatch(&line, &gate, &orchestrator, identity.as_ref(), &mut rl).await {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}", format!("Input error: {err}").red());
                break;
            }
        }
    }

    gate.shutdown();
    Ok(())
}

/// Handles one line of input. Returns false when the REPL should exit.
async fn dispatch(
    line: &str,
    gate: &SessionGate,
    orchestrator: &SearchOrchestrator,
    identity: &IdentityApiClient,
    rl: &mut Editor<CliHelper, DefaultHistory>,
) -> bool {
    let mut parts = line.splitn(3, ' ');
    let command = parts.next().unwrap_or_default();

    match command {
        "/quit" => return false,
        "/help" => print_help(gate.is_authenticated()),
        "/login" => {
            let email = match parts.next() {
                Some(email) => email.to_string(),
                None => match rl.readline("Email: ") {
                    Ok(email) => email.trim().to_string(),
                    Err(_) => return true,
                },
            };
            let password = match rl.readline("Password: ") {
                Ok(password) => password,
                Err(_) => return true,
            };
            match identity.sign_in_with_password(&email, &password).await {
                Ok(signed_in) => {
                    let who = signed_in.email.unwrap_or(signed_in.id);
                    println!("{}", format!("Signed in as {who}").green());
                }
                Err(err) => eprintln!("{}", format!("Sign-in failed: {err}").red()),
            }
        }
        _ if !gate.is_authenticated() => {
            println!("{}", "Sign in first with /login.".yellow());
        }
        "/logout" => {
            if let Err(err) = gate.sign_out().await {
                // The local session is cleared regardless.
                eprintln!("{}", format!("Sign-out request failed: {err}").yellow());
            }
            println!("{}", "Signed out.".green());
        }
        "/set" => {
            let field = parts.next().unwrap_or_default();
            let value = parts.next().unwrap_or_default();
            match field.parse::<SearchField>() {
                Ok(field) => {
                    orchestrator.update_field(field, value);
                    println!("{}: {}", field.label(), if value.is_empty() { "(unset)" } else { value });
                }
                Err(_) => {
                    println!(
                        "{}",
                        "Unknown field. Use min, max, location, growth or industry.".yellow()
                    );
                }
            }
        }
        "/fields" => print_fields(orchestrator),
        "/find" => {
            println!("{}", "Loading...".bright_cyan());
            orchestrator.submit_search().await;
            print_results(orchestrator);
        }
        other => {
            println!("{}", format!("Unknown command: {other}. Try /help.").yellow());
        }
    }

    true
}

fn print_help(authenticated: bool) {
    println!("{}", "Commands:".bold());
    if authenticated {
        println!("  /set <field> <value>   set min, max, location, growth or industry");
        println!("  /fields                show the current criteria");
        println!("  /find                  find target companies");
        println!("  /logout                sign out");
    } else {
        println!("  /login [email]         sign in");
    }
    println!("  /help                  show this help");
    println!("  /quit                  exit");
}

fn print_fields(orchestrator: &SearchOrchestrator) {
    let criteria = orchestrator.criteria();
    for field in SearchField::ALL {
        let value = criteria.get(field);
        println!(
            "  {}: {}",
            field.label(),
            if value.is_empty() { "(unset)" } else { value }
        );
    }
}

fn print_results(orchestrator: &SearchOrchestrator) {
    let results = orchestrator.results();
    if results.is_empty() {
        return;
    }

    println!("{}", "Top 3 Target Companies".bright_yellow().bold());
    for company in &results {
        println!("{}", company.company_name.bright_cyan().bold());
        println!("  Purchase Price: {}", company.purchase_price);
        println!("  Location: {}", company.location);
        println!("  Expected Growth: {}%", company.expected_growth);
        println!("  Industry: {}", company.industry);
    }
}
