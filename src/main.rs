//! E.C.H.O. CLI
//!
//! Usage:
//!   echo                                    # Interactive session (default)
//!   echo --text "I can see you're scared"   # Single turn
//!   echo --scenario customer                # Pick a scenario
//!   echo --serve                            # HTTP API server
//!   echo --text "text" --json               # JSON output

use clap::Parser;
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use echo_sim::core::{run_server, CredentialStore, PromptSet, SimConfig, TurnController};
use echo_sim::types::{PerformanceReport, Scenario, SimError, TensionBand, TurnOutcome};
use echo_sim::VERSION;

#[derive(Parser, Debug)]
#[command(
    name = "echo",
    version = VERSION,
    about = "E.C.H.O. - Empathy & Crisis Handling Operative",
    long_about = "E.C.H.O. is a crisis negotiation simulator.\n\n\
                  Talk a distressed persona down. Every message is judged by a\n\
                  Monitor that moves the tension score, and the persona answers\n\
                  in character for the new tension.\n\n\
                  Modes:\n  \
                  --interactive  Chat in the terminal (default)\n  \
                  --text         Run a single turn\n  \
                  --serve        HTTP API server mode\n\n\
                  Tension:\n  \
                  CRITICAL  - above 70, screaming, refusing help\n  \
                  ELEVATED  - 31 to 70, skeptical, fearful\n  \
                  CALM      - 30 or below, cooperative"
)]
struct Args {
    /// Text to send (single turn mode)
    #[arg(short, long)]
    text: Option<String>,

    /// Interactive mode - read lines from stdin
    #[arg(short, long)]
    interactive: bool,

    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address (default: 127.0.0.1:3000)
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,

    /// Scenario to practice
    #[arg(long, value_enum)]
    scenario: Option<Scenario>,

    /// Gemini API key (falls back to GOOGLE_API_KEY, then the stored key)
    #[arg(long)]
    api_key: Option<String>,

    /// Persist the resolved API key for later sessions
    #[arg(long)]
    save_key: bool,

    /// Model name
    #[arg(long)]
    model: Option<String>,

    /// API base URL
    #[arg(long)]
    endpoint: Option<String>,

    /// JSON file overriding the prompt templates
    #[arg(long)]
    prompts: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Show Monitor reasoning and debug logs
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.no_color {
        colored::control::set_override(false);
    }

    let store = CredentialStore::default();
    let config = match build_config(&args, &store) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    if args.serve {
        run_serve(&args, config).await;
    } else if let Some(ref text) = args.text {
        run_single(text, &args, config).await;
    } else {
        run_interactive(&args, config, &store).await;
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "echo_sim=debug" } else { "echo_sim=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Environment config with CLI flags on top
fn build_config(args: &Args, store: &CredentialStore) -> Result<SimConfig, SimError> {
    let mut config = SimConfig::from_env()?;
    if let Some(ref endpoint) = args.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(ref model) = args.model {
        config.model = model.clone();
    }
    if let Some(scenario) = args.scenario {
        config.scenario = scenario;
    }
    if let Some(ref path) = args.prompts {
        config.prompts = PromptSet::load(path)?;
    }
    config.api_key = store.resolve(args.api_key.as_deref());

    if args.save_key {
        match config.api_key {
            Some(ref key) => store.save(key)?,
            None => return Err(SimError::MissingCredential),
        }
    }
    Ok(config)
}

/// Run a single turn
async fn run_single(text: &str, args: &Args, config: SimConfig) {
    let ctl = TurnController::new(config.scenario, config.prompts.clone(), config.build_model());

    match ctl.submit(text).await {
        Ok(outcome) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&outcome).unwrap_or_default());
            } else {
                print_outcome(&outcome, config.scenario, &ctl.snapshot().history, args);
            }
        }
        Err(e) => {
            if args.json {
                println!("{}", serde_json::json!({ "error": e.to_string() }));
            } else {
                eprintln!("{} {}", "Error:".red().bold(), e);
            }
            std::process::exit(1);
        }
    }
}

/// Run interactive terminal session
async fn run_interactive(args: &Args, config: SimConfig, store: &CredentialStore) {
    let mut ctl = TurnController::new(config.scenario, config.prompts.clone(), config.build_model());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print_header(ctl.scenario());

    if !ctl.has_model() {
        println!("{}", "No Gemini API key configured.".yellow());
        prompt("Enter your Gemini API key (blank to skip): ");
        if let Ok(Some(line)) = lines.next_line().await {
            if let Some(key) = entered_key(&line) {
                set_key(&mut ctl, &config, store, key);
            }
        }
        println!();
    }

    loop {
        prompt(&format_prompt(&ctl));

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) | Err(_) => break,
        };
        let line = line.trim();

        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            println!("\nSession ended. Turns: {}", ctl.snapshot().turn_count);
            if let Some(report) = ctl.report() {
                print_report(&report);
            }
            break;
        }

        if let Some(command) = line.strip_prefix('/') {
            let (name, rest) = command.split_once(' ').unwrap_or((command, ""));
            match name {
                "reset" => {
                    prompt("Reset the simulation? This will clear all progress. [y/N] ");
                    let answer = lines.next_line().await.ok().flatten().unwrap_or_default();
                    if answer.trim().eq_ignore_ascii_case("y") {
                        match ctl.reset() {
                            Ok(()) => print_header(ctl.scenario()),
                            Err(e) => eprintln!("{}", e.to_string().red()),
                        }
                    }
                }
                "scenario" => match rest.parse::<Scenario>() {
                    Ok(scenario) => match ctl.set_scenario(scenario) {
                        Ok(()) => print_header(scenario),
                        Err(e) => eprintln!("{}", e.to_string().red()),
                    },
                    Err(e) => eprintln!("{} (er, school, customer)", e.red()),
                },
                "report" => match ctl.report() {
                    Some(report) => print_report(&report),
                    None => println!("{}", "No interaction history yet.".yellow()),
                },
                "logs" => print_logs(&ctl),
                "brief" => println!("📋 {}\n", ctl.scenario().brief()),
                "key" if rest.trim() == "clear" => clear_key(&mut ctl, store),
                "key" => set_key(&mut ctl, &config, store, rest.trim()),
                "mic" => println!("🎙️ Voice input coming soon! For now, please use text input.\n"),
                _ => print_help(),
            }
            continue;
        }

        let scenario = ctl.scenario();
        println!("{}", format!("⏳ {} is responding...", scenario.persona()).dimmed());

        match ctl.submit(line).await {
            Ok(outcome) => {
                if args.json {
                    println!("{}", serde_json::to_string(&outcome).unwrap_or_default());
                } else {
                    print_outcome(&outcome, scenario, &ctl.snapshot().history, args);
                }
            }
            Err(SimError::EmptyInput) => println!("{}", "Please enter a message".yellow()),
            Err(SimError::MissingCredential) => {
                println!("{}", "Please configure your API key first (/key <your key>)".yellow())
            }
            Err(e) => println!("{} {}\n", "Error:".red().bold(), e),
        }
    }
}

/// Install a new API key on the controller and persist it
fn set_key(ctl: &mut TurnController, config: &SimConfig, store: &CredentialStore, key: &str) {
    let Some(model) = config.model_for(Some(key)) else {
        println!("{}", "Please enter a valid API key".yellow());
        return;
    };
    ctl.set_model(model);
    match store.save(key) {
        Ok(()) => println!("{}", format!("🔑 API key saved to {}", store.path().display()).dimmed()),
        Err(e) => eprintln!("{} {}", "Could not save API key:".red(), e),
    }
}

/// Key typed at the startup prompt; blank means skip
fn entered_key(line: &str) -> Option<&str> {
    Some(line.trim()).filter(|k| !k.is_empty())
}

/// Forget the stored API key and stop using it in this session
fn clear_key(ctl: &mut TurnController, store: &CredentialStore) {
    ctl.clear_model();
    match store.clear() {
        Ok(()) => println!("{}", "🔑 API key removed".dimmed()),
        Err(e) => eprintln!("{} {}", "Could not remove API key:".red(), e),
    }
}

fn prompt(text: &str) {
    print!("{}", text);
    let _ = std::io::stdout().flush();
}

/// Print header
fn print_header(scenario: Scenario) {
    let banner = format!("🚑 E.C.H.O. v{} - {}", VERSION, scenario.display_name());
    println!("{}", "═".repeat(60).bold());
    println!("  {}", banner.bold());
    println!("{}", "═".repeat(60).bold());
    println!("{}", scenario.opening_notice());
    println!("📋 {}", scenario.brief());
    println!("Commands: /reset /report /logs /brief /scenario <name> /key <key> /mic, 'quit' to exit");
    println!();
}

fn print_help() {
    println!("  /reset            Start over (asks for confirmation)");
    println!("  /report           De-escalation score so far");
    println!("  /logs             Last agent decisions");
    println!("  /brief            Scenario brief");
    println!("  /scenario <name>  Switch to er, school or customer");
    println!("  /key <key>        Set and save the Gemini API key");
    println!("  /key clear        Forget the saved API key");
    println!("  /mic              Voice input");
    println!("  quit              Exit with a report");
    println!();
}

/// Format interactive prompt
fn format_prompt(ctl: &TurnController) -> String {
    let tension = ctl.tension();
    let band = TensionBand::from_tension(tension);
    format!("{} [{} {}] 🧑 You > ", band.emoji(), band, tension)
        .color(band.color())
        .to_string()
}

/// Print one completed turn
fn print_outcome(outcome: &TurnOutcome, scenario: Scenario, history: &[u8], args: &Args) {
    if let Some(ref complication) = outcome.complication {
        println!("{}", format!("⚠️ DIRECTOR INJECTION: {}", complication).yellow().bold());
    }
    println!("😰 {}: {}", scenario.persona().bold(), outcome.reply);

    if args.no_color {
        println!("{}", outcome.to_parseable_string());
    } else {
        println!("{}", outcome.to_terminal_string());
    }
    println!("{}", sparkline(history).color(outcome.band.color()));

    if args.verbose {
        println!("{}", format!("  └─ {}", outcome.reasoning).dimmed());
        if let Some(technique) = outcome.decision.as_ref().and_then(|d| d.technique_used.as_deref()) {
            println!("{}", format!("     technique: {}", technique).dimmed());
        }
    }
    println!();
}

/// Tension history as block characters
fn sparkline(history: &[u8]) -> String {
    const BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
    history
        .iter()
        .map(|&t| BLOCKS[(t as usize * (BLOCKS.len() - 1)) / 100])
        .collect()
}

fn print_report(report: &PerformanceReport) {
    println!();
    println!("{}", "📊 Performance Report".bold());
    println!("  De-escalation Score: {}/100", report.score);
    println!("  Average Tension:     {}%", report.average_tension as u32);
    println!("  Final Tension:       {}", report.final_tension);
    println!("  Turns:               {}", report.turns);
    println!("  {}", report.verdict.feedback());
    println!();
}

fn print_logs(ctl: &TurnController) {
    let decisions = ctl.decisions();
    if decisions.is_empty() {
        println!("{}", "Waiting for interaction...".dimmed());
        return;
    }
    let start = decisions.len().saturating_sub(5);
    for entry in &decisions[start..] {
        println!("{}", format!("Turn {} - {}", entry.turn, entry.agent).bold());
        println!("{}", serde_json::to_string_pretty(&entry.decision).unwrap_or_default());
    }
    println!();
}

/// Run HTTP API server
async fn run_serve(args: &Args, config: SimConfig) {
    println!();
    println!("{}", "═".repeat(60).bold());
    println!("  🚑 E.C.H.O. API Server  v{}", VERSION);
    println!("{}", "═".repeat(60).bold());
    if config.api_key.is_none() {
        println!("{}", "  No server API key; sessions must supply api_key".yellow());
    }
    println!();

    if let Err(e) = run_server(&args.addr, config).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
