use clap::{Parser, Subcommand};
use fluxo::prelude::*;
use std::fs;
use std::io::{self, Write};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// A conversation flow compilation and evaluation engine CLI
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a flow document and report every structural issue
    Validate {
        /// Path to the flow JSON file
        flow_path: String,
    },
    /// Compile a flow document to a binary artifact
    Compile {
        /// Path to the flow JSON file
        flow_path: String,
        /// Output path for the compiled artifact
        #[arg(short, long, default_value = "flow.bin")]
        out: String,
    },
    /// Run a flow interactively, playing the lead from the terminal
    Run {
        /// Path to the flow JSON file
        flow_path: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Validate { flow_path } => validate(&flow_path),
        Command::Compile { flow_path, out } => compile_to(&flow_path, &out),
        Command::Run { flow_path } => run(&flow_path),
    }
}

fn load_and_compile(flow_path: &str) -> CompiledFlow {
    let json = fs::read_to_string(flow_path).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to read flow file '{}': {}", flow_path, e))
    });
    let document = FlowDocument::from_json(&json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse flow JSON: {}", e)));

    match CompiledFlow::compile(&document) {
        Ok(flow) => flow,
        Err(report) => {
            eprintln!("\nFlow failed validation:");
            for issue in &report.issues {
                eprintln!("  {}", issue);
            }
            std::process::exit(1);
        }
    }
}

fn validate(flow_path: &str) {
    let start = Instant::now();
    let flow = load_and_compile(flow_path);
    println!(
        "Flow is valid: {} nodes compiled in {:?}",
        flow.node_count(),
        start.elapsed()
    );
    for warning in &flow.warnings {
        println!("  {}", warning);
    }
}

fn compile_to(flow_path: &str, out: &str) {
    let flow = load_and_compile(flow_path);
    flow.save(out)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to write artifact: {}", e)));
    println!("Compiled {} nodes to '{}'", flow.node_count(), out);
}

/// Plays the conversation in the terminal: effects print as the bot's side,
/// stdin is the lead's side.
fn run(flow_path: &str) {
    let flow = load_and_compile(flow_path);
    let interpreter = Interpreter::new(flow);
    let mut session = Session::new(&interpreter);

    let mut input: Option<String> = None;
    loop {
        let (effects, evaluation) = session
            .advance(input.as_deref(), chrono::Utc::now())
            .unwrap_or_else(|e| exit_with_error(&format!("Evaluation failed: {}", e)));

        for effect in &effects {
            print_effect(effect);
        }

        match evaluation.transition {
            Transition::Stay => {
                input = Some(prompt_for_input());
            }
            Transition::Fanout { paths, .. } => {
                // The CLI has no parallel runtime; just report the split.
                println!("[flow splits into {} parallel paths]", paths.len());
                break;
            }
            Transition::Complete => {
                println!("\n[conversation complete]");
                break;
            }
            Transition::Handoff => {
                println!("\n[handed off to a human agent]");
                break;
            }
            Transition::Advance(_) => unreachable!("session never pauses mid-advance"),
        }
    }

    if !session.state.bag.is_empty() {
        println!("\n--- Collected Data ---");
        for (field, value) in session.state.bag.iter() {
            println!("  {}: {}", field, value);
        }
    }
}

fn print_effect(effect: &Effect) {
    match effect {
        Effect::SendText { body, .. } => println!("bot: {}", body),
        Effect::CallWebhook { url, method, .. } => println!("[webhook {} {}]", method, url),
        Effect::UpdateField { field, value } => println!("[update field {} = {}]", field, value),
        Effect::TagLead { tag } => println!("[tag lead '{}']", tag),
        Effect::MoveStatus { status_id } => println!("[move lead to status '{}']", status_id),
        Effect::NotifyTeam { message, channel, .. } => {
            println!("[notify team via {}: {}]", channel, message)
        }
        Effect::ScheduleMessage { id, fire_at, .. } => {
            println!("[schedule message '{}' for {}]", id, fire_at)
        }
        Effect::CancelScheduled { id } => println!("[cancel scheduled message '{}']", id),
        Effect::RequestHandoff { reason, .. } => println!("[handoff requested: {}]", reason),
    }
}

fn prompt_for_input() -> String {
    let mut line = String::new();
    print!("you: ");
    io::stdout().flush().unwrap();
    io::stdin()
        .read_line(&mut line)
        .expect("Failed to read line");
    line.trim().to_string()
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
