use ahash::AHashMap;
use clap::Parser;
use keiro::prelude::*;
use std::fs;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Scripted submissions: stage id -> field name -> raw value.
type ScriptedValues = AHashMap<String, RawValues>;

/// Runs stage-and-transition workflows from the command line
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the workflow JSON file (canonical or editor format)
    workflow_path: String,

    /// Stage to start at when the workflow has several entry stages
    #[arg(short, long)]
    entry: Option<String>,

    /// JSON file with the values to submit per stage
    #[arg(short, long)]
    values: Option<String>,

    /// State file to resume from and save to
    #[arg(short, long)]
    state: Option<String>,

    /// Prompt for every field of every stage
    #[arg(short, long)]
    interactive: bool,

    /// Load the workflow even if some guards do not compile; those edges never match
    #[arg(long)]
    lenient: bool,

    /// Stop a scripted run after this many submissions
    #[arg(long, default_value_t = 1000)]
    max_steps: usize,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let graph = Arc::new(load_graph(&cli.workflow_path, cli.lenient));
    print_stages(&graph);

    let mut store = cli.state.as_deref().map(FileSnapshotStore::new);
    let mut engine = ExecutionEngine::new(Arc::clone(&graph));
    resume_or_start(&mut engine, store.as_ref(), cli.entry.as_deref());

    if cli.interactive {
        run_interactive(&mut engine);
    } else {
        let script = cli.values.as_deref().map(load_script).unwrap_or_default();
        run_scripted(&mut engine, &script, cli.max_steps);
    }

    if let Some(store) = store.as_mut() {
        store
            .save(engine.state())
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to save state: {}", e)));
        println!("State saved to '{}'", store.path().display());
    }

    print_summary(&engine);
}

fn load_graph(path: &str, lenient: bool) -> WorkflowGraph {
    let json = fs::read_to_string(path).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to read workflow file '{}': {}", path, e))
    });
    let definition = load_document(&json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse workflow: {}", e)));

    let policy = if lenient {
        GuardPolicy::DisableEdge
    } else {
        GuardPolicy::Reject
    };
    WorkflowGraph::builder(definition)
        .guard_policy(policy)
        .build()
        .unwrap_or_else(|e| exit_with_error(&format!("Invalid workflow: {}", e)))
}

fn load_script(path: &str) -> ScriptedValues {
    let json = fs::read_to_string(path).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to read values file '{}': {}", path, e))
    });
    serde_json::from_str(&json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse values JSON: {}", e)))
}

fn resume_or_start(
    engine: &mut ExecutionEngine,
    store: Option<&FileSnapshotStore>,
    entry: Option<&str>,
) {
    let saved = store.map(|store| {
        store
            .load()
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load state: {}", e)))
    });

    match saved.flatten() {
        Some(state) if state.status != ExecutionStatus::Completed => {
            engine
                .restore(state)
                .unwrap_or_else(|e| exit_with_error(&format!("Saved state does not fit: {}", e)));
            println!("Resumed at stage {:?}", engine.current_stage_id());
        }
        _ => {
            engine
                .start(entry)
                .unwrap_or_else(|e| exit_with_error(&format!("Cannot start: {}", e)));
            println!("Started at stage {:?}", engine.current_stage_id());
        }
    }
}

/// Submits the scripted values stage after stage until the run completes, stalls or fails.
fn run_scripted(engine: &mut ExecutionEngine, script: &ScriptedValues, max_steps: usize) {
    let empty = RawValues::new();

    for _ in 0..max_steps {
        let Some(stage_id) = engine.current_stage_id().map(str::to_string) else {
            return;
        };
        let values = script.get(&stage_id).unwrap_or(&empty);

        match engine.submit_stage_values(values) {
            Ok(outcome) => {
                print_outcome(&outcome);
                if !matches!(outcome, StepOutcome::Advanced { .. }) {
                    return;
                }
            }
            Err(e) => {
                println!("  -> Stage '{}' rejected: {}", stage_id, e);
                return;
            }
        }
    }
    println!("  -> Stopped after {} submissions", max_steps);
}

/// Runs the CLI in an interactive, human-friendly mode with prompts.
fn run_interactive(engine: &mut ExecutionEngine) {
    println!("\n--- Keiro Interactive Mode ---");

    while let Some(stage) = engine.current_stage().cloned() {
        let form = engine.current_form().unwrap_or_default();
        println!("\n[{}] {}", stage.id, stage.label);

        let mut raw = RawValues::new();
        for field in stage.resolved_fields() {
            let prefilled = form.values.get(&field.name).map(display_raw);
            if form.locked.contains(&field.name) {
                let shown = prefilled.unwrap_or_default();
                println!("  {} ({}) = {} [inherited]", field.name, field.field_type, shown);
                continue;
            }
            let marker = if field.required { "*" } else { "" };
            let prompt = format!("{}{} ({})", field.name, marker, field.field_type);
            let Some(answer) = prompt_for_input(&prompt, prefilled.as_deref()) else {
                println!("\n  -> Input closed, stopping.");
                return;
            };
            if !answer.is_empty() {
                raw.insert(field.name.clone(), serde_json::Value::String(answer));
            }
        }
        for (name, value) in &form.values {
            if form.locked.contains(name) {
                raw.insert(name.clone(), value.to_raw());
            }
        }

        match engine.submit_stage_values(&raw) {
            Ok(outcome @ StepOutcome::Stalled { .. }) => {
                print_outcome(&outcome);
                if !offer_jump(engine) {
                    return;
                }
            }
            Ok(outcome) => print_outcome(&outcome),
            Err(e) => println!("  -> {}. Please try again.", e),
        }
    }
}

/// Lets the user pick a stage to continue from after a stall.
fn offer_jump(engine: &mut ExecutionEngine) -> bool {
    loop {
        let Some(choice) = prompt_for_input("Jump to stage id (empty to stop)", None) else {
            return false;
        };
        if choice.is_empty() {
            return false;
        }
        match engine.jump_to(&choice) {
            Ok(()) => return true,
            Err(e) => println!("  -> {}", e),
        }
    }
}

fn print_stages(graph: &WorkflowGraph) {
    println!("Workflow: {} stages, {} transitions", graph.stages().len(), graph.edges().len());
    for stage in graph.stages() {
        println!("  [{}] {}", stage.id, stage.label);
        for edge in graph.outgoing_edges(&stage.id) {
            let guard = match &edge.guard {
                Guard::Always => "always".to_string(),
                Guard::When(condition) => condition.to_string(),
                Guard::Unusable { label, error } => format!("{} (unusable: {})", label, error),
            };
            println!("      -> {} when {}", edge.target, guard);
        }
    }
}

fn print_outcome(outcome: &StepOutcome) {
    match outcome {
        StepOutcome::Advanced {
            from, to, reason, ..
        } => println!("  -> {} -> {} ({})", from, to, reason),
        StepOutcome::Completed { stage_id } => println!("  -> Completed at '{}'", stage_id),
        StepOutcome::Stalled { stage_id } => {
            println!("  -> Stalled at '{}': no transition matched", stage_id)
        }
    }
}

fn print_summary(engine: &ExecutionEngine) {
    println!("\n--- Execution Summary ---");
    println!("Status: {}", engine.status());
    for (stage_id, status) in engine.stage_statuses() {
        println!("  {:<20} {:?}", stage_id, status);
    }
    for stage in engine.graph().stages() {
        if let Some(snapshot) = engine.snapshot(&stage.id) {
            let mut fields: Vec<_> = snapshot.iter().collect();
            fields.sort_by(|a, b| a.0.cmp(b.0));
            let rendered: Vec<String> =
                fields.iter().map(|(name, value)| format!("{}={}", name, value)).collect();
            println!("  [{}] {}", stage.id, rendered.join(", "));
        }
    }
}

fn display_raw(value: &Value) -> String {
    match value.to_raw() {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Prompts the user and reads a line of input. Returns `None` once stdin is closed.
fn prompt_for_input(prompt_text: &str, default: Option<&str>) -> Option<String> {
    let default_prompt = default.map_or("".to_string(), |d| format!(" [default: {}]", d));

    print!("> {}{}: ", prompt_text, default_prompt);
    io::stdout()
        .flush()
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to flush stdout: {}", e)));

    read_answer(&mut io::stdin().lock(), default)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read line: {}", e)))
}

/// Reads one answer, falling back to `default` on an empty line. `Ok(None)` at end of input.
fn read_answer(reader: &mut impl BufRead, default: Option<&str>) -> io::Result<Option<String>> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let trimmed = line.trim();

    if trimmed.is_empty() {
        Ok(Some(default.unwrap_or("").to_string()))
    } else {
        Ok(Some(trimmed.to_string()))
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
