use clap::Parser;
use hookline_cli::build_dispatcher;
use hookline_cli::default_registry;
use hookline_cli::init_tracing;
use hookline_cli::run_event;
use hookline_dispatch::load_config;

/// Hookline: one-shot lifecycle-event dispatcher.
///
/// Reads one JSON event object from stdin, runs the handlers routed for
/// it, and writes at most one JSON response object to stdout. Always
/// exits 0.
#[derive(Debug, Parser)]
#[clap(name = "hookline", version)]
struct Cli {}

#[tokio::main]
async fn main() {
    let _cli = Cli::parse();
    init_tracing();

    let input = match std::io::read_to_string(std::io::stdin()) {
        Ok(input) => input,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read stdin");
            return;
        }
    };

    let cwd = std::env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from("."));
    let mut config = load_config(&cwd);
    config.apply_env();

    let dispatcher = build_dispatcher(default_registry(), config);
    if let Some(line) = run_event(&dispatcher, &input).await {
        println!("{line}");
    }
}
