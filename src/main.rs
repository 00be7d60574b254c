use bff::commands::run::{self, EXIT_INTERRUPTED, RunArgs};
use clap::Parser;
use std::env;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Parser, Debug)]
#[command(name = "bff", disable_help_flag = true)]
struct Cli {
    #[command(flatten)]
    args: RunArgs,
}

fn main() {
    // Logs go to stderr so program output on stdout stays byte-exact.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    // Short program name for messages, e.g. "bff" rather than a full path.
    let program = env::args()
        .next()
        .as_deref()
        .and_then(|p| Path::new(p).file_stem())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("bff"));

    let cli = Cli::parse();

    // First Ctrl+C cancels the running program; a second one exits at once.
    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    if let Err(e) = ctrlc::set_handler(move || {
        if flag.swap(true, Ordering::Relaxed) {
            let _ = io::stdout().flush();
            let _ = io::stderr().flush();
            std::process::exit(EXIT_INTERRUPTED);
        }
    }) {
        log::warn!("failed to set ctrl+c handler: {e}");
    }

    let code = run::run(&program, cli.args, interrupted);
    std::process::exit(code);
}
