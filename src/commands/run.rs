use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use clap::Args;
use log::{debug, warn};

use crate::cli_util::print_engine_error;
use crate::config::{Overrides, Settings};
use crate::loader::{load_source, Source};
use crate::{Engine, EngineError, StepControl};

/// How often the host checks for timeouts and Ctrl+C while a program runs.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// How long a cancelled program gets to stop before the host gives up on it.
const CANCEL_GRACE: Duration = Duration::from_millis(200);

/// Exit code when the batch was stopped with Ctrl+C.
pub const EXIT_INTERRUPTED: i32 = 130;

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct RunArgs {
    /// Tape size in cells (fallback BFF_TAPE_SIZE, then bff.toml; default 30000)
    #[arg(short = 'm', long = "memory", value_name = "CELLS", allow_negative_numbers = true)]
    pub memory: Option<String>,

    /// Byte stored by ',' at end of input: zero, unchanged or max (fallback BFF_EOF; default zero)
    #[arg(long = "eof", value_name = "POLICY")]
    pub eof: Option<String>,

    /// Maximum steps per program before abort (fallback BFF_MAX_STEPS; default unlimited)
    #[arg(long = "max-steps", value_name = "N")]
    pub max_steps: Option<String>,

    /// Wall-clock timeout per program in milliseconds (fallback BFF_TIMEOUT_MS; default none)
    #[arg(long = "timeout", value_name = "MS")]
    pub timeout_ms: Option<String>,

    /// Run CODE given on the command line; may be repeated
    #[arg(short = 'e', long = "eval", value_name = "CODE", allow_hyphen_values = true)]
    pub eval: Vec<String>,

    /// Program files, run one after another
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

/// Why a single program did not finish.
#[derive(Debug)]
enum RunFailure {
    Engine(EngineError),
    TimedOut { ms: u64 },
    /// Timed out while blocked on input; the worker could not be stopped.
    Stalled { ms: u64 },
    Interrupted,
}

/// Run every FILE, then every `--eval` snippet, each in a fresh engine.
///
/// Returns the process exit code: 0 if all programs ran, 1 if any failed to
/// load or run, 2 for usage and configuration errors.
pub fn run(program: &str, args: RunArgs, interrupted: Arc<AtomicBool>) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    let RunArgs {
        memory,
        eof,
        max_steps,
        timeout_ms,
        eval,
        files,
        ..
    } = args;

    if files.is_empty() && eval.is_empty() {
        usage_and_exit(program, 2);
    }

    let overrides = Overrides {
        tape_size: memory,
        eof,
        max_steps,
        timeout_ms,
    };
    let settings = match Settings::load(&overrides) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{program}: configuration error: {e}");
            let _ = io::stderr().flush();
            return 2;
        }
    };

    let snippets = eval
        .into_iter()
        .enumerate()
        .map(|(i, code)| Source::inline(format!("<eval #{}>", i + 1), code));

    let mut failures = 0usize;
    let loaded = files
        .into_iter()
        .map(|path| load_source(&path))
        .chain(snippets.map(Ok));

    for source in loaded {
        let source = match source {
            Ok(s) => s,
            Err(e) => {
                warn!("skipping {}", e.path().display());
                eprintln!("{program}: {e}");
                let _ = io::stderr().flush();
                failures += 1;
                continue;
            }
        };

        debug!("running {}", source.name);
        match execute_source(&settings, &source, &interrupted) {
            Ok(()) => {}
            Err(RunFailure::Engine(err)) => {
                print_engine_error(program, &source.name, &source.text, &err);
                failures += 1;
            }
            Err(RunFailure::TimedOut { ms }) => {
                eprintln!(
                    "{program}: {}: Execution aborted: wall-clock timeout exceeded ({ms} ms)",
                    source.name
                );
                let _ = io::stderr().flush();
                failures += 1;
            }
            Err(RunFailure::Stalled { ms }) => {
                eprintln!(
                    "{program}: {}: Execution aborted: wall-clock timeout exceeded ({ms} ms) \
                     while waiting for input; remaining sources skipped",
                    source.name
                );
                let _ = io::stderr().flush();
                return 1;
            }
            Err(RunFailure::Interrupted) => {
                eprintln!("{program}: {}: Execution aborted: interrupted", source.name);
                let _ = io::stderr().flush();
                return EXIT_INTERRUPTED;
            }
        }
    }

    let _ = io::stdout().flush();
    if failures == 0 { 0 } else { 1 }
}

/// Execute one program on a worker thread, cancelling it cooperatively on
/// timeout or Ctrl+C.
fn execute_source(
    settings: &Settings,
    source: &Source,
    interrupted: &AtomicBool,
) -> Result<(), RunFailure> {
    let engine = Engine::create(source.text.clone(), settings.tape_size)
        .map_err(RunFailure::Engine)?
        .with_eof_policy(settings.eof);

    let cancel = Arc::new(AtomicBool::new(false));
    let control = StepControl::new(settings.max_steps, cancel.clone());
    let (tx, rx) = mpsc::channel::<Result<(), EngineError>>();

    let worker = thread::spawn(move || {
        let mut engine = engine;
        let mut input = io::stdin().lock();
        let mut output = io::stdout().lock();
        let result = engine.run_with_control(&mut input, &mut output, &control);
        engine.destroy();
        let _ = tx.send(result);
    });

    let deadline = settings
        .timeout_ms
        .map(|ms| (ms, Instant::now() + Duration::from_millis(ms)));
    let mut timed_out = None;
    let mut was_interrupted = false;
    let mut cancelled_at: Option<Instant> = None;

    let outcome = loop {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(result) => break Some(result),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                if interrupted.load(Ordering::Relaxed) {
                    was_interrupted = true;
                    cancel.store(true, Ordering::Relaxed);
                    cancelled_at.get_or_insert_with(Instant::now);
                }
                if let Some((ms, at)) = deadline {
                    if timed_out.is_none() && Instant::now() >= at {
                        timed_out = Some(ms);
                        cancel.store(true, Ordering::Relaxed);
                        cancelled_at.get_or_insert_with(Instant::now);
                    }
                }
                // A worker blocked reading stdin never sees the flag.
                if cancelled_at.is_some_and(|at| at.elapsed() >= CANCEL_GRACE) {
                    break None;
                }
            }
            // The worker died without reporting; treat it as cancelled.
            Err(mpsc::RecvTimeoutError::Disconnected) => break Some(Err(EngineError::Canceled)),
        }
    };

    let Some(result) = outcome else {
        // The worker is left behind holding stdin and stdout.
        return Err(match timed_out {
            Some(ms) if !was_interrupted => RunFailure::Stalled { ms },
            _ => RunFailure::Interrupted,
        });
    };
    let _ = worker.join();

    match result {
        Ok(()) => Ok(()),
        Err(EngineError::Canceled) if was_interrupted => Err(RunFailure::Interrupted),
        Err(EngineError::Canceled) => match timed_out {
            Some(ms) => Err(RunFailure::TimedOut { ms }),
            None => Err(RunFailure::Engine(EngineError::Canceled)),
        },
        Err(err) => Err(RunFailure::Engine(err)),
    }
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} [OPTIONS] FILE...      # Run each Brainfuck FILE in turn
  {0} [OPTIONS] -e "<code>"  # Run Brainfuck code given on the command line

Options:
  --memory,  -m <CELLS>  Tape size in cells (default 30000)
  --eof <POLICY>         Byte stored by ',' at end of input: zero, unchanged, max
  --max-steps <N>        Abort a program after N steps
  --timeout <MS>         Abort a program after MS milliseconds
  --eval,    -e <CODE>   Run CODE; may be given more than once
  --help,    -h          Show this help

Environment:
  BFF_TAPE_SIZE, BFF_EOF, BFF_MAX_STEPS, BFF_TIMEOUT_MS  Fallbacks for the options above
  BFF_CONFIG             Config file to read instead of <config dir>/bff.toml
  RUST_LOG               Log filter (e.g. RUST_LOG=bff=debug)

Notes:
- Each program gets a fresh zeroed tape; nothing is shared between programs.
- Characters outside of ><+-.,[] are comments and are ignored.
- Moving the pointer off either end of the tape is an error.
- A file that cannot be read is reported and skipped; the rest still run.

Examples:
- Run two programs:
    {0} hello.bf rot13.bf
- Feed a file to ',':
    {0} -e ",[.,]" < input.txt
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
