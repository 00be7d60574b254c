//! A small Brainfuck batch interpreter library.
//!
//! This crate runs Brainfuck programs on a fixed-size tape of byte cells
//! (default 30,000) with a single data pointer.
//!
//! Features and behaviors:
//! - Memory tape initialized to 0; its size is fixed when the engine is created.
//! - Strict pointer bounds: moving left from cell 0 or right past the end
//!   returns an error instead of touching memory.
//! - Input `,` reads a single byte; on end of input the cell is set by the
//!   engine's [`EofPolicy`] (0 unless configured otherwise).
//! - Output `.` writes the byte at the current cell and flushes.
//! - Nested loops are matched by a bounded forward scan each time a `[` is
//!   reached; unbalanced brackets are reported as errors.
//! - Any other character is a comment.
//!
//! Quick start:
//!
//! ```no_run
//! use bff::Engine;
//!
//! // Classic "Hello World!\n" in Brainfuck
//! let code = "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.";
//! let mut bf = Engine::new(code);
//! bf.run().expect("program should run");
//! ```
//!
//! Running against in-memory streams:
//!
//! ```
//! use bff::Engine;
//! use std::io::Cursor;
//!
//! let mut bf = Engine::create(",+.", 16).unwrap();
//! let mut output = Vec::new();
//! bf.run_with_io(&mut Cursor::new(b"a".to_vec()), &mut output).unwrap();
//! assert_eq!(output, b"b");
//! ```

pub mod cli_util;
pub mod commands;
pub mod config;
pub mod engine;
pub mod loader;
pub mod scan;

pub use engine::{DEFAULT_TAPE_SIZE, Engine, EngineError, EofPolicy, MAX_TAPE_SIZE, StepControl};
pub use loader::{LoadError, Source, load_source};
