//! The execution engine: instruction pointer, data pointer and tape.
//!
//! Behaviors:
//! - The tape is a fixed number of zeroed `u8` cells; it never grows.
//! - `+` and `-` wrap modulo 256.
//! - Moving the data pointer left of cell 0 or past the last cell is an error.
//! - `,` reads one byte; at end of input the cell is set according to the
//!   engine's [`EofPolicy`] (0 by default).
//! - `.` writes one byte and flushes.
//! - Any byte outside `><+-.,[]` is a comment and is skipped.
//! - Loops are matched by a forward scan each time their `[` is dispatched,
//!   and open loops are tracked on an explicit frame stack rather than the
//!   native call stack.

use std::io::{self, Read, Write};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use log::{debug, trace};

use crate::scan::find_loop_end;

/// Number of cells on the tape unless configured otherwise.
pub const DEFAULT_TAPE_SIZE: usize = 30_000;

/// Largest tape an engine will allocate (1 GiB of cells).
pub const MAX_TAPE_SIZE: usize = 1 << 30;

/// Errors that can occur while creating or running an engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The requested tape size was zero or above [`MAX_TAPE_SIZE`].
    #[error("Invalid tape size {size} (expected 1..={max})", max = MAX_TAPE_SIZE)]
    InvalidTapeSize { size: usize },

    /// A `[` has no matching `]` before the end of the program.
    #[error("Malformed program: unterminated loop at instruction {ip}")]
    UnterminatedLoop { ip: usize },

    /// A `]` was reached with no loop open.
    #[error("Malformed program: unmatched ']' at instruction {ip}")]
    UnmatchedLoopEnd { ip: usize },

    /// The data pointer attempted to move left of cell 0 or beyond the last cell.
    #[error("Out-of-range memory access at instruction {ip} (ptr={ptr}, op='{op}')")]
    PointerOutOfBounds { ip: usize, ptr: usize, op: char },

    /// Reading from the input or writing to the output failed.
    #[error("I/O error at instruction {ip}: {source}")]
    Io {
        ip: usize,
        #[source]
        source: io::Error,
    },

    /// Execution aborted due to step limit.
    #[error("Execution aborted: step limit exceeded ({limit})")]
    StepLimitExceeded { limit: usize },

    /// Execution aborted due to cooperative cancellation (timeout, Ctrl+C).
    #[error("Execution aborted: cancelled")]
    Canceled,
}

impl EngineError {
    /// Instruction index the error points at, when there is one.
    pub fn ip(&self) -> Option<usize> {
        match self {
            EngineError::UnterminatedLoop { ip }
            | EngineError::UnmatchedLoopEnd { ip }
            | EngineError::PointerOutOfBounds { ip, .. }
            | EngineError::Io { ip, .. } => Some(*ip),
            EngineError::InvalidTapeSize { .. }
            | EngineError::StepLimitExceeded { .. }
            | EngineError::Canceled => None,
        }
    }
}

/// What `,` stores in the current cell when the input is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EofPolicy {
    /// Store 0.
    #[default]
    Zero,
    /// Leave the cell as it was.
    Unchanged,
    /// Store 255, the byte a C `EOF` (-1) truncates to.
    MaxByte,
}

impl EofPolicy {
    /// Parse a policy name as used on the command line and in config files.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "zero" | "0" => Some(EofPolicy::Zero),
            "unchanged" | "keep" => Some(EofPolicy::Unchanged),
            "max" | "255" | "-1" => Some(EofPolicy::MaxByte),
            _ => None,
        }
    }

    fn apply(self, cell: u8) -> u8 {
        match self {
            EofPolicy::Zero => 0,
            EofPolicy::Unchanged => cell,
            EofPolicy::MaxByte => u8::MAX,
        }
    }
}

/// Controls for cooperative cancellation and step limiting.
#[derive(Debug, Clone, Default)]
pub struct StepControl {
    pub max_steps: Option<usize>,
    pub cancel_flag: Arc<AtomicBool>,
}

impl StepControl {
    pub fn new(max_steps: Option<usize>, cancel_flag: Arc<AtomicBool>) -> Self {
        Self { max_steps, cancel_flag }
    }
}

/// An open loop: `start` is the index just past its `[`, `end` the index of
/// the matching `]`.
#[derive(Debug, Clone, Copy)]
struct LoopFrame {
    start: usize,
    end: usize,
}

/// A Brainfuck execution engine for a single program.
///
/// The engine owns:
/// - the program bytes, never modified after creation,
/// - the instruction pointer into those bytes,
/// - a fixed-size tape of zeroed cells (30,000 by default),
/// - the data pointer into that tape.
#[derive(Debug)]
pub struct Engine {
    program: Vec<u8>,
    ip: usize,
    tape: Vec<u8>,
    dp: usize,
    eof: EofPolicy,
}

impl Engine {
    /// Create an engine for `program` with the default 30,000-cell tape.
    pub fn new(program: impl Into<Vec<u8>>) -> Self {
        Self::with_tape(program.into(), DEFAULT_TAPE_SIZE)
    }

    /// Create an engine for `program` with a tape of `tape_size` cells.
    ///
    /// Fails if `tape_size` is zero or larger than [`MAX_TAPE_SIZE`].
    pub fn create(program: impl Into<Vec<u8>>, tape_size: usize) -> Result<Self, EngineError> {
        if tape_size == 0 || tape_size > MAX_TAPE_SIZE {
            return Err(EngineError::InvalidTapeSize { size: tape_size });
        }
        Ok(Self::with_tape(program.into(), tape_size))
    }

    fn with_tape(program: Vec<u8>, tape_size: usize) -> Self {
        debug!(
            "creating engine: {} program bytes, {} tape cells",
            program.len(),
            tape_size
        );
        Self {
            program,
            ip: 0,
            tape: vec![0; tape_size],
            dp: 0,
            eof: EofPolicy::default(),
        }
    }

    /// Choose what `,` stores at end of input.
    pub fn with_eof_policy(mut self, eof: EofPolicy) -> Self {
        self.eof = eof;
        self
    }

    pub fn program(&self) -> &[u8] {
        &self.program
    }

    pub fn tape(&self) -> &[u8] {
        &self.tape
    }

    pub fn data_pointer(&self) -> usize {
        self.dp
    }

    pub fn instruction_pointer(&self) -> usize {
        self.ip
    }

    /// Execute the program against the process's stdin and stdout.
    pub fn run(&mut self) -> Result<(), EngineError> {
        let mut input = io::stdin().lock();
        let mut output = io::stdout().lock();
        self.execute(&mut input, &mut output, None)
    }

    /// Execute the program, reading `,` bytes from `input` and writing `.`
    /// bytes to `output`.
    pub fn run_with_io<R, W>(&mut self, input: &mut R, output: &mut W) -> Result<(), EngineError>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        self.execute(input, output, None)
    }

    /// Execute with cooperative cancellation and optional step limit.
    pub fn run_with_control<R, W>(
        &mut self,
        input: &mut R,
        output: &mut W,
        control: &StepControl,
    ) -> Result<(), EngineError>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        self.execute(input, output, Some(control))
    }

    /// Release the tape and program.
    pub fn destroy(self) {
        debug!(
            "releasing engine: stopped at ip={} of {}, dp={}",
            self.ip,
            self.program.len(),
            self.dp
        );
    }

    fn execute<R, W>(
        &mut self,
        input: &mut R,
        output: &mut W,
        control: Option<&StepControl>,
    ) -> Result<(), EngineError>
    where
        R: Read + ?Sized,
        W: Write + ?Sized,
    {
        let mut loops: Vec<LoopFrame> = Vec::new();
        let mut steps: usize = 0;

        while self.ip < self.program.len() {
            if let Some(ctrl) = control {
                if ctrl.cancel_flag.load(Ordering::Relaxed) {
                    return Err(EngineError::Canceled);
                }
                if let Some(max) = ctrl.max_steps {
                    if steps >= max {
                        return Err(EngineError::StepLimitExceeded { limit: max });
                    }
                }
            }
            steps = steps.saturating_add(1);

            let op = self.program[self.ip];
            trace!(
                "ip={} dp={} cell={} op={:?} depth={}",
                self.ip,
                self.dp,
                self.tape[self.dp],
                op as char,
                loops.len()
            );

            match op {
                b'>' => {
                    if self.dp + 1 >= self.tape.len() {
                        return Err(self.out_of_bounds('>'));
                    }
                    self.dp += 1;
                }
                b'<' => {
                    if self.dp == 0 {
                        return Err(self.out_of_bounds('<'));
                    }
                    self.dp -= 1;
                }
                b'+' => {
                    self.tape[self.dp] = self.tape[self.dp].wrapping_add(1);
                }
                b'-' => {
                    self.tape[self.dp] = self.tape[self.dp].wrapping_sub(1);
                }
                b'.' => {
                    let byte = [self.tape[self.dp]];
                    output
                        .write_all(&byte)
                        .and_then(|()| output.flush())
                        .map_err(|source| EngineError::Io { ip: self.ip, source })?;
                }
                b',' => self.read_cell(input)?,
                b'[' => {
                    let start = self.ip + 1;
                    let Some(end) = find_loop_end(&self.program, start) else {
                        return Err(EngineError::UnterminatedLoop { ip: self.ip });
                    };
                    if self.tape[self.dp] != 0 {
                        loops.push(LoopFrame { start, end });
                        self.ip = start;
                        continue;
                    }
                    // Skip the body; the advance below lands one past `]`.
                    self.ip = end;
                }
                b']' => {
                    let Some(frame) = loops.last().copied() else {
                        return Err(EngineError::UnmatchedLoopEnd { ip: self.ip });
                    };
                    if self.tape[self.dp] != 0 {
                        self.ip = frame.start;
                        continue;
                    }
                    loops.pop();
                    self.ip = frame.end;
                }
                _ => {}
            }

            self.ip += 1;
        }

        Ok(())
    }

    fn read_cell<R: Read + ?Sized>(&mut self, input: &mut R) -> Result<(), EngineError> {
        let mut buf = [0u8; 1];
        loop {
            match input.read(&mut buf) {
                Ok(0) => {
                    self.tape[self.dp] = self.eof.apply(self.tape[self.dp]);
                    return Ok(());
                }
                Ok(_) => {
                    self.tape[self.dp] = buf[0];
                    return Ok(());
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => return Err(EngineError::Io { ip: self.ip, source }),
            }
        }
    }

    fn out_of_bounds(&self, op: char) -> EngineError {
        EngineError::PointerOutOfBounds {
            ip: self.ip,
            ptr: self.dp,
            op,
        }
    }
}
