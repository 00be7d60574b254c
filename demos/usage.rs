use bff::{Engine, EofPolicy};
use std::io::{self, Cursor};

fn main() {
    // Classic Brainfuck "Hello World!\n" program
    let code = include_str!("hello.bf");

    let mut bf = Engine::new(code);
    if let Err(err) = bf.run() {
        eprintln!("Brainfuck interpreter error: {err}");
        std::process::exit(1);
    }
    bf.destroy();

    // Upper-case ASCII input by subtracting 32 from every byte until EOF.
    let shout = ",[--------------------------------.,]";
    let mut bf = Engine::create(shout, 8)
        .expect("tape size is valid")
        .with_eof_policy(EofPolicy::Zero);
    let mut output = Vec::new();
    if let Err(err) = bf.run_with_io(&mut Cursor::new(b"quiet".to_vec()), &mut output) {
        eprintln!("Brainfuck interpreter error: {err}");
        std::process::exit(1);
    }
    println!("{}", String::from_utf8_lossy(&output));

    // Errors carry the instruction index.
    let mut bf = Engine::create("+<", 8).expect("tape size is valid");
    match bf.run_with_io(&mut io::empty(), &mut io::sink()) {
        Ok(()) => println!("unexpectedly ran"),
        Err(err) => println!("expected failure: {err} (at {:?})", err.ip()),
    }
}
