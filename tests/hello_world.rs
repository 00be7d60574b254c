use assert_cmd::Command;
use std::io::Write;

const HELLO_WORLD: &str = "\
Hello World program; everything that is not an instruction is a comment
++++++++                cell 0 = 8
[>++++                  cell 1 = 4
  [>++>+++>+++>+<<<<-]  cells 2 to 5 get 2 3 3 1 times 4
  >+>+>->>+             adjust and set cell 6
  [<]<-                 walk back to the zero at cell 1 and decrement cell 0
]
>>.                     H
>---.                   e
+++++++..+++.           llo
>>.                     space
<-.                     W
<.+++.------.--------.  orld
>>+.                    !
>++.                    newline
";

fn cargo_bin() -> Command {
    let mut cmd = Command::cargo_bin("bff").unwrap();
    cmd.env("BFF_CONFIG", "/nonexistent/bff.toml")
        .env_remove("BFF_TAPE_SIZE")
        .env_remove("BFF_EOF")
        .env_remove("BFF_MAX_STEPS")
        .env_remove("BFF_TIMEOUT_MS");
    cmd
}

fn write_tempfile(content: &str) -> tempfile::NamedTempFile {
    let mut tf = tempfile::NamedTempFile::new().expect("tempfile");
    write!(tf, "{}", content).unwrap();
    tf
}

#[test]
fn commented_hello_world_prints_exactly() {
    let tf = write_tempfile(HELLO_WORLD);
    cargo_bin()
        .arg(tf.path())
        .assert()
        .success()
        .stdout("Hello World!\n")
        .stderr("");
}

#[test]
fn demo_hello_world_prints_exactly() {
    cargo_bin()
        .arg(concat!(env!("CARGO_MANIFEST_DIR"), "/demos/hello.bf"))
        .assert()
        .success()
        .stdout("Hello World!\n");
}
