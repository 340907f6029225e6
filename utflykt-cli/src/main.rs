//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    if let Err(err) = utflykt_cli::run() {
        eprintln!("utflykt: {err}");
        std::process::exit(1);
    }
}
