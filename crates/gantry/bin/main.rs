//! The `gantry` CLI: deploy contracts across configured networks and hand
//! the result to source verification.

fn main() {
    if let Err(err) = gantry::args::run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}
