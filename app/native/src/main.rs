//! Huewall command-line entry point.

fn main() {
    if let Err(err) = huewall_lib::cli::run() {
        eprintln!("huewall: {err}");
        std::process::exit(1);
    }
}
