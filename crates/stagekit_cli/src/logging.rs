//! Stderr logging setup.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

/// Default filter directive for the given verbosity flags.
pub fn derive_log_level(n_verbose: u8, if_quiet: bool) -> &'static str {
    if if_quiet {
        return "error";
    }
    match n_verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Install a compact fmt subscriber writing to stderr.
///
/// Stdout stays reserved for the final summary line. The level comes from
/// the `-v`/`-q` flags only; colours are used when stderr is a terminal.
pub fn init_logging(n_verbose: u8, if_quiet: bool) {
    let filter = EnvFilter::new(derive_log_level(n_verbose, if_quiet));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .compact()
        .try_init();
}
