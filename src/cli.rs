use std::path::PathBuf;

pub struct Cli {
    pub config: Option<PathBuf>,
    pub verbose: bool,
    pub help: bool,
}

pub fn parse() -> Cli {
    let mut config: Option<PathBuf> = None;
    let mut verbose = false;
    let mut help = false;

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                if let Some(p) = it.next() {
                    config = Some(PathBuf::from(p));
                }
            }
            "--verbose" | "-v" => verbose = true,
            "--help" | "-h" => help = true,
            _ => {}
        }
    }

    Cli {
        config,
        verbose,
        help,
    }
}

pub fn print_help() {
    eprintln!(
        r#"aramtally - daily ARAM win/loss Discord bot

Usage:
  aramtally [--config PATH] [-v]

Options:
  --config, -c PATH   Config file (default: config.toml).
  -v, --verbose       Debug-level logging (RUST_LOG overrides).
  -h, --help          Show this help.

Notes:
  • RIOT_API_KEY and DISCORD_BOT_TOKEN are read from the environment (.env works).
  • Queue, rollover hour and timezone offset live in config.toml.
"#
    );
}
