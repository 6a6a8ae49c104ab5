mod debug_report;

use pamstack::{DEFAULT_SIZE_LIMIT, FsSource, Options, Phase, PhaseSet, resolve_stack_verbose_with};
use std::io::{self, IsTerminal};
use std::path::PathBuf;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("PAMSTACK_LOG", "warn")).init();

    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let res = match resolve_stack_verbose_with(&config.root, &FsSource, &config.options) {
        Ok(res) => res,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    debug_report::print_stack(&config.root, &res, config.color);

    if let Some((phase, module)) = &config.find {
        let found = debug_report::print_lookup(&res.stack, *phase, module, config.color);
        if !found {
            std::process::exit(1);
        }
    }
}

struct CliConfig {
    root: PathBuf,
    options: Options,
    find: Option<(Phase, String)>,
    color: bool,
}

fn parse_args() -> Result<CliConfig, String> {
    let mut root: Option<PathBuf> = None;
    let mut phases: Option<PhaseSet> = None;
    let mut size_limit = DEFAULT_SIZE_LIMIT;
    let mut find = None;
    let mut color = io::stdout().is_terminal();
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("pamstack {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--color" => color = true,
            "--no-color" => color = false,
            "--phase" => {
                let value = args.next().ok_or_else(|| "error: --phase expects a value".to_string())?;
                phases = Some(phases.unwrap_or(PhaseSet::empty()) | parse_phase(&value)?.flag());
            }
            "--size-limit" => {
                let value = args.next().ok_or_else(|| "error: --size-limit expects a value".to_string())?;
                size_limit = parse_size_limit(&value)?;
            }
            "--find" => {
                let value = args.next().ok_or_else(|| "error: --find expects a value".to_string())?;
                find = Some(parse_find(&value)?);
            }
            _ if arg.starts_with("--phase=") => {
                let value = arg.trim_start_matches("--phase=");
                phases = Some(phases.unwrap_or(PhaseSet::empty()) | parse_phase(value)?.flag());
            }
            _ if arg.starts_with("--size-limit=") => {
                size_limit = parse_size_limit(arg.trim_start_matches("--size-limit="))?;
            }
            _ if arg.starts_with("--find=") => {
                find = Some(parse_find(arg.trim_start_matches("--find="))?);
            }
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => {
                if root.is_some() {
                    return Err("error: stack path provided multiple times".to_string());
                }
                root = Some(PathBuf::from(arg));
            }
        }
    }

    let root = root.ok_or_else(|| format!("error: no stack path provided\n\n{}", help_text()))?;
    let options = Options { size_limit, phases: phases.unwrap_or_default() };

    Ok(CliConfig { root, options, find, color })
}

fn parse_phase(value: &str) -> Result<Phase, String> {
    Phase::from_keyword(value)
        .ok_or_else(|| format!("error: invalid phase '{value}' (expected account, auth, password or session)"))
}

fn parse_size_limit(value: &str) -> Result<u64, String> {
    value.parse().map_err(|_| format!("error: invalid --size-limit '{value}' (expected a number of bytes)"))
}

fn parse_find(value: &str) -> Result<(Phase, String), String> {
    let (phase, module) =
        value.split_once(':').ok_or_else(|| format!("error: invalid --find '{value}' (expected PHASE:MODULE)"))?;
    if module.is_empty() {
        return Err(format!("error: invalid --find '{value}' (module is empty)"));
    }
    Ok((parse_phase(phase)?, module.to_string()))
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "pamstack {version}

Resolve a PAM stack file, expanding include/substack directives.

Usage:
  pamstack [OPTIONS] <path>

Options:
  --phase <name>             Resolve only this phase (account, auth, password,
                             session). Repeat to select several. Default: all.
  --size-limit <bytes>       Maximum size of any single stack file.
                             Default: {default_limit}
  --find <phase>:<module>    Look up the first matching directive, e.g.
                             auth:pam_unix.so
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Environment:
  PAMSTACK_LOG               Log filter (error, warn, info, debug, trace).
                             Default: warn

Exit codes:
  0  Success.
  1  Resolution failed, or --find matched nothing.
  2  Invalid arguments or missing path.
",
        version = env!("CARGO_PKG_VERSION"),
        default_limit = DEFAULT_SIZE_LIMIT
    )
}
