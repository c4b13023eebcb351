use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use labkit_cli::{commands, parse_answers, parse_script, RunOptions};
use labkit_engine::test_harness::SimulatorConfig;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn cli() -> Command {
    let file_arg = Arg::new("file")
        .long("file")
        .short('f')
        .value_parser(value_parser!(PathBuf))
        .help("Lab document (JSON, YAML or TOML); defaults to the built-in library");

    Command::new("labkit")
        .version(labkit_engine::VERSION)
        .about("Guided lab procedures: validate, replay and simulate")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Engine config (TOML)"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .help("More logging (-v debug, -vv trace)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("validate")
                .about("Validate a lab document and summarize its procedures")
                .arg(
                    Arg::new("path")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Document to validate"),
                ),
        )
        .subcommand(
            Command::new("list")
                .about("List procedures")
                .arg(file_arg.clone()),
        )
        .subcommand(
            Command::new("run")
                .about("Replay an action script against a procedure")
                .arg(
                    Arg::new("procedure")
                        .required(true)
                        .help("Procedure id"),
                )
                .arg(file_arg.clone())
                .arg(
                    Arg::new("script")
                        .long("script")
                        .short('s')
                        .required(true)
                        .help(
                            "Actions (tool:<id>, add:<id>, heat, observe), \
                             or @path to read them from a file",
                        ),
                )
                .arg(
                    Arg::new("answers")
                        .long("answers")
                        .short('a')
                        .help("Quiz answers as zero-based option indices, e.g. 1,0,2"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the session journal as JSON"),
                ),
        )
        .subcommand(
            Command::new("simulate")
                .about("Run the randomized lab simulator")
                .arg(file_arg.clone())
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .default_value("42")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                )
                .arg(
                    Arg::new("runs")
                        .long("runs")
                        .default_value("1000")
                        .value_parser(value_parser!(u64))
                        .help("Number of procedure runs"),
                )
                .arg(
                    Arg::new("mistake-rate")
                        .long("mistake-rate")
                        .default_value("0.3")
                        .value_parser(value_parser!(f64))
                        .help("Probability of a wrong action (at most 0.9)"),
                )
                .arg(
                    Arg::new("stop-on-violation")
                        .long("stop-on-violation")
                        .action(ArgAction::SetTrue)
                        .help("Stop simulation on first violation"),
                ),
        )
        .subcommand(
            Command::new("certify")
                .about("Simulate under several seeds")
                .arg(file_arg)
                .arg(
                    Arg::new("runs")
                        .long("runs")
                        .default_value("200")
                        .value_parser(value_parser!(u64))
                        .help("Runs per seed"),
                ),
        )
}

fn init_tracing(matches: &ArgMatches) {
    let default_level = match matches.get_count("verbose") {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);

    if matches.get_flag("log-json") {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn file(args: &ArgMatches) -> Option<&std::path::Path> {
    args.get_one::<PathBuf>("file").map(PathBuf::as_path)
}

fn read_script(raw: &str) -> Result<String> {
    match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script {path}")),
        None => Ok(raw.to_string()),
    }
}

fn dispatch(matches: &ArgMatches) -> Result<bool> {
    let config_path = matches.get_one::<PathBuf>("config").map(PathBuf::as_path);
    let mut out = std::io::stdout().lock();

    match matches.subcommand() {
        Some(("validate", args)) => {
            let Some(path) = args.get_one::<PathBuf>("path") else {
                anyhow::bail!("missing document path");
            };
            commands::validate(path, &mut out)
        }
        Some(("list", args)) => {
            let document = commands::load_document(file(args))?;
            commands::list(&document, &mut out)?;
            Ok(true)
        }
        Some(("run", args)) => {
            let document = commands::load_document(file(args))?;
            let config = commands::load_config(config_path)?;
            let procedure = args
                .get_one::<String>("procedure")
                .context("missing procedure id")?;
            let script = args
                .get_one::<String>("script")
                .context("missing --script")?;
            let options = RunOptions {
                actions: parse_script(&read_script(script)?)?,
                answers: args
                    .get_one::<String>("answers")
                    .map(|a| parse_answers(a))
                    .transpose()?
                    .unwrap_or_default(),
                json: args.get_flag("json"),
            };
            commands::run(&document, procedure, config, &options, &mut out)?;
            Ok(true)
        }
        Some(("simulate", args)) => {
            let document = commands::load_document(file(args))?;
            let config = SimulatorConfig {
                seed: args.get_one::<u64>("seed").copied().unwrap_or(42),
                runs: args.get_one::<u64>("runs").copied().unwrap_or(1000),
                mistake_rate: args.get_one::<f64>("mistake-rate").copied().unwrap_or(0.3),
                stop_on_first_violation: args.get_flag("stop-on-violation"),
                ..SimulatorConfig::default()
            };
            commands::simulate(&document, config, &mut out)
        }
        Some(("certify", args)) => {
            let document = commands::load_document(file(args))?;
            let runs = args.get_one::<u64>("runs").copied().unwrap_or(200);
            commands::certify(&document, runs, &mut out)
        }
        _ => Ok(true),
    }
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_tracing(&matches);

    match dispatch(&matches) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let matches = cli()
            .try_get_matches_from(["labkit", "list", "-vv", "--config", "labkit.toml"])
            .unwrap();
        assert_eq!(matches.get_count("verbose"), 2);
        assert_eq!(
            matches.get_one::<PathBuf>("config"),
            Some(&PathBuf::from("labkit.toml"))
        );
    }

    #[test]
    fn run_requires_script() {
        assert!(cli()
            .try_get_matches_from(["labkit", "run", "iron-hcl"])
            .is_err());
        let matches = cli()
            .try_get_matches_from(["labkit", "run", "iron-hcl", "-s", "tool:test_tube", "--json"])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "run");
        assert!(args.get_flag("json"));
    }
}
