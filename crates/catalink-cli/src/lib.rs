//! Catalink command line
//!
//! Builds the `catalink` command tree, installs logging and dispatches to the
//! pipeline. Reports go to the given writer (stdout in the binary); logs and
//! errors go to stderr.

#![warn(missing_docs)]

use anyhow::{Context, Result};
use catalink_model::AssetGrammar;
use catalink_pipeline::{
    inspect_assets, AssetInspection, AssetSource, DirectoryAssets, Pipeline, PipelineConfig,
    RunReport, StageKind,
};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

impl LogFormat {
    fn from_arg(value: Option<&String>) -> Self {
        match value.map(String::as_str) {
            Some("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

fn io_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("input")
            .long("input")
            .value_parser(value_parser!(PathBuf))
            .help("Catalog table to read"),
    )
    .arg(
        Arg::new("assets")
            .long("assets")
            .value_parser(value_parser!(PathBuf))
            .help("Directory of image assets"),
    )
    .arg(
        Arg::new("output")
            .long("output")
            .value_parser(value_parser!(PathBuf))
            .help("Table to write on success"),
    )
    .arg(
        Arg::new("dry-run")
            .long("dry-run")
            .action(ArgAction::SetTrue)
            .help("Run every check, write nothing"),
    )
    .arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print the report as JSON"),
    )
}

/// Build the command tree
#[must_use]
pub fn build_cli() -> Command {
    Command::new("catalink")
        .version(catalink_pipeline::VERSION)
        .about("Reconcile a product catalog with its image assets")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("delimiter")
                .long("delimiter")
                .value_parser(value_parser!(char))
                .help("CSV field delimiter"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_parser(["text", "json"])
                .default_value("text")
                .help("Log line format on stderr"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("Raise log level (-v debug, -vv trace)"),
        )
        .subcommand(io_args(
            Command::new("fill-percentage")
                .about("Fill or confirm the percentage column from asset names"),
        ))
        .subcommand(
            io_args(
                Command::new("fill-image-paths")
                    .about("Fill missing imageFile values by matching asset names"),
            )
            .arg(
                Arg::new("path-prefix")
                    .long("path-prefix")
                    .help("Prefix joined with the matched file name"),
            ),
        )
        .subcommand(
            io_args(
                Command::new("validate")
                    .about("Strictly link every row to exactly one well-formed asset"),
            )
            .arg(
                Arg::new("require-all-assets")
                    .long("require-all-assets")
                    .action(ArgAction::SetTrue)
                    .help("Fail when an asset is not linked to any row"),
            ),
        )
        .subcommand(
            io_args(Command::new("run").about("Run several stages on one table")).arg(
                Arg::new("stages")
                    .long("stages")
                    .value_delimiter(',')
                    .value_parser(|s: &str| s.parse::<StageKind>())
                    .help("Comma-separated stages [default: percentage,image-paths,strict]"),
            ),
        )
        .subcommand(
            Command::new("inspect-assets")
                .about("Show what each asset file name decodes to")
                .arg(
                    Arg::new("assets")
                        .long("assets")
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory of image assets"),
                )
                .arg(
                    Arg::new("strict")
                        .long("strict")
                        .action(ArgAction::SetTrue)
                        .help("Use the strict grammar and fail on any malformed name"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the listing as JSON"),
                ),
        )
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over `verbose` when set. Calling this twice is harmless.
pub fn init_tracing(format: LogFormat, verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);
    let _ = match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    };
}

/// Parse arguments, install logging and execute; returns the exit code
pub fn main_with_args<I, T>(args: I, out: &mut impl Write) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = match build_cli().try_get_matches_from(args) {
        Ok(matches) => matches,
        Err(err) => {
            let _ = err.print();
            return err.exit_code();
        }
    };

    init_tracing(
        LogFormat::from_arg(matches.get_one::<String>("log-format")),
        matches.get_count("verbose"),
    );

    match execute(&matches, out) {
        Ok(code) => code,
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            eprintln!("error: {err:#}");
            1
        }
    }
}

/// Execute parsed arguments, writing reports to `out`
///
/// # Errors
/// Returns the first configuration, I/O or pipeline error.
pub fn execute(matches: &ArgMatches, out: &mut impl Write) -> Result<i32> {
    let mut config = load_config(matches)?;

    let Some((name, args)) = matches.subcommand() else {
        anyhow::bail!("no command given");
    };

    let stages: Vec<StageKind> = match name {
        "fill-percentage" => vec![StageKind::Percentage],
        "fill-image-paths" => {
            if let Some(prefix) = args.get_one::<String>("path-prefix") {
                config.image_paths.path_prefix = Some(prefix.clone());
            }
            vec![StageKind::ImagePaths]
        }
        "validate" => {
            if args.get_flag("require-all-assets") {
                config.strict.require_all_assets_linked = true;
            }
            vec![StageKind::Strict]
        }
        "run" => args
            .get_many::<StageKind>("stages")
            .map_or_else(|| StageKind::ALL.to_vec(), |s| s.copied().collect()),
        "inspect-assets" => return inspect(config, args, out),
        other => anyhow::bail!("unknown command '{other}'"),
    };

    apply_io_args(&mut config, args);
    let pipeline = Pipeline::new(config).context("invalid configuration")?;
    let report = pipeline
        .run_files(&stages)
        .with_context(|| format!("{name} failed"))?;

    write_report(&report, args.get_flag("json"), out)?;
    Ok(0)
}

fn load_config(matches: &ArgMatches) -> Result<PipelineConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("cannot load configuration {}", path.display()))?,
        None => PipelineConfig::new(),
    };
    if let Some(delimiter) = matches.get_one::<char>("delimiter") {
        config.delimiter = *delimiter;
    }
    Ok(config)
}

fn apply_io_args(config: &mut PipelineConfig, args: &ArgMatches) {
    if let Some(input) = args.get_one::<PathBuf>("input") {
        config.paths.input = Some(input.clone());
    }
    if let Some(assets) = args.get_one::<PathBuf>("assets") {
        config.paths.assets_dir = Some(assets.clone());
    }
    if let Some(output) = args.get_one::<PathBuf>("output") {
        config.paths.output = Some(output.clone());
    }
    if args.get_flag("dry-run") {
        config.dry_run = true;
    }
}

fn write_report(report: &RunReport, json: bool, out: &mut impl Write) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, report)?;
        writeln!(out)?;
    } else {
        writeln!(out, "{}", report.render_text())?;
    }
    Ok(())
}

fn inspect(mut config: PipelineConfig, args: &ArgMatches, out: &mut impl Write) -> Result<i32> {
    if let Some(assets) = args.get_one::<PathBuf>("assets") {
        config.paths.assets_dir = Some(assets.clone());
    }
    config.validate().context("invalid configuration")?;

    let strict = args.get_flag("strict");
    let (grammar, extensions) = if strict {
        (AssetGrammar::Strict, &config.strict.extensions)
    } else {
        (AssetGrammar::Lenient, &config.percentage.extensions)
    };

    let listing = DirectoryAssets::new(config.assets_dir()?).list()?;
    let report = inspect_assets(&listing, grammar, extensions);

    if args.get_flag("json") {
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
    } else {
        for entry in &report {
            writeln!(out, "{}", inspection_line(entry))?;
        }
    }

    let malformed = report.iter().filter(|e| !e.is_well_formed()).count();
    tracing::info!(assets = report.len(), malformed, "assets inspected");
    Ok(i32::from(strict && malformed > 0))
}

fn inspection_line(entry: &AssetInspection) -> String {
    match (&entry.attributes, &entry.error) {
        (Some(a), _) => format!(
            "ok   {}  name={:?} volume={} box={} percentage={}",
            entry.file_name, a.name, a.volume, a.box_quantity, a.percentage
        ),
        (None, Some(reason)) => format!("bad  {}  {}", entry.file_name, reason),
        (None, None) => format!("bad  {}", entry.file_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_tree_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn stages_parse_from_a_list() {
        let matches = build_cli()
            .try_get_matches_from(["catalink", "run", "--stages", "percentage,validate"])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        let stages: Vec<StageKind> = args.get_many::<StageKind>("stages").unwrap().copied().collect();
        assert_eq!(stages, vec![StageKind::Percentage, StageKind::Strict]);
    }

    #[test]
    fn unknown_stage_is_a_usage_error() {
        let err = build_cli()
            .try_get_matches_from(["catalink", "run", "--stages", "everything"])
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn delimiter_override_applies_on_top_of_defaults() {
        let matches = build_cli()
            .try_get_matches_from(["catalink", "--delimiter", ";", "fill-percentage"])
            .unwrap();
        let config = load_config(&matches).unwrap();
        assert_eq!(config.delimiter, ';');
    }

    #[test]
    fn log_format_defaults_to_text() {
        let matches = build_cli()
            .try_get_matches_from(["catalink", "validate"])
            .unwrap();
        assert_eq!(
            LogFormat::from_arg(matches.get_one::<String>("log-format")),
            LogFormat::Text
        );
    }
}
