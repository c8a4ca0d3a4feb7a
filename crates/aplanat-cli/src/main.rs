use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use aplanat_cli::commands::{
    run_bcfstats, run_demo, run_depthcoverage, run_fastcat, run_mapula, run_nextclade, run_simple,
};
use aplanat_cli::config::ReportConfig;

fn report_args(command: Command, default_output: &'static str) -> Command {
    command
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to a JSON report configuration file")
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help(format!(
                    "Output HTML file. Overrides the configuration file [default: {}]",
                    default_output
                ))
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("title")
                .long("title")
                .help("Report title. Overrides the configuration file.")
                .value_parser(clap::builder::NonEmptyStringValueParser::new()),
        )
        .arg(
            Arg::new("lead")
                .long("lead")
                .help("Report strapline shown below the title.")
                .value_parser(clap::builder::NonEmptyStringValueParser::new()),
        )
        .arg(
            Arg::new("style")
                .long("style")
                .help("Report house style.")
                .value_parser(["ont", "ond", "epi2me", "wf"]),
        )
        .arg(
            Arg::new("logo")
                .long("logo")
                .help("PNG image embedded in the report header.")
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
}

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("APLANAT_LOG", "error,aplanat=info"))
        .init();

    let matches = Command::new("aplanat")
        .version(clap::crate_version!())
        .author("EPI2ME Labs")
        .about("aplanat - plots and standalone HTML reports")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(report_args(
            Command::new("demo")
                .about("Write a demonstration report of the plotting and report API")
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .help("Seed for the random demo data")
                        .default_value("42")
                        .value_parser(clap::value_parser!(u64)),
                ),
            "aplanat_demo_report.html",
        ))
        .subcommand(report_args(
            Command::new("simple")
                .about("Software version and workflow parameter tables")
                .arg(
                    Arg::new("versions")
                        .long("versions")
                        .help("Headerless CSV containing 'software,version', or directory of such files")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::AnyPath),
                )
                .arg(
                    Arg::new("params")
                        .long("params")
                        .help("A JSON file containing the workflow parameter key/values")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                ),
            "simple_components_report.html",
        ))
        .subcommand(report_args(
            Command::new("fastcat")
                .about("Per-read summary report from fastcat output")
                .arg(
                    Arg::new("stats_files")
                        .help("One or more files containing the per-read output from fastcat")
                        .required(true)
                        .num_args(1..)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("samples")
                        .long("samples")
                        .help("Show sample counts.")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("min_len")
                        .long("min_len")
                        .help("Minimum length filter.")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("max_len")
                        .long("max_len")
                        .help("Maximum length filter.")
                        .value_parser(clap::value_parser!(u64)),
                ),
            "fastcat_report.html",
        ))
        .subcommand(report_args(
            Command::new("bcfstats")
                .about("Variant summary report from bcftools stats output")
                .arg(
                    Arg::new("stats_files")
                        .help("One or more outputs from bcftools stats")
                        .required(true)
                        .num_args(1..)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                ),
            "bcf_stats_report.html",
        ))
        .subcommand(report_args(
            Command::new("nextclade")
                .about("Clade assignment table from nextclade output")
                .arg(
                    Arg::new("json")
                        .help("JSON output from the nextclade CLI")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                ),
            "nextclade_report.html",
        ))
        .subcommand(report_args(
            Command::new("depthcoverage")
                .about("Depth of coverage report from mosdepth output")
                .arg(
                    Arg::new("depth_file")
                        .long("depth_file")
                        .help("mosdepth regions file of all reads")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("fwd")
                        .long("fwd")
                        .help("mosdepth regions file of forward strand reads")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("rev")
                        .long("rev")
                        .help("mosdepth regions file of reverse strand reads")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("tab")
                        .long("tab")
                        .help("Show the plots in tabs rather than a grid.")
                        .action(ArgAction::SetTrue),
                ),
            "depth_coverage.html",
        ))
        .subcommand(report_args(
            Command::new("mapula")
                .about("Alignment statistics dashboard from mapula output")
                .arg(
                    Arg::new("json")
                        .help("JSON output from mapula")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("counts")
                        .long("counts")
                        .help("CSV of 'reference,expected_count' for the control tab")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                ),
            "mapula_report.html",
        ))
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Written by {author-with-newline}Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    let result = match matches.subcommand() {
        Some(("demo", sub_m)) => handle_demo(sub_m),
        Some(("simple", sub_m)) => handle_simple(sub_m),
        Some(("fastcat", sub_m)) => handle_fastcat(sub_m),
        Some(("bcfstats", sub_m)) => handle_bcfstats(sub_m),
        Some(("nextclade", sub_m)) => handle_nextclade(sub_m),
        Some(("depthcoverage", sub_m)) => handle_depthcoverage(sub_m),
        Some(("mapula", sub_m)) => handle_mapula(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    };
    match result {
        Ok(output) => {
            log::info!("[aplanat] Report written to {}", output.display());
            Ok(())
        }
        Err(e) => {
            log::error!("[aplanat] Failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_demo(matches: &ArgMatches) -> Result<PathBuf> {
    let config = ReportConfig::from_arguments(matches)?;
    let seed = matches.get_one::<u64>("seed").copied().unwrap_or(42);
    run_demo(&config, seed)
}

fn handle_simple(matches: &ArgMatches) -> Result<PathBuf> {
    let config = ReportConfig::from_arguments(matches)?;
    let versions = matches.get_one::<PathBuf>("versions");
    let params = matches.get_one::<PathBuf>("params");
    run_simple(&config, versions.map(PathBuf::as_path), params.map(PathBuf::as_path))
}

fn handle_fastcat(matches: &ArgMatches) -> Result<PathBuf> {
    let config = ReportConfig::from_arguments(matches)?;
    let stats: Vec<PathBuf> = matches
        .get_many::<PathBuf>("stats_files")
        .map(|files| files.cloned().collect())
        .unwrap_or_default();
    let min_len = matches.get_one::<u64>("min_len").map(|v| *v as f64);
    let max_len = matches.get_one::<u64>("max_len").map(|v| *v as f64);
    run_fastcat(&config, &stats, matches.get_flag("samples"), min_len, max_len)
}

fn handle_bcfstats(matches: &ArgMatches) -> Result<PathBuf> {
    let config = ReportConfig::from_arguments(matches)?;
    let stats: Vec<PathBuf> = matches
        .get_many::<PathBuf>("stats_files")
        .map(|files| files.cloned().collect())
        .unwrap_or_default();
    run_bcfstats(&config, &stats)
}

fn handle_nextclade(matches: &ArgMatches) -> Result<PathBuf> {
    let config = ReportConfig::from_arguments(matches)?;
    let json = matches
        .get_one::<PathBuf>("json")
        .ok_or_else(|| anyhow::anyhow!("missing nextclade JSON"))?;
    run_nextclade(&config, json)
}

fn handle_depthcoverage(matches: &ArgMatches) -> Result<PathBuf> {
    let config = ReportConfig::from_arguments(matches)?;
    let path = |name: &str| {
        matches
            .get_one::<PathBuf>(name)
            .ok_or_else(|| anyhow::anyhow!("missing --{}", name))
    };
    run_depthcoverage(
        &config,
        path("depth_file")?,
        path("fwd")?,
        path("rev")?,
        matches.get_flag("tab"),
    )
}

fn handle_mapula(matches: &ArgMatches) -> Result<PathBuf> {
    let config = ReportConfig::from_arguments(matches)?;
    let json = matches
        .get_one::<PathBuf>("json")
        .ok_or_else(|| anyhow::anyhow!("missing mapula JSON"))?;
    let counts = matches.get_one::<PathBuf>("counts");
    run_mapula(&config, json, counts.map(PathBuf::as_path))
}
