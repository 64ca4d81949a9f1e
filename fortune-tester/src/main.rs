mod logic;
mod scenarios;
mod util;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use logic::LogicTester;
use scenarios::{all_scenario_keys, get_scenario, list_scenarios};
use util::{load_catalog, parse_seeds, split_csv};

#[derive(Debug, Parser)]
#[command(name = "fortune-tester", version = "0.1.0")]
#[command(about = "Scenario-driven QA for the fortune wheel engine")]
struct Args {
    /// Scenarios to run (comma-separated, or "all")
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// JSON wheel configuration or prize array used instead of the presets
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let scenarios = expand_scenarios(&args.scenarios);
    let seeds = parse_seeds(&args.seeds)?;
    let catalog = args.catalog.as_deref().map(load_catalog).transpose()?;

    let results = run_logic_scenarios(&args, &scenarios, &seeds, catalog);
    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:25} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🎡 Fortune Wheel Tester".bright_cyan().bold());
    println!("{}", "=======================".cyan());
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s == "all") {
        scenarios.retain(|s| s != "all");
        for key in all_scenario_keys() {
            if !scenarios.iter().any(|s| s == key) {
                scenarios.push(key.to_string());
            }
        }
    }
    scenarios
}

fn run_logic_scenarios(
    args: &Args,
    scenarios: &[String],
    seeds: &[u64],
    catalog: Option<fortune_wheel::WheelConfig>,
) -> Vec<logic::ScenarioResult> {
    println!("{}", "🧠 Running Spin Scenarios".bright_yellow().bold());
    println!("{}", "-".repeat(30).yellow());

    let tester = LogicTester::new(args.verbose, catalog);
    let mut results = Vec::new();
    for scenario_name in scenarios {
        if let Some(scenario) = get_scenario(scenario_name) {
            results.extend(tester.run_scenario(&scenario, seeds, args.iterations));
        } else {
            eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
        }
    }
    results
}

fn write_reports(args: &Args, results: &[logic::ScenarioResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => logic::reports::generate_json_report(output_target.writer(), results)?,
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    output_target.writer(),
                    "# Fortune Wheel Test Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(output_target.writer(), results)?;
            }
        }
        _ => {
            if results.is_empty() {
                writeln!(output_target.writer(), "No scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(
                    output_target.writer(),
                    results,
                    start_time.elapsed(),
                )?;
            }
            writeln!(output_target.writer())?;
            writeln!(
                output_target.writer(),
                "🏁 Total time: {:?}",
                start_time.elapsed()
            )?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}
