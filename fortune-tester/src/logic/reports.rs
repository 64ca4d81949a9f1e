use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use fortune_wheel::numbers::usize_to_f64;

use super::ScenarioResult;
use super::simulation::PrizeFrequency;

fn success_rate(results: &[ScenarioResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let passed = results.iter().filter(|r| r.passed).count();
    usize_to_f64(passed) / usize_to_f64(results.len()) * 100.0
}

fn write_distribution_table(out: &mut dyn Write, rows: &[PrizeFrequency]) -> Result<()> {
    writeln!(out, "| Prize | Expected | Observed | Deviation |")?;
    writeln!(out, "|-------|----------|----------|-----------|")?;
    for row in rows {
        writeln!(
            out,
            "| {} | {:.4} | {:.4} | {:.4} |",
            row.key,
            row.expected,
            row.observed,
            row.deviation()
        )?;
    }
    Ok(())
}

pub fn generate_console_report(
    out: &mut dyn Write,
    results: &[ScenarioResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Spin Test Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "=============================".cyan())?;

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();
    writeln!(out, "Total scenarios: {total}")?;
    writeln!(out, "Passed: {}", passed.to_string().green())?;
    writeln!(out, "Failed: {}", (total - passed).to_string().red())?;
    writeln!(out, "Success rate: {:.1}%", success_rate(results))?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(
            out,
            "{} {} (seed {})",
            status,
            result.scenario_name.bold(),
            result.seed
        )?;
        writeln!(
            out,
            "   Iterations: {}/{} successful, {} spins",
            result.successful_iterations, result.iterations_run, result.spins
        )?;
        writeln!(out, "   Catalog: {}", result.catalog_fingerprint)?;
        writeln!(out, "   Average time: {:?}", result.average_duration)?;

        if !result.distribution.is_empty() {
            for row in &result.distribution {
                writeln!(
                    out,
                    "     {:<12} expected {:.4} observed {:.4}",
                    row.key, row.expected, row.observed
                )?;
            }
        }

        if !result.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &result.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }

    let fastest = results.iter().min_by_key(|r| r.average_duration);
    let slowest = results.iter().max_by_key(|r| r.average_duration);
    if let (Some(fastest), Some(slowest)) = (fastest, slowest) {
        writeln!(out, "{}", "⚡ Performance Summary".bright_yellow().bold())?;
        writeln!(out, "{}", "=====================".yellow())?;
        writeln!(
            out,
            "Fastest: {} ({:?})",
            fastest.scenario_name.green(),
            fastest.average_duration
        )?;
        writeln!(
            out,
            "Slowest: {} ({:?})",
            slowest.scenario_name.yellow(),
            slowest.average_duration
        )?;
    }
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    let json_output = serde_json::to_string_pretty(results)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    writeln!(out, "# Fortune Wheel Test Results\n")?;

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();
    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total scenarios**: {total}")?;
    writeln!(out, "- **Passed**: {passed}")?;
    writeln!(out, "- **Failed**: {}", total - passed)?;
    writeln!(out, "- **Success rate**: {:.1}%\n", success_rate(results))?;

    writeln!(out, "## Detailed Results\n")?;
    for result in results {
        let status = if result.passed { "✅" } else { "❌" };
        writeln!(
            out,
            "### {} {} (seed {})\n",
            status, result.scenario_name, result.seed
        )?;
        writeln!(
            out,
            "- **Iterations**: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "- **Spins**: {}", result.spins)?;
        writeln!(out, "- **Catalog**: `{}`", result.catalog_fingerprint)?;
        writeln!(out, "- **Average time**: {:?}", result.average_duration)?;

        if !result.failures.is_empty() {
            writeln!(out, "- **Failures**:")?;
            for failure in &result.failures {
                writeln!(out, "  - {failure}")?;
            }
        }
        if !result.distribution.is_empty() {
            writeln!(out)?;
            write_distribution_table(out, &result.distribution)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(passed: bool) -> ScenarioResult {
        ScenarioResult {
            scenario_name: "Weighted Distribution".to_string(),
            seed: 1337,
            catalog_fingerprint: "abcd".to_string(),
            passed,
            iterations_run: 2,
            successful_iterations: if passed { 2 } else { 1 },
            spins: 40_000,
            failures: if passed {
                Vec::new()
            } else {
                vec!["Prize 4 drifted".to_string()]
            },
            distribution: vec![PrizeFrequency {
                key: "Prize 4".to_string(),
                expected: 0.6,
                observed: 0.601,
            }],
            average_duration: Duration::from_millis(3),
            performance_data: vec![Duration::from_millis(3)],
        }
    }

    fn render(f: impl Fn(&mut dyn Write) -> Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn markdown_includes_distribution_table() {
        let text = render(|out| generate_markdown_report(out, &[sample(true)]));
        assert!(text.contains("# Fortune Wheel Test Results"));
        assert!(text.contains("| Prize 4 | 0.6000 | 0.6010 | 0.0010 |"));
    }

    #[test]
    fn console_lists_failures() {
        let text = render(|out| {
            generate_console_report(out, &[sample(true), sample(false)], Duration::ZERO)
        });
        assert!(text.contains("Total scenarios: 2"));
        assert!(text.contains("Success rate: 50.0%"));
        assert!(text.contains("Prize 4 drifted"));
    }

    #[test]
    fn json_is_an_array() {
        let text = render(|out| generate_json_report(out, &[sample(true)]));
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.as_array().map(Vec::len), Some(1));
    }
}
