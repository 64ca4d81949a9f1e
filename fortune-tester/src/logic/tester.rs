use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use fortune_wheel::WheelConfig;

use crate::logic::simulation::PrizeFrequency;
use crate::scenarios::{Scenario, ScenarioCtx};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub catalog_fingerprint: String,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub spins: usize,
    pub failures: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub distribution: Vec<PrizeFrequency>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

pub struct LogicTester {
    verbose: bool,
    catalog: Option<WheelConfig>,
}

impl LogicTester {
    pub const fn new(verbose: bool, catalog: Option<WheelConfig>) -> Self {
        Self { verbose, catalog }
    }

    pub fn run_scenario(
        &self,
        scenario: &Scenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        seeds
            .iter()
            .map(|&seed| {
                if self.verbose {
                    println!(
                        "🧪 Testing scenario: {} (seed: {})",
                        scenario.name.bright_white(),
                        seed
                    );
                }
                self.run_single_scenario(scenario, seed, iterations)
            })
            .collect()
    }

    fn resolve_config(&self, scenario: &Scenario) -> Result<WheelConfig, String> {
        match &self.catalog {
            Some(config) => Ok(config.clone()),
            None => scenario
                .preset
                .load()
                .map_err(|err| format!("preset {} failed to load: {err}", scenario.preset)),
        }
    }

    fn run_single_scenario(
        &self,
        scenario: &Scenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let config = match self.resolve_config(scenario) {
            Ok(config) => config,
            Err(failure) => {
                return ScenarioResult {
                    scenario_name: scenario.name.to_string(),
                    seed,
                    catalog_fingerprint: String::new(),
                    passed: false,
                    iterations_run: 0,
                    successful_iterations: 0,
                    spins: 0,
                    failures: vec![failure],
                    distribution: Vec::new(),
                    average_duration: Duration::ZERO,
                    performance_data: Vec::new(),
                };
            }
        };

        let mut successes = 0;
        let mut spins = 0;
        let mut failures = Vec::new();
        let mut distribution = Vec::new();
        let mut performance_data = Vec::new();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
            let ctx = ScenarioCtx {
                config: &config,
                seed: iteration_seed,
                iteration: i,
            };

            match (scenario.check)(&ctx) {
                Ok(outcome) => {
                    successes += 1;
                    spins += outcome.spins;
                    if !outcome.distribution.is_empty() {
                        distribution = outcome.distribution;
                    }
                    let duration = start_time.elapsed();
                    performance_data.push(duration);
                    if self.verbose {
                        println!(
                            "  ✅ Iteration {}/{} passed ({duration:?}) spins:{}",
                            i + 1,
                            iterations,
                            outcome.spins
                        );
                    }
                }
                Err(err) => {
                    log::debug!("{} seed {iteration_seed} failed: {err:#}", scenario.key);
                    let message = format!(
                        "Iteration {} (seed {iteration_seed}): {err:#}",
                        i + 1
                    );
                    if self.verbose {
                        println!(
                            "  ❌ Iteration {}/{} failed: {}",
                            i + 1,
                            iterations,
                            message.clone().red()
                        );
                    }
                    failures.push(message);
                }
            }
        }

        let average_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name.to_string(),
            seed,
            catalog_fingerprint: format!("{:016x}", config.prizes.fingerprint()),
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            spins,
            failures,
            distribution,
            average_duration,
            performance_data,
        }
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_micros().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros = u128::deserialize(deserializer)?;
        Ok(Duration::from_micros(u64::try_from(micros).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let micros: Vec<u128> = durations.iter().map(Duration::as_micros).collect();
        micros.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros = Vec::<u128>::deserialize(deserializer)?;
        Ok(micros
            .into_iter()
            .map(|m| Duration::from_micros(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}
