use anyhow::{Result, ensure};

use fortune_wheel::{Preset, SpinRequest, WheelConfig, WinnerPolicy};

use crate::logic::simulation::{
    PrizeFrequency, SpinHarness, WheelEvent, check_landing, compare_frequencies,
    expected_shares, sample_selection,
};

/// Selections drawn per distribution iteration.
pub const DISTRIBUTION_SAMPLE_SIZE: usize = 20_000;
/// Largest accepted gap between observed and expected share.
pub const DISTRIBUTION_TOLERANCE: f64 = 0.02;
/// Spins per landing iteration.
pub const LANDING_SPINS: usize = 50;

/// Inputs for one scenario iteration.
#[derive(Debug, Clone)]
pub struct ScenarioCtx<'a> {
    pub config: &'a WheelConfig,
    pub seed: u64,
    pub iteration: usize,
}

/// What a passing iteration observed.
#[derive(Debug, Clone, Default)]
pub struct IterationOutcome {
    pub spins: usize,
    pub distribution: Vec<PrizeFrequency>,
}

impl IterationOutcome {
    const fn spins(spins: usize) -> Self {
        Self {
            spins,
            distribution: Vec::new(),
        }
    }
}

pub type ScenarioCheck = fn(&ScenarioCtx<'_>) -> Result<IterationOutcome>;

#[derive(Debug, Clone, Copy)]
pub struct Scenario {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Wheel used when no catalog is supplied on the command line.
    pub preset: Preset,
    pub check: ScenarioCheck,
}

const SCENARIOS: [Scenario; 8] = [
    Scenario {
        key: "smoke",
        name: "Smoke Test",
        description: "One spin settles with a start and an end notification",
        preset: Preset::CashPrizes,
        check: smoke,
    },
    Scenario {
        key: "uniform-distribution",
        name: "Uniform Distribution",
        description: "Uniform selection gives every prize an equal share",
        preset: Preset::CashPrizes,
        check: uniform_distribution,
    },
    Scenario {
        key: "weighted-distribution",
        name: "Weighted Distribution",
        description: "Weighted selection tracks normalised probabilities",
        preset: Preset::WeightedPrizes,
        check: weighted_distribution,
    },
    Scenario {
        key: "fixed-winner",
        name: "Fixed Winner",
        description: "A default winner key always wins",
        preset: Preset::WeightedPrizes,
        check: fixed_winner,
    },
    Scenario {
        key: "safe-zone-landing",
        name: "Safe Zone Landing",
        description: "Every landing sits inside the winner's safe zone",
        preset: Preset::CashPrizes,
        check: safe_zone_landing,
    },
    Scenario {
        key: "reentrancy-guard",
        name: "Reentrancy Guard",
        description: "Triggers during a spin are ignored",
        preset: Preset::CashPrizes,
        check: reentrancy_guard,
    },
    Scenario {
        key: "teardown-cancels",
        name: "Teardown Cancels",
        description: "Teardown mid-spin suppresses the end notification",
        preset: Preset::CashPrizes,
        check: teardown_cancels,
    },
    Scenario {
        key: "zero-rotations",
        name: "Zero Rotations",
        description: "A spin without full turns settles within one turn",
        preset: Preset::CashPrizes,
        check: zero_rotations,
    },
];

pub fn get_scenario(name: &str) -> Option<Scenario> {
    let name = name.trim().to_lowercase();
    SCENARIOS.into_iter().find(|scenario| scenario.key == name)
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    SCENARIOS
        .iter()
        .map(|scenario| (scenario.key, scenario.description))
        .collect()
}

pub fn all_scenario_keys() -> impl Iterator<Item = &'static str> {
    SCENARIOS.iter().map(|scenario| scenario.key)
}

fn smoke(ctx: &ScenarioCtx<'_>) -> Result<IterationOutcome> {
    let harness = SpinHarness::new(ctx.config.clone(), ctx.seed)?;
    let record = harness.spin_to_rest()?;
    ensure!(
        harness.events()
            == vec![
                WheelEvent::Started,
                WheelEvent::Ended(record.outcome.prize.key.clone())
            ],
        "unexpected notifications: {:?}",
        harness.events()
    );
    check_landing(&record, ctx.config.prizes.len())?;
    Ok(IterationOutcome::spins(1))
}

fn distribution(ctx: &ScenarioCtx<'_>, policy: &WinnerPolicy) -> Result<IterationOutcome> {
    let catalog = &ctx.config.prizes;
    let expected = expected_shares(catalog, policy)?;
    let counts = sample_selection(catalog, policy, ctx.seed, DISTRIBUTION_SAMPLE_SIZE)?;
    let table = compare_frequencies(catalog, &counts, &expected, DISTRIBUTION_TOLERANCE)?;
    Ok(IterationOutcome {
        spins: DISTRIBUTION_SAMPLE_SIZE,
        distribution: table,
    })
}

fn uniform_distribution(ctx: &ScenarioCtx<'_>) -> Result<IterationOutcome> {
    distribution(ctx, &WinnerPolicy::Uniform)
}

fn weighted_distribution(ctx: &ScenarioCtx<'_>) -> Result<IterationOutcome> {
    distribution(ctx, &WinnerPolicy::Weighted)
}

fn fixed_winner(ctx: &ScenarioCtx<'_>) -> Result<IterationOutcome> {
    let catalog = &ctx.config.prizes;
    ensure!(!catalog.is_empty(), "catalog is empty");
    let target = &catalog.prizes()[ctx.iteration % catalog.len()].key;
    let config = ctx.config.clone().with_default_winner(target.clone());
    let harness = SpinHarness::new(config, ctx.seed)?;
    for _ in 0..3 {
        let record = harness.spin_to_rest()?;
        ensure!(
            &record.outcome.prize.key == target,
            "fixed winner {target:?} lost to {:?}",
            record.outcome.prize.key
        );
        check_landing(&record, catalog.len())?;
    }
    Ok(IterationOutcome::spins(3))
}

fn safe_zone_landing(ctx: &ScenarioCtx<'_>) -> Result<IterationOutcome> {
    let harness = SpinHarness::new(ctx.config.clone(), ctx.seed)?;
    for _ in 0..LANDING_SPINS {
        let record = harness.spin_to_rest()?;
        check_landing(&record, ctx.config.prizes.len())?;
    }
    Ok(IterationOutcome::spins(LANDING_SPINS))
}

fn reentrancy_guard(ctx: &ScenarioCtx<'_>) -> Result<IterationOutcome> {
    let harness = SpinHarness::new(ctx.config.clone(), ctx.seed)?;
    let wheel = harness.wheel();
    ensure!(wheel.spin()? == SpinRequest::Accepted, "first spin refused");
    for _ in 0..5 {
        ensure!(
            wheel.spin()? == SpinRequest::AlreadySpinning,
            "trigger before commit was not ignored"
        );
    }
    harness.scheduler().advance(0);
    for _ in 0..5 {
        ensure!(
            wheel.spin()? == SpinRequest::AlreadySpinning,
            "trigger during animation was not ignored"
        );
    }
    harness.scheduler().run_until_idle();
    let events = harness.events();
    ensure!(
        events.len() == 2 && events[0] == WheelEvent::Started,
        "expected one start and one end, got {events:?}"
    );
    ensure!(wheel.spins_completed() == 1, "more than one spin completed");
    Ok(IterationOutcome::spins(1))
}

fn teardown_cancels(ctx: &ScenarioCtx<'_>) -> Result<IterationOutcome> {
    let harness = SpinHarness::new(ctx.config.clone(), ctx.seed)?;
    let wheel = harness.wheel();
    wheel.spin()?;
    harness.scheduler().advance(0);
    harness
        .scheduler()
        .advance(ctx.config.animation_duration_in_ms / 2);
    wheel.teardown();
    ensure!(
        harness.scheduler().pending() == 0,
        "teardown left work scheduled"
    );
    harness.scheduler().run_until_idle();
    ensure!(
        harness.events() == vec![WheelEvent::Started],
        "notifications after teardown: {:?}",
        harness.events()
    );
    ensure!(
        wheel.spin()? == SpinRequest::Detached,
        "torn down wheel accepted a spin"
    );
    Ok(IterationOutcome::spins(1))
}

fn zero_rotations(ctx: &ScenarioCtx<'_>) -> Result<IterationOutcome> {
    let config = ctx.config.clone().with_rotations(0);
    let harness = SpinHarness::new(config, ctx.seed)?;
    let record = harness.spin_to_rest()?;
    let rotation = record.plan.final_rotation;
    ensure!(
        rotation < 0.0 && rotation > -360.0,
        "rotation {rotation:.4} is not within one turn"
    );
    check_landing(&record, ctx.config.prizes.len())?;
    Ok(IterationOutcome::spins(1))
}
