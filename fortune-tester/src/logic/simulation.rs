use anyhow::{Context, Result, bail, ensure};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

use fortune_wheel::numbers::{u32_to_f64, u64_to_f64, usize_to_f64};
use fortune_wheel::random::SpinDraws;
use fortune_wheel::{
    ManualScheduler, PrizeCatalog, SpinRecord, SpinRequest, SpinRng, Wheel, WheelConfig,
    WinnerPolicy, landing_index, safe_zone, select,
};

/// Notification observed from a simulated wheel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WheelEvent {
    Started,
    Ended(String),
}

/// A wheel mounted on a virtual clock with every notification recorded.
pub struct SpinHarness {
    wheel: Wheel<ManualScheduler>,
    scheduler: ManualScheduler,
    events: Rc<RefCell<Vec<WheelEvent>>>,
}

impl SpinHarness {
    pub fn new(config: WheelConfig, seed: u64) -> Result<Self> {
        let scheduler = ManualScheduler::new();
        let wheel = Wheel::with_seed(config, scheduler.clone(), seed)
            .context("wheel configuration rejected")?;
        let events = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&events);
        wheel.on_spin_start(move || sink.borrow_mut().push(WheelEvent::Started));
        let sink = Rc::clone(&events);
        wheel.on_spin_end(move |prize| sink.borrow_mut().push(WheelEvent::Ended(prize.key.clone())));

        Ok(Self {
            wheel,
            scheduler,
            events,
        })
    }

    pub const fn wheel(&self) -> &Wheel<ManualScheduler> {
        &self.wheel
    }

    pub const fn scheduler(&self) -> &ManualScheduler {
        &self.scheduler
    }

    pub fn events(&self) -> Vec<WheelEvent> {
        self.events.borrow().clone()
    }

    pub fn clear_events(&self) {
        self.events.borrow_mut().clear();
    }

    /// Spin once and run the clock until the wheel settles.
    pub fn spin_to_rest(&self) -> Result<SpinRecord> {
        let request = self.wheel.spin()?;
        ensure!(
            request == SpinRequest::Accepted,
            "spin was not accepted: {request:?}"
        );
        self.scheduler.run_until_idle();
        ensure!(self.wheel.is_settled(), "wheel did not settle");
        self.wheel
            .last_record()
            .context("settled wheel has no spin record")
    }
}

/// Verify that a settled record lands inside its winner's safe zone.
pub fn check_landing(record: &SpinRecord, segment_count: usize) -> Result<()> {
    let index = record.outcome.index;
    let zone = safe_zone(index, segment_count)?;
    ensure!(
        zone.contains(record.plan.target_angle),
        "target {:.4} outside safe zone ({:.4}, {:.4}) of segment {index}",
        record.plan.target_angle,
        zone.start,
        zone.end
    );
    let turns = u32_to_f64(record.plan.full_rotations) * 360.0;
    let magnitude = -record.plan.final_rotation;
    ensure!(
        magnitude > turns && magnitude < turns + 360.0,
        "rotation {:.4} is not {} full turns plus part of one",
        record.plan.final_rotation,
        record.plan.full_rotations
    );
    let landed = landing_index(record.plan.final_rotation, segment_count);
    ensure!(
        landed == Some(index),
        "rotation {:.4} lands on {landed:?}, expected {index}",
        record.plan.final_rotation
    );
    Ok(())
}

/// Observed against expected share of one prize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrizeFrequency {
    pub key: String,
    pub expected: f64,
    pub observed: f64,
}

impl PrizeFrequency {
    pub fn deviation(&self) -> f64 {
        (self.observed - self.expected).abs()
    }
}

/// Draw `samples` winners under `policy` and tally them per segment.
pub fn sample_selection(
    catalog: &PrizeCatalog,
    policy: &WinnerPolicy,
    seed: u64,
    samples: usize,
) -> Result<Vec<u64>> {
    let mut rng = SpinRng::from_user_seed(seed);
    let mut counts = vec![0u64; catalog.len()];
    for _ in 0..samples {
        let outcome = select(catalog, policy, rng.selection())?;
        counts[outcome.index] += 1;
    }
    Ok(counts)
}

/// Share of selections each prize should receive under `policy`.
pub fn expected_shares(catalog: &PrizeCatalog, policy: &WinnerPolicy) -> Result<Vec<f64>> {
    match policy {
        WinnerPolicy::Uniform => {
            let share = 1.0 / usize_to_f64(catalog.len());
            Ok(vec![share; catalog.len()])
        }
        WinnerPolicy::Weighted => {
            let total = catalog.total_weight();
            ensure!(total > 0.0, "catalog has no positive probabilities");
            Ok(catalog
                .iter()
                .map(|prize| prize.selection_weight() / total)
                .collect())
        }
        WinnerPolicy::Fixed(key) => {
            let Some(position) = catalog.position(key) else {
                bail!("fixed key {key:?} is not in the catalog");
            };
            Ok((0..catalog.len())
                .map(|idx| if idx == position { 1.0 } else { 0.0 })
                .collect())
        }
    }
}

/// Pair tallies with expectations and fail if any share drifts past `tolerance`.
pub fn compare_frequencies(
    catalog: &PrizeCatalog,
    counts: &[u64],
    expected: &[f64],
    tolerance: f64,
) -> Result<Vec<PrizeFrequency>> {
    let total: u64 = counts.iter().sum();
    ensure!(total > 0, "no selections were drawn");
    let total = u64_to_f64(total);
    let table: Vec<PrizeFrequency> = catalog
        .iter()
        .zip(counts.iter().zip(expected))
        .map(|(prize, (&count, &share))| PrizeFrequency {
            key: prize.key.clone(),
            expected: share,
            observed: u64_to_f64(count) / total,
        })
        .collect();
    if let Some(worst) = table
        .iter()
        .filter(|row| row.deviation() > tolerance)
        .max_by(|a, b| a.deviation().total_cmp(&b.deviation()))
    {
        bail!(
            "{} observed {:.4}, expected {:.4} (tolerance {tolerance})",
            worst.key,
            worst.observed,
            worst.expected
        );
    }
    Ok(table)
}
