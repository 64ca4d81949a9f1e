//! Spin lifecycle: a pure state machine plus the driver that binds it to a
//! scheduler and to host callbacks.
//!
//! A spin runs in three steps:
//!
//! 1. **Trigger**: ignored while a spin is in flight. Otherwise the wheel is
//!    reset to rotation `0` with animation suppressed, and a commit step is
//!    scheduled for the next scheduling opportunity.
//! 2. **Commit**: the winner is selected, the landing rotation planned and
//!    written, the settle timer started, and the start notification fired.
//! 3. **Settle**: once the timer fires the wheel returns to idle and the end
//!    notification reports the winner.
//!
//! [`SpinMachine`] holds the state and returns [`SpinEffect`]s for every
//! transition; [`Wheel`] performs them.
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

use crate::config::WheelConfig;
use crate::error::SpinError;
use crate::planner::{RotationPlan, plan_rotation};
use crate::random::SpinDraws;
use crate::selector::{SpinOutcome, WinnerPolicy, check_eligible, select};

pub mod scheduler;
pub mod session;

pub use scheduler::{ManualHandle, ManualScheduler, Scheduler, Task, TimerHandle};
#[cfg(feature = "async")]
pub use scheduler::TokioScheduler;
pub use session::{WeakWheel, Wheel};

/// Coarse lifecycle phase of a wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpinPhase {
    #[default]
    Idle,
    Spinning,
}

/// Result of asking the wheel to spin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpinRequest {
    /// A new spin started.
    Accepted,
    /// A spin was already in flight; the request was dropped.
    AlreadySpinning,
    /// The wheel was torn down; the request was dropped.
    Detached,
}

impl SpinRequest {
    #[must_use]
    pub const fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Side effect requested by a [`SpinMachine`] transition.
#[derive(Debug, Clone, PartialEq)]
pub enum SpinEffect {
    /// Run the commit step at the next scheduling opportunity.
    ScheduleCommit,
    /// Fire the settle timer after `delay_ms`.
    StartTimer { delay_ms: u64 },
    /// Invoke the spin-start listener.
    NotifyStart,
    /// Invoke the spin-end listener with the winner.
    NotifyEnd(SpinOutcome),
    /// Drop whatever task is still scheduled.
    CancelPending,
}

/// Effects produced by one transition; never more than two.
pub type SpinEffects = SmallVec<[SpinEffect; 2]>;

/// Completed or in-flight resolution of one spin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinRecord {
    pub outcome: SpinOutcome,
    pub plan: RotationPlan,
}

#[derive(Debug, Clone)]
struct PendingSpin {
    config: Rc<WheelConfig>,
    policy: WinnerPolicy,
    record: Option<SpinRecord>,
}

/// Pure spin state. Every transition is a no-op once torn down.
#[derive(Debug, Clone, Default)]
pub struct SpinMachine {
    phase: SpinPhase,
    rotation_degrees: f64,
    animation_suppressed: bool,
    pending: Option<PendingSpin>,
    last_record: Option<SpinRecord>,
    spins_completed: u64,
    torn_down: bool,
}

impl SpinMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn phase(&self) -> SpinPhase {
        self.phase
    }

    #[must_use]
    pub const fn is_spinning(&self) -> bool {
        matches!(self.phase, SpinPhase::Spinning)
    }

    /// True once at least one spin has finished and no other is in flight.
    /// A torn down wheel is never settled.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        !self.torn_down && !self.is_spinning() && self.last_record.is_some()
    }

    /// Rotation currently written to the wheel, in degrees.
    #[must_use]
    pub const fn rotation_degrees(&self) -> f64 {
        self.rotation_degrees
    }

    /// Whether the next render must jump instead of animating.
    #[must_use]
    pub const fn animation_suppressed(&self) -> bool {
        self.animation_suppressed
    }

    #[must_use]
    pub const fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Resolution of the in-flight spin, available from its commit step on.
    #[must_use]
    pub fn pending_record(&self) -> Option<&SpinRecord> {
        self.pending.as_ref().and_then(|p| p.record.as_ref())
    }

    /// Resolution of the most recently settled spin.
    #[must_use]
    pub const fn last_record(&self) -> Option<&SpinRecord> {
        self.last_record.as_ref()
    }

    #[must_use]
    pub const fn spins_completed(&self) -> u64 {
        self.spins_completed
    }

    /// Start a spin with `config` frozen for its whole lifetime.
    ///
    /// # Errors
    ///
    /// Returns the selection error the commit step would hit, so that an
    /// unresolvable configuration never leaves the wheel spinning.
    pub fn on_trigger_requested(
        &mut self,
        config: &Rc<WheelConfig>,
    ) -> Result<(SpinRequest, SpinEffects), SpinError> {
        if self.torn_down {
            return Ok((SpinRequest::Detached, SpinEffects::new()));
        }
        if self.is_spinning() {
            return Ok((SpinRequest::AlreadySpinning, SpinEffects::new()));
        }
        let policy = config.policy();
        check_eligible(&config.prizes, &policy)?;

        self.phase = SpinPhase::Spinning;
        self.rotation_degrees = 0.0;
        self.animation_suppressed = true;
        self.pending = Some(PendingSpin {
            config: Rc::clone(config),
            policy,
            record: None,
        });
        Ok((SpinRequest::Accepted, smallvec![SpinEffect::ScheduleCommit]))
    }

    /// Resolve the winner and rotation of the in-flight spin.
    ///
    /// # Errors
    ///
    /// Returns a [`SpinError`] if selection or planning fails; the wheel is
    /// returned to idle without any notification.
    pub fn on_commit<D: SpinDraws + ?Sized>(
        &mut self,
        draws: &mut D,
    ) -> Result<SpinEffects, SpinError> {
        if self.torn_down {
            return Ok(SpinEffects::new());
        }
        let Some(pending) = self.pending.as_ref().filter(|p| p.record.is_none()) else {
            return Ok(SpinEffects::new());
        };
        let config = Rc::clone(&pending.config);
        let policy = pending.policy.clone();

        let record = match resolve_spin(&config, &policy, self.rotation_degrees, draws) {
            Ok(record) => record,
            Err(err) => {
                self.abort();
                return Err(err);
            }
        };

        self.animation_suppressed = false;
        self.rotation_degrees = record.plan.final_rotation;
        if let Some(pending) = self.pending.as_mut() {
            pending.record = Some(record);
        }
        Ok(smallvec![
            SpinEffect::StartTimer {
                delay_ms: config.animation_duration_in_ms,
            },
            SpinEffect::NotifyStart,
        ])
    }

    /// Settle the in-flight spin.
    pub fn on_timer_fired(&mut self) -> SpinEffects {
        if self.torn_down || !self.is_spinning() {
            return SpinEffects::new();
        }
        let Some(record) = self.pending.as_mut().and_then(|p| p.record.take()) else {
            return SpinEffects::new();
        };
        self.pending = None;
        self.phase = SpinPhase::Idle;
        self.spins_completed += 1;
        let outcome = record.outcome.clone();
        self.last_record = Some(record);
        smallvec![SpinEffect::NotifyEnd(outcome)]
    }

    /// Detach the wheel. Any in-flight spin is abandoned silently.
    pub fn on_torn_down(&mut self) -> SpinEffects {
        if self.torn_down {
            return SpinEffects::new();
        }
        self.torn_down = true;
        let was_spinning = self.is_spinning();
        self.abort();
        if was_spinning {
            smallvec![SpinEffect::CancelPending]
        } else {
            SpinEffects::new()
        }
    }

    fn abort(&mut self) {
        self.pending = None;
        self.phase = SpinPhase::Idle;
        self.animation_suppressed = false;
    }
}

fn resolve_spin<D: SpinDraws + ?Sized>(
    config: &WheelConfig,
    policy: &WinnerPolicy,
    previous_rotation: f64,
    draws: &mut D,
) -> Result<SpinRecord, SpinError> {
    let outcome = select(&config.prizes, policy, draws.selection())?;
    let plan = plan_rotation(
        outcome.index,
        config.prizes.len(),
        config.wheel_rotations_count,
        previous_rotation,
        draws.offset(),
    )?;
    Ok(SpinRecord { outcome, plan })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prize::{Prize, PrizeColor};
    use crate::random::DrawFn;

    fn config(keys: &[&str]) -> Rc<WheelConfig> {
        let prizes = keys
            .iter()
            .map(|key| Prize::new(*key, PrizeColor::parse("#123456").unwrap()))
            .collect();
        Rc::new(
            WheelConfig::from_prizes(prizes)
                .unwrap()
                .with_animation_duration_ms(2_000),
        )
    }

    #[test]
    fn trigger_resets_and_schedules_commit() {
        let mut machine = SpinMachine::new();
        let (request, effects) = machine.on_trigger_requested(&config(&["a", "b"])).unwrap();
        assert_eq!(request, SpinRequest::Accepted);
        assert_eq!(effects.as_slice(), &[SpinEffect::ScheduleCommit]);
        assert!(machine.is_spinning());
        assert!(machine.animation_suppressed());
        assert!(machine.rotation_degrees().abs() < f64::EPSILON);
        assert!(machine.pending_record().is_none());
    }

    #[test]
    fn second_trigger_is_ignored_while_spinning() {
        let mut machine = SpinMachine::new();
        let cfg = config(&["a", "b"]);
        machine.on_trigger_requested(&cfg).unwrap();
        let (request, effects) = machine.on_trigger_requested(&cfg).unwrap();
        assert_eq!(request, SpinRequest::AlreadySpinning);
        assert!(effects.is_empty());
    }

    #[test]
    fn commit_writes_rotation_then_notifies() {
        let mut machine = SpinMachine::new();
        machine.on_trigger_requested(&config(&["a", "b", "c", "d"])).unwrap();
        let effects = machine.on_commit(&mut DrawFn(|| 0.5)).unwrap();
        assert_eq!(
            effects.as_slice(),
            &[
                SpinEffect::StartTimer { delay_ms: 2_000 },
                SpinEffect::NotifyStart
            ]
        );
        assert!(!machine.animation_suppressed());
        let record = machine.pending_record().unwrap().clone();
        assert_eq!(record.outcome.index, 2);
        assert!((machine.rotation_degrees() - record.plan.final_rotation).abs() < f64::EPSILON);

        // A duplicate commit is stale.
        assert!(machine.on_commit(&mut DrawFn(|| 0.0)).unwrap().is_empty());
    }

    #[test]
    fn timer_settles_and_reports_winner() {
        let mut machine = SpinMachine::new();
        machine.on_trigger_requested(&config(&["a", "b"])).unwrap();
        machine.on_commit(&mut DrawFn(|| 0.9)).unwrap();
        let effects = machine.on_timer_fired();
        let [SpinEffect::NotifyEnd(outcome)] = effects.as_slice() else {
            panic!("expected a single end notification, got {effects:?}");
        };
        assert_eq!(outcome.prize.key, "b");
        assert_eq!(machine.phase(), SpinPhase::Idle);
        assert!(machine.is_settled());
        assert_eq!(machine.spins_completed(), 1);
        assert!(machine.on_timer_fired().is_empty());
    }

    #[test]
    fn unknown_fixed_key_is_rejected_at_trigger() {
        let mut machine = SpinMachine::new();
        let cfg = Rc::new(
            WheelConfig::clone(&config(&["a"])).with_default_winner("missing"),
        );
        let err = machine.on_trigger_requested(&cfg).unwrap_err();
        assert_eq!(
            err,
            SpinError::NotFound {
                key: "missing".into()
            }
        );
        assert_eq!(machine.phase(), SpinPhase::Idle);
    }

    #[test]
    fn empty_catalog_is_rejected_at_trigger() {
        let mut machine = SpinMachine::new();
        let cfg = Rc::new(WheelConfig::default());
        assert_eq!(
            machine.on_trigger_requested(&cfg).unwrap_err(),
            SpinError::EmptyCatalog
        );
    }

    #[test]
    fn teardown_cancels_and_freezes() {
        let mut machine = SpinMachine::new();
        let cfg = config(&["a", "b"]);
        machine.on_trigger_requested(&cfg).unwrap();
        machine.on_commit(&mut DrawFn(|| 0.2)).unwrap();
        assert_eq!(
            machine.on_torn_down().as_slice(),
            &[SpinEffect::CancelPending]
        );
        assert!(machine.on_timer_fired().is_empty());
        assert!(machine.on_torn_down().is_empty());
        let (request, effects) = machine.on_trigger_requested(&cfg).unwrap();
        assert_eq!(request, SpinRequest::Detached);
        assert!(effects.is_empty());
        assert_eq!(machine.spins_completed(), 0);
    }

    #[test]
    fn teardown_after_a_finished_spin_is_not_settled() {
        let mut machine = SpinMachine::new();
        let cfg = config(&["a", "b"]);
        machine.on_trigger_requested(&cfg).unwrap();
        machine.on_commit(&mut DrawFn(|| 0.1)).unwrap();
        machine.on_timer_fired();
        assert!(machine.is_settled());

        machine.on_trigger_requested(&cfg).unwrap();
        machine.on_commit(&mut DrawFn(|| 0.8)).unwrap();
        machine.on_torn_down();
        assert!(!machine.is_settled());
        assert!(!machine.is_spinning());
        assert_eq!(machine.spins_completed(), 1);
        assert_eq!(machine.last_record().unwrap().outcome.prize.key, "a");
    }

    #[test]
    fn idle_teardown_has_nothing_to_cancel() {
        let mut machine = SpinMachine::new();
        assert!(machine.on_torn_down().is_empty());
        assert!(machine.is_torn_down());
    }

    #[test]
    fn consecutive_spins_start_from_zero() {
        let mut machine = SpinMachine::new();
        let cfg = config(&["a", "b", "c"]);
        let mut rotations = Vec::new();
        for _ in 0..2 {
            machine.on_trigger_requested(&cfg).unwrap();
            assert!(machine.rotation_degrees().abs() < f64::EPSILON);
            machine.on_commit(&mut DrawFn(|| 0.4)).unwrap();
            rotations.push(machine.rotation_degrees());
            machine.on_timer_fired();
        }
        assert!((rotations[0] - rotations[1]).abs() < f64::EPSILON);
        assert_eq!(machine.spins_completed(), 2);
    }
}
