//! Wheel instance binding the spin machine to a scheduler and listeners.
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::config::{WheelConfig, WheelConfigError};
use crate::constants::COMMIT_DELAY_MS;
use crate::error::SpinError;
use crate::layout::WheelFrame;
use crate::prize::Prize;
use crate::random::{SpinDraws, SpinRng};

use super::scheduler::{Scheduler, TimerHandle};
use super::{SpinEffect, SpinEffects, SpinMachine, SpinPhase, SpinRecord, SpinRequest};

type StartListener = Box<dyn FnMut()>;
type EndListener = Box<dyn FnMut(&Prize)>;

struct WheelInner<S: Scheduler> {
    machine: RefCell<SpinMachine>,
    config: RefCell<Rc<WheelConfig>>,
    draws: RefCell<Box<dyn SpinDraws>>,
    scheduler: S,
    pending: RefCell<Option<S::Handle>>,
    on_start: RefCell<Option<StartListener>>,
    on_end: RefCell<Option<EndListener>>,
}

impl<S: Scheduler> Drop for WheelInner<S> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.get_mut().take() {
            handle.cancel();
        }
    }
}

/// A mounted wheel.
///
/// Clones share the same instance. Scheduled work holds only weak
/// references, so dropping the last handle tears the wheel down and no
/// notification fires afterwards. Listeners that need the wheel should
/// capture a [`WeakWheel`] to avoid a reference cycle.
pub struct Wheel<S: Scheduler + 'static> {
    inner: Rc<WheelInner<S>>,
}

impl<S: Scheduler + 'static> Clone for Wheel<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: Scheduler + 'static> std::fmt::Debug for Wheel<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let machine = self.inner.machine.borrow();
        f.debug_struct("Wheel")
            .field("phase", &machine.phase())
            .field("rotation_degrees", &machine.rotation_degrees())
            .field("spins_completed", &machine.spins_completed())
            .finish_non_exhaustive()
    }
}

impl<S: Scheduler + 'static> Wheel<S> {
    /// Mount a wheel drawing from operating-system entropy.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn new(config: WheelConfig, scheduler: S) -> Result<Self, WheelConfigError> {
        Self::with_draws(config, scheduler, SpinRng::from_entropy())
    }

    /// Mount a wheel drawing from a seeded RNG bundle.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn with_seed(config: WheelConfig, scheduler: S, seed: u64) -> Result<Self, WheelConfigError> {
        Self::with_draws(config, scheduler, SpinRng::from_user_seed(seed))
    }

    /// Mount a wheel drawing from `draws`.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn with_draws(
        config: WheelConfig,
        scheduler: S,
        draws: impl SpinDraws + 'static,
    ) -> Result<Self, WheelConfigError> {
        config.validate()?;
        log::debug!(
            "mounting wheel with {} prizes ({} policy)",
            config.prizes.len(),
            config.policy().label()
        );
        Ok(Self {
            inner: Rc::new(WheelInner {
                machine: RefCell::new(SpinMachine::new()),
                config: RefCell::new(Rc::new(config)),
                draws: RefCell::new(Box::new(draws)),
                scheduler,
                pending: RefCell::new(None),
                on_start: RefCell::new(None),
                on_end: RefCell::new(None),
            }),
        })
    }

    /// Register the listener fired when a spin's animation begins. Replaces
    /// any earlier listener.
    pub fn on_spin_start(&self, listener: impl FnMut() + 'static) {
        *self.inner.on_start.borrow_mut() = Some(Box::new(listener));
    }

    /// Register the listener fired with the winner once a spin settles.
    /// Replaces any earlier listener.
    pub fn on_spin_end(&self, listener: impl FnMut(&Prize) + 'static) {
        *self.inner.on_end.borrow_mut() = Some(Box::new(listener));
    }

    /// Request a spin.
    ///
    /// Returns [`SpinRequest::AlreadySpinning`] while a spin is in flight and
    /// [`SpinRequest::Detached`] after teardown; neither changes any state.
    ///
    /// # Errors
    ///
    /// Returns a [`SpinError`] when the current configuration cannot produce
    /// a winner. The wheel stays idle and no notification fires.
    pub fn spin(&self) -> Result<SpinRequest, SpinError> {
        let config = Rc::clone(&self.inner.config.borrow());
        let result = self.inner.machine.borrow_mut().on_trigger_requested(&config);
        let (request, effects) = result.inspect_err(|err| {
            log::error!("spin rejected: {err}");
        })?;
        match request {
            SpinRequest::Accepted => log::debug!("spin accepted"),
            SpinRequest::AlreadySpinning => log::debug!("spin ignored; already spinning"),
            SpinRequest::Detached => log::warn!("spin ignored; wheel torn down"),
        }
        self.apply(effects);
        Ok(request)
    }

    /// Replace the configuration used by future spins. A spin in flight keeps
    /// the configuration it started with.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation; the previous
    /// configuration stays in force.
    pub fn update_config(&self, config: WheelConfig) -> Result<(), WheelConfigError> {
        config.validate()?;
        *self.inner.config.borrow_mut() = Rc::new(config);
        Ok(())
    }

    /// Configuration future spins will use.
    #[must_use]
    pub fn config(&self) -> Rc<WheelConfig> {
        Rc::clone(&self.inner.config.borrow())
    }

    /// Replace the random draws used by future commit steps.
    pub fn set_draws(&self, draws: impl SpinDraws + 'static) {
        *self.inner.draws.borrow_mut() = Box::new(draws);
    }

    /// What the presentation layer should render right now.
    #[must_use]
    pub fn frame(&self) -> WheelFrame {
        let machine = self.inner.machine.borrow();
        let config = self.inner.config.borrow();
        WheelFrame::new(
            machine.rotation_degrees(),
            !machine.animation_suppressed(),
            config.transition_secs(),
            config.wheel_border_color.clone(),
        )
    }

    #[must_use]
    pub fn phase(&self) -> SpinPhase {
        self.inner.machine.borrow().phase()
    }

    #[must_use]
    pub fn is_spinning(&self) -> bool {
        self.inner.machine.borrow().is_spinning()
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.inner.machine.borrow().is_settled()
    }

    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.inner.machine.borrow().is_torn_down()
    }

    /// Resolution of the spin in flight, once committed.
    #[must_use]
    pub fn pending_record(&self) -> Option<SpinRecord> {
        self.inner.machine.borrow().pending_record().cloned()
    }

    #[must_use]
    pub fn last_record(&self) -> Option<SpinRecord> {
        self.inner.machine.borrow().last_record().cloned()
    }

    #[must_use]
    pub fn spins_completed(&self) -> u64 {
        self.inner.machine.borrow().spins_completed()
    }

    /// Detach the wheel. Pending work is cancelled, listeners are released
    /// and later spin requests are ignored.
    pub fn teardown(&self) {
        let effects = self.inner.machine.borrow_mut().on_torn_down();
        self.apply(effects);
        let start = self.inner.on_start.borrow_mut().take();
        let end = self.inner.on_end.borrow_mut().take();
        drop((start, end));
        log::debug!("wheel torn down");
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakWheel<S> {
        WeakWheel {
            inner: Rc::downgrade(&self.inner),
        }
    }

    fn apply(&self, effects: SpinEffects) {
        for effect in effects {
            match effect {
                SpinEffect::ScheduleCommit => {
                    self.schedule(COMMIT_DELAY_MS, Self::commit);
                }
                SpinEffect::StartTimer { delay_ms } => {
                    self.schedule(delay_ms, Self::settle);
                }
                SpinEffect::NotifyStart => self.notify_start(),
                SpinEffect::NotifyEnd(outcome) => self.notify_end(&outcome.prize),
                SpinEffect::CancelPending => {
                    let handle = self.inner.pending.borrow_mut().take();
                    if let Some(handle) = handle {
                        handle.cancel();
                    }
                }
            }
        }
    }

    fn schedule(&self, delay_ms: u64, step: fn(&Self)) {
        let weak = Rc::downgrade(&self.inner);
        let handle = self.inner.scheduler.schedule(
            delay_ms,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    step(&Self { inner });
                }
            }),
        );
        let previous = self.inner.pending.borrow_mut().replace(handle);
        if let Some(previous) = previous {
            previous.cancel();
        }
    }

    fn commit(&self) {
        // The handle belongs to the task now running.
        drop(self.inner.pending.borrow_mut().take());
        let result = {
            let mut draws = self.inner.draws.borrow_mut();
            self.inner.machine.borrow_mut().on_commit(&mut **draws)
        };
        match result {
            Ok(effects) => self.apply(effects),
            Err(err) => log::error!("spin aborted during commit: {err}"),
        }
    }

    fn settle(&self) {
        drop(self.inner.pending.borrow_mut().take());
        let effects = self.inner.machine.borrow_mut().on_timer_fired();
        self.apply(effects);
    }

    fn notify_start(&self) {
        // Take the listener out so it may call back into the wheel.
        let listener = self.inner.on_start.borrow_mut().take();
        if let Some(mut listener) = listener {
            listener();
            let mut slot = self.inner.on_start.borrow_mut();
            if slot.is_none() && !self.inner.machine.borrow().is_torn_down() {
                *slot = Some(listener);
            }
        }
    }

    fn notify_end(&self, prize: &Prize) {
        log::info!("spin landed on {}", prize.key);
        let listener = self.inner.on_end.borrow_mut().take();
        if let Some(mut listener) = listener {
            listener(prize);
            let mut slot = self.inner.on_end.borrow_mut();
            if slot.is_none() && !self.inner.machine.borrow().is_torn_down() {
                *slot = Some(listener);
            }
        }
    }
}

/// Non-owning reference to a [`Wheel`].
pub struct WeakWheel<S: Scheduler + 'static> {
    inner: Weak<WheelInner<S>>,
}

impl<S: Scheduler + 'static> Clone for WeakWheel<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<S: Scheduler + 'static> WeakWheel<S> {
    #[must_use]
    pub fn upgrade(&self) -> Option<Wheel<S>> {
        self.inner.upgrade().map(|inner| Wheel { inner })
    }
}
