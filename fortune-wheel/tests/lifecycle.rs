use std::cell::RefCell;
use std::rc::Rc;

use fortune_wheel::{
    DrawFn, ManualScheduler, Preset, Prize, PrizeColor, SpinError, SpinPhase, SpinRequest,
    SpinRng, Wheel, WheelConfig, landing_index, safe_zone,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Start,
    End(String),
}

fn recorded(wheel: &Wheel<ManualScheduler>) -> Rc<RefCell<Vec<Event>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    wheel.on_spin_start(move || sink.borrow_mut().push(Event::Start));
    let sink = Rc::clone(&events);
    wheel.on_spin_end(move |prize| sink.borrow_mut().push(Event::End(prize.key.clone())));
    events
}

fn ten_segment_config() -> WheelConfig {
    let color = PrizeColor::parse("hsl(200, 50%, 50%)").expect("valid color");
    let prizes = (0..10)
        .map(|i| Prize::new(format!("segment {i}"), color.clone()))
        .collect();
    WheelConfig::from_prizes(prizes)
        .expect("valid catalog")
        .with_animation_duration_ms(5_000)
        .with_rotations(5)
        .with_default_winner("segment 3")
}

#[test]
fn fixed_winner_on_ten_segments() {
    let scheduler = ManualScheduler::new();
    let wheel =
        Wheel::with_draws(ten_segment_config(), scheduler.clone(), DrawFn(|| 0.5)).unwrap();
    let events = recorded(&wheel);

    assert_eq!(wheel.spin().unwrap(), SpinRequest::Accepted);
    assert!(events.borrow().is_empty());

    scheduler.advance(0);
    assert_eq!(*events.borrow(), vec![Event::Start]);
    let frame = wheel.frame();
    assert!((frame.rotation_degrees + 1926.0).abs() < 1e-9);
    assert_eq!(frame.transform_css(), "rotate(-1926deg)");
    assert_eq!(frame.transition_css(), "transform 5s ease-out");

    scheduler.advance(4_999);
    assert_eq!(events.borrow().len(), 1);
    assert!(wheel.is_spinning());

    scheduler.advance(1);
    assert_eq!(
        *events.borrow(),
        vec![Event::Start, Event::End("segment 3".into())]
    );
    assert_eq!(wheel.phase(), SpinPhase::Idle);
    assert!(wheel.is_settled());

    let record = wheel.last_record().unwrap();
    let zone = safe_zone(3, 10).unwrap();
    assert!(zone.contains(record.plan.target_angle));
    assert_eq!(landing_index(record.plan.final_rotation, 10), Some(3));
}

#[test]
fn rapid_triggers_produce_one_spin() {
    let scheduler = ManualScheduler::new();
    let config = Preset::CashPrizes.load().unwrap();
    let wheel = Wheel::with_seed(config, scheduler.clone(), 42).unwrap();
    let events = recorded(&wheel);

    assert_eq!(wheel.spin().unwrap(), SpinRequest::Accepted);
    for _ in 0..5 {
        assert_eq!(wheel.spin().unwrap(), SpinRequest::AlreadySpinning);
    }
    scheduler.advance(0);
    assert_eq!(wheel.spin().unwrap(), SpinRequest::AlreadySpinning);
    scheduler.run_until_idle();

    let events = events.borrow();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], Event::Start);
    assert!(matches!(events[1], Event::End(_)));
    assert_eq!(wheel.spins_completed(), 1);
}

#[test]
fn teardown_mid_spin_suppresses_end_notification() {
    let scheduler = ManualScheduler::new();
    let config = Preset::WeightedPrizes.load().unwrap();
    let wheel = Wheel::with_seed(config, scheduler.clone(), 7).unwrap();
    let events = recorded(&wheel);

    wheel.spin().unwrap();
    scheduler.advance(0);
    scheduler.advance(2_500);
    wheel.teardown();
    assert_eq!(scheduler.pending(), 0);
    scheduler.advance(10_000);

    assert_eq!(*events.borrow(), vec![Event::Start]);
    assert!(wheel.is_torn_down());
    assert_eq!(wheel.spin().unwrap(), SpinRequest::Detached);
    assert_eq!(scheduler.pending(), 0);
}

#[test]
fn teardown_during_second_spin_leaves_wheel_unsettled() {
    let scheduler = ManualScheduler::new();
    let config = Preset::CashPrizes.load().unwrap();
    let wheel = Wheel::with_seed(config, scheduler.clone(), 31).unwrap();
    let events = recorded(&wheel);

    wheel.spin().unwrap();
    scheduler.run_until_idle();
    assert!(wheel.is_settled());

    wheel.spin().unwrap();
    scheduler.advance(0);
    scheduler.advance(100);
    wheel.teardown();

    assert!(!wheel.is_settled());
    assert!(!wheel.is_spinning());
    assert_eq!(wheel.spins_completed(), 1);
    let events = events.borrow();
    assert_eq!(events.len(), 3);
    assert_eq!(events[2], Event::Start);
}

#[test]
fn uniform_spins_on_ten_segments_land_on_the_reported_prize() {
    let scheduler = ManualScheduler::new();
    let config = Preset::CashPrizes.load().unwrap();
    assert_eq!(config.prizes.len(), 10);
    assert_eq!(config.wheel_rotations_count, 5);
    assert!(config.default_winner_key.is_empty());
    assert!(!config.use_probabilities_to_calculate_winner);
    let catalog = config.prizes.clone();
    let wheel = Wheel::with_seed(config, scheduler.clone(), 0x10_5E9).unwrap();
    let ended = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&ended);
    wheel.on_spin_end(move |prize| sink.borrow_mut().push(prize.key.clone()));

    for spin in 0..500 {
        wheel.spin().unwrap();
        scheduler.run_until_idle();
        let record = wheel.last_record().unwrap();
        let magnitude = -record.plan.final_rotation;
        assert!(
            magnitude > 1800.0 && magnitude < 2160.0,
            "spin {spin}: rotation {} outside five to six turns",
            record.plan.final_rotation
        );
        let delivered = ended.borrow()[spin].clone();
        assert_eq!(
            landing_index(record.plan.final_rotation, 10),
            catalog.position(&delivered),
            "spin {spin} landed away from {delivered}"
        );
    }
    assert_eq!(wheel.spins_completed(), 500);
}

#[test]
fn teardown_before_commit_suppresses_everything() {
    let scheduler = ManualScheduler::new();
    let config = Preset::CashPrizes.load().unwrap();
    let wheel = Wheel::with_seed(config, scheduler.clone(), 1).unwrap();
    let events = recorded(&wheel);

    wheel.spin().unwrap();
    wheel.teardown();
    scheduler.run_until_idle();
    assert!(events.borrow().is_empty());
}

#[test]
fn unknown_fixed_key_is_an_error_without_notifications() {
    let scheduler = ManualScheduler::new();
    let config = ten_segment_config().with_default_winner("jackpot");
    let wheel = Wheel::with_seed(config, scheduler.clone(), 5).unwrap();
    let events = recorded(&wheel);

    assert_eq!(
        wheel.spin(),
        Err(SpinError::NotFound {
            key: "jackpot".into()
        })
    );
    assert_eq!(scheduler.pending(), 0);
    assert!(!wheel.is_spinning());
    assert!(events.borrow().is_empty());
}

#[test]
fn all_zero_weights_fail_weighted_spin() {
    let json = r##"{
        "prizes": [
            {"key": "a", "color": "#fff", "probability": 0},
            {"key": "b", "color": "#000"}
        ],
        "useProbabilitiesToCalculateWinner": true
    }"##;
    let wheel = Wheel::with_seed(
        WheelConfig::from_json(json).unwrap(),
        ManualScheduler::new(),
        9,
    )
    .unwrap();
    assert_eq!(wheel.spin(), Err(SpinError::NoEligibleSegment));
}

#[test]
fn empty_catalog_fails_to_spin() {
    let wheel = Wheel::with_seed(WheelConfig::default(), ManualScheduler::new(), 3).unwrap();
    assert_eq!(wheel.spin(), Err(SpinError::EmptyCatalog));
}

#[test]
fn zero_rotations_settle_within_one_turn() {
    let scheduler = ManualScheduler::new();
    let config = Preset::CashPrizes.load().unwrap().with_rotations(0);
    let mut rng = ChaCha20Rng::seed_from_u64(8);
    let draws = DrawFn(move || rng.r#gen::<f64>());
    let wheel = Wheel::with_draws(config, scheduler.clone(), draws).unwrap();
    for _ in 0..20 {
        wheel.spin().unwrap();
        scheduler.advance(0);
        let rotation = wheel.frame().rotation_degrees;
        assert!(rotation < 0.0 && rotation > -360.0);
        scheduler.run_until_idle();
    }
    assert_eq!(wheel.spins_completed(), 20);
}

#[test]
fn seeded_wheels_replay_identically() {
    let run = |seed| {
        let scheduler = ManualScheduler::new();
        let config = Preset::WeightedPrizes.load().unwrap();
        let wheel = Wheel::with_draws(config, scheduler.clone(), SpinRng::from_user_seed(seed))
            .unwrap();
        let mut winners = Vec::new();
        for _ in 0..25 {
            wheel.spin().unwrap();
            scheduler.run_until_idle();
            winners.push(wheel.last_record().unwrap().outcome.prize.key);
        }
        winners
    };
    assert_eq!(run(2024), run(2024));
}
