// Round-level properties, native and deterministic: every test drives the
// round with explicit timestamps and a seeded rng.

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use whack_a_croc::config::GameConfig;
use whack_a_croc::grid::Grid;
use whack_a_croc::round::{ClickOutcome, Round, RoundEvent};
use whack_a_croc::session::RoundPhase;
use whack_a_croc::timer::TaskKey;

fn four_cell_round(config: GameConfig, seed: u64) -> Round<StdRng> {
    Round::new(
        config,
        Grid::tiled(80.0, 80.0, 40.0, 2, 4),
        StdRng::seed_from_u64(seed),
    )
}

fn no_autospawn() -> GameConfig {
    GameConfig {
        first_spawn_delay_ms: 1.0e9,
        ..GameConfig::default()
    }
}

fn assert_links_hold(round: &Round<StdRng>) {
    let grid = round.grid();
    assert!(grid.occupied_count() <= grid.len());
    assert_eq!(grid.occupied_count(), round.targets().len());
    for target in round.targets() {
        assert_eq!(grid.cell(target.cell).unwrap().occupant(), Some(target.id));
    }
}

#[test]
fn clicking_cell_two_scores_and_frees_it() {
    let mut round = four_cell_round(no_autospawn(), 1);
    round.start(0.0);
    let id = round.place_target(2, 2000.0, 0.0).unwrap();
    assert_eq!(round.grid().cell(2).unwrap().occupant(), Some(id));

    let center = round.grid().cell(2).unwrap().center;
    let outcome = round.click(center, 300.0);

    assert_eq!(
        outcome,
        ClickOutcome::Hit {
            target: id,
            position: center
        }
    );
    assert_eq!(round.session().score(), 10);
    assert_eq!(round.session().coins(), 1);
    assert!(!round.grid().cell(2).unwrap().is_occupied());
    assert!(round.targets().is_empty());
}

#[test]
fn paused_target_expires_after_exactly_its_remainder() {
    let mut round = four_cell_round(no_autospawn(), 2);
    round.start(0.0);
    let id = round.place_target(0, 2000.0, 0.0).unwrap();

    round.pause(1_500.0);
    assert_relative_eq!(round.target(id).unwrap().remaining_ms().unwrap(), 500.0);

    // a long pause changes nothing
    round.advance(60_000.0);
    assert!(round.target(id).is_some());

    round.resume(100_000.0);
    assert_eq!(round.target(id).unwrap().remaining_ms(), None);
    round.advance(100_499.0);
    assert!(round.target(id).is_some());
    round.advance(100_500.0);
    assert!(round.target(id).is_none());
    assert!(round
        .drain_events()
        .contains(&RoundEvent::Expired { target: id, cell: 0 }));
}

#[test]
fn pause_resume_without_delay_keeps_every_deadline() {
    let mut round = four_cell_round(no_autospawn(), 3);
    round.start(0.0);
    let dwells = [3000.0, 2200.0, 2700.0, 3900.0];
    let ids: Vec<_> = dwells
        .iter()
        .enumerate()
        .map(|(cell, dwell)| round.place_target(cell, *dwell, cell as f64 * 100.0).unwrap())
        .collect();

    let before: Vec<f64> = ids
        .iter()
        .map(|id| round.tasks().deadline(TaskKey::Expire(*id)).unwrap())
        .collect();

    round.pause(1_000.0);
    round.resume(1_000.0);

    let after: Vec<f64> = ids
        .iter()
        .map(|id| round.tasks().deadline(TaskKey::Expire(*id)).unwrap())
        .collect();
    assert_eq!(before, after);

    // and they come out in that order
    round.drain_events();
    round.advance(10_000.0);
    let expired: Vec<_> = round
        .drain_events()
        .into_iter()
        .filter_map(|event| match event {
            RoundEvent::Expired { target, .. } => Some(target),
            _ => None,
        })
        // later spawns refill freed cells, only the original four count here
        .filter(|target| ids.contains(target))
        .collect();
    let mut by_deadline: Vec<_> = ids.iter().copied().zip(before).collect();
    by_deadline.sort_by(|a, b| a.1.total_cmp(&b.1));
    let expected: Vec<_> = by_deadline.into_iter().map(|(id, _)| id).collect();
    assert_eq!(expired, expected);
}

#[test]
fn sixty_ticks_end_the_round_once() {
    let mut round = four_cell_round(GameConfig::default(), 4);
    round.start(0.0);
    for second in 1..=59 {
        round.advance(second as f64 * 1000.0);
        assert_eq!(round.session().time_left(), 60 - second);
        assert_eq!(round.phase(), RoundPhase::Running);
    }
    round.advance(60_000.0);
    round.advance(61_000.0);
    round.advance(120_000.0);

    let ends = round
        .drain_events()
        .into_iter()
        .filter(|event| matches!(event, RoundEvent::Ended { .. }))
        .count();
    assert_eq!(ends, 1);
    assert_eq!(round.session().time_left(), 0);
    assert_eq!(round.phase(), RoundPhase::Ended);
    assert!(round.targets().is_empty());
    assert!(round.tasks().is_empty());
    assert_eq!(round.grid().occupied_count(), 0);
}

#[test]
fn pausing_stops_the_clock() {
    let mut round = four_cell_round(no_autospawn(), 5);
    round.start(0.0);
    round.advance(2_500.0);
    assert_eq!(round.session().time_left(), 58);
    round.pause(2_500.0);
    round.advance(30_000.0);
    assert_eq!(round.session().time_left(), 58);
    round.resume(30_000.0);
    round.advance(31_000.0);
    assert_eq!(round.session().time_left(), 57);
}

#[test]
fn double_hit_scores_once() {
    let mut round = four_cell_round(no_autospawn(), 6);
    round.start(0.0);
    round.place_target(1, 2000.0, 0.0).unwrap();
    let center = round.grid().cell(1).unwrap().center;

    assert!(matches!(round.click(center, 10.0), ClickOutcome::Hit { .. }));
    assert_eq!(round.click(center, 20.0), ClickOutcome::Miss);
    assert_eq!(round.session().score(), 10);
    assert_eq!(round.session().coins(), 1);

    // its old expiry is gone, nothing fires for it later
    round.drain_events();
    round.advance(2_500.0);
    assert!(!round
        .drain_events()
        .iter()
        .any(|event| matches!(event, RoundEvent::Expired { .. })));
}

#[test]
fn misses_leave_score_alone() {
    let mut round = four_cell_round(no_autospawn(), 7);
    round.start(0.0);
    round.place_target(0, 2000.0, 0.0).unwrap();
    // target size 60 on an 80x80 canvas, the far corner is out of reach
    let outcome = round.click(whack_a_croc::engine::Point::new(500.0, 500.0), 10.0);
    assert_eq!(outcome, ClickOutcome::Miss);
    assert_eq!(round.session().score(), 0);
    assert_eq!(round.session().coins(), 0);
    assert_eq!(round.targets().len(), 1);
}

#[test]
fn clicks_outside_a_round_are_ignored() {
    let mut round = four_cell_round(no_autospawn(), 8);
    let center = round.grid().cell(0).unwrap().center;
    assert_eq!(round.click(center, 0.0), ClickOutcome::Ignored);
    assert_eq!(round.place_target(0, 1000.0, 0.0), None);
}

#[test]
fn spawning_keeps_its_cadence_when_the_pond_is_full() {
    let config = GameConfig {
        first_spawn_delay_ms: 0.0,
        dwell_ms: whack_a_croc::config::MsRange::new(1.0e7, 1.0e7),
        ..GameConfig::default()
    };
    let mut round = four_cell_round(config, 9);
    round.start(0.0);
    round.advance(20_000.0);

    assert_eq!(round.targets().len(), 4);
    assert!(round.tasks().contains(TaskKey::Spawn));
    assert_links_hold(&round);
}

#[test]
fn random_play_never_breaks_cell_links() {
    let config = GameConfig {
        round_seconds: 30,
        first_spawn_delay_ms: 0.0,
        ..GameConfig::default()
    };
    let mut round = Round::new(
        config,
        Grid::tiled(200.0, 120.0, 40.0, 5, 15),
        StdRng::seed_from_u64(10),
    );
    let mut player = StdRng::seed_from_u64(11);
    round.start(0.0);

    let mut now = 0.0;
    let mut hits = 0;
    while round.phase() != RoundPhase::Ended {
        now += player.gen_range(10.0..400.0);
        match player.gen_range(0..10) {
            0 => {
                round.toggle_pause(now);
            }
            1..=6 => {
                if let Some(target) = round.targets().first() {
                    let position = target.position;
                    if matches!(round.click(position, now), ClickOutcome::Hit { .. }) {
                        hits += 1;
                    }
                }
            }
            _ => round.advance(now),
        }
        if round.phase() == RoundPhase::Paused && player.gen_bool(0.5) {
            round.resume(now);
        }
        assert_links_hold(&round);
        assert!(round.session().time_left() <= 30);
    }

    assert_eq!(round.session().score(), hits * 10);
    assert_eq!(round.session().coins(), hits);
}

#[test]
fn reset_mid_round_leaves_no_stale_work() {
    let mut round = four_cell_round(GameConfig::default(), 12);
    round.start(0.0);
    round.advance(5_000.0);
    round.pause(5_100.0);
    round.reset();

    assert_eq!(round.phase(), RoundPhase::Idle);
    assert!(round.tasks().is_empty());
    round.drain_events();
    round.advance(1.0e9);
    assert!(round.drain_events().is_empty());
    assert_eq!(round.session().time_left(), 60);
}
