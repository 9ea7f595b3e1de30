//! End-to-end behaviour of the simulation and replay pipeline.

use std::collections::BTreeMap;

use proptest::prelude::*;

use enclosure::core::rect::{tile_of, Rect};
use enclosure::game::collision::EPSILON;
use enclosure::game::events::{CollisionKind, WallEventKind};
use enclosure::game::grid::Tile;
use enclosure::game::tick::run_script;
use enclosure::game::wall::Direction;
use enclosure::replay::ValidationError;
use enclosure::{
    validate_level, LevelSetup, PlacementRequest, Replay, ReplayRecorder, SimConfig, Simulation,
};

fn sim() -> Simulation {
    Simulation::new(SimConfig::default())
}

/// Tiles under the epsilon-inset corners of every ball.
fn ball_corner_tiles(sim: &Simulation) -> Vec<(i32, i32)> {
    let size = sim.config().ball_size;
    sim.balls()
        .iter()
        .flat_map(|b| {
            let (l, r) = (tile_of(b.x + EPSILON), tile_of(b.x + size - EPSILON));
            let (t, bt) = (tile_of(b.y + EPSILON), tile_of(b.y + size - EPSILON));
            [(l, t), (r, t), (l, bt), (r, bt)]
        })
        .collect()
}

// =============================================================================
// CONCRETE SCENARIOS
// =============================================================================

#[test]
fn test_scenario_free_ball_single_tick() {
    let mut s = sim();
    let id = s.add_ball(10.0, 10.0, 1.0, 1.0).unwrap();
    let result = s.tick(&[]);

    let ball = result.balls.iter().find(|b| b.id == id).unwrap();
    assert_eq!((ball.x, ball.y), (10.125, 10.125));
    assert_eq!((ball.vx, ball.vy), (0.125, 0.125));
}

#[test]
fn test_scenario_left_border_reflection() {
    let mut s = sim();
    let id = s.add_ball(1.5, 10.0, -1.0, 0.0).unwrap();
    for _ in 0..20 {
        s.tick(&[]);
    }
    assert!(s.ball(id).unwrap().vx > 0.0);
}

#[test]
fn test_scenario_vertical_placement_creates_pair() {
    let mut s = sim();
    let result = s.tick(&[PlacementRequest::vertical(15, 10)]);

    assert_eq!(result.new_walls.len(), 2);
    let dirs: Vec<_> = result.new_walls.iter().map(|w| w.direction).collect();
    assert_eq!(dirs, vec![Direction::Up, Direction::Down]);
    assert!(result
        .new_walls
        .iter()
        .all(|w| (w.start_x, w.start_y) == (15, 10)));
}

#[test]
fn test_scenario_wall_near_border_finishes() {
    let mut s = sim();
    s.add_ball(25.1, 15.1, 1.0, -1.0).unwrap();
    s.tick(&[PlacementRequest::vertical(15, 2)]);

    let mut finished = None;
    for _ in 0..20 {
        let result = s.tick(&[]);
        if let Some(event) = result.wall_events.iter().find(|e| e.is_finish()) {
            finished = Some(*event);
            break;
        }
    }

    let event = finished.expect("wall should finish within 20 ticks");
    let WallEventKind::Finish { bounds, .. } = event.kind else {
        unreachable!()
    };
    for (x, y) in bounds.full_tiles().filter(|&(_, y)| y != 2) {
        assert_eq!(s.tiles().get(x, y), Tile::Wall, "tile ({x}, {y})");
    }
    assert_eq!(s.tiles().get(15, 1), Tile::Wall);
}

#[test]
fn test_scenario_head_on_balls_reverse() {
    let mut s = sim();
    let a = s.add_ball(10.0, 10.0, 1.0, 0.0).unwrap();
    let b = s.add_ball(12.0, 10.0, -1.0, 0.0).unwrap();

    let mut hit = false;
    for _ in 0..20 {
        let result = s.tick(&[]);
        hit |= result
            .collisions
            .iter()
            .any(|c| c.ball == a && c.kind == CollisionKind::Ball { other: b });
        if hit {
            break;
        }
    }

    assert!(hit);
    assert!(s.ball(a).unwrap().vx < 0.0);
    assert!(s.ball(b).unwrap().vx > 0.0);
}

#[test]
fn test_scenario_ball_clips_tip_and_shortens_wall() {
    let mut s = sim();
    // Falling straight down column 15 onto the up wall's tip
    let ball = s.add_ball(15.1, 2.1, 0.0, 1.0).unwrap();
    let mut script = BTreeMap::new();
    script.insert(1, vec![PlacementRequest::vertical(15, 10)]);
    let results = run_script(&mut s, &script, 40);

    let (tick, event) = results
        .iter()
        .find_map(|r| r.wall_events.iter().find(|e| e.is_finish()).map(|e| (r.tick, *e)))
        .expect("tip hit should finish the wall");
    assert_eq!(tick, 29);
    assert_eq!(s.wall(event.wall).unwrap().direction, Direction::Up);
    assert_eq!(
        event.kind,
        WallEventKind::Finish {
            bounds: Rect::new(15.0, 7.5, 1.0, 3.5),
            shortened: true,
        }
    );

    // The tip strip and the start tile shared with the down wall stay open
    assert_eq!(s.tiles().get(15, 7), Tile::Free);
    assert_eq!(s.tiles().get(15, 8), Tile::Wall);
    assert_eq!(s.tiles().get(15, 9), Tile::Wall);
    assert_eq!(s.tiles().get(15, 10), Tile::Free);
    assert!(s.ball(ball).unwrap().vy < 0.0);
}

/// A vertical pair at (10, 17) whose down half finishes on tick 10, then a
/// horizontal request at (20, 12) while the up half is still growing.
fn run_l_shape() -> (Simulation, Vec<enclosure::TickResult>) {
    let mut s = sim();
    s.add_ball(27.1, 3.1, 0.0, 1.0).unwrap();
    let mut script = BTreeMap::new();
    script.insert(1, vec![PlacementRequest::vertical(10, 17)]);
    script.insert(11, vec![PlacementRequest::horizontal(20, 12)]);
    let results = run_script(&mut s, &script, 90);
    (s, results)
}

#[test]
fn test_scenario_single_wall_joins_building_wall() {
    let (s, results) = run_l_shape();

    let down = &results[9];
    assert_eq!(down.tick, 10);
    assert_eq!(down.wall_events.len(), 1);
    assert_eq!(s.wall(down.wall_events[0].wall).unwrap().direction, Direction::Down);
    assert_eq!(s.tiles().get(10, 18), Tile::Wall);
    assert_eq!(s.tiles().get(10, 17), Tile::Free);

    // One slot left: a horizontal request beside an up wall grows left only
    let placed = &results[10];
    assert_eq!(placed.accepted, vec![PlacementRequest::horizontal(20, 12)]);
    let dirs: Vec<_> = placed.new_walls.iter().map(|w| w.direction).collect();
    assert_eq!(dirs, vec![Direction::Left]);
    assert_eq!(placed.active_walls.len(), 2);
}

#[test]
fn test_scenario_wall_stops_against_building_wall() {
    let (s, results) = run_l_shape();
    let left = results[10].new_walls[0].id;

    let (tick, event) = results
        .iter()
        .skip(10)
        .find_map(|r| r.wall_events.iter().find(|e| e.is_finish()).map(|e| (r.tick, *e)))
        .expect("left wall should reach the up wall");
    assert_eq!(tick, 84);
    assert_eq!(event.wall, left);
    assert_eq!(
        event.kind,
        WallEventKind::Finish {
            bounds: Rect::new(10.875, 12.0, 10.125, 1.0),
            shortened: false,
        }
    );

    for x in 11..=20 {
        assert_eq!(s.tiles().get(x, 12), Tile::Wall, "tile ({x}, 12)");
    }
    // The column it ran into is still growing, not yet solid
    assert_eq!(s.tiles().get(10, 12), Tile::Free);
    let up: Vec<_> = s.building_walls().map(|w| w.direction).collect();
    assert_eq!(up, vec![Direction::Up]);
}

// =============================================================================
// ENCLOSURE
// =============================================================================

/// Splits the board at column 10 with the ball on the right. The down wall
/// finishes first (tick 66), the up wall closes the column (tick 74).
fn run_split(config: SimConfig) -> (Simulation, Vec<enclosure::TickResult>) {
    let mut s = Simulation::new(config);
    s.add_ball(20.1, 10.1, 1.0, 1.0).unwrap();
    let mut script = BTreeMap::new();
    script.insert(1, vec![PlacementRequest::vertical(10, 10)]);
    let results = run_script(&mut s, &script, 90);
    (s, results)
}

#[test]
fn test_enclosure_captures_ball_free_side() {
    let (s, results) = run_split(SimConfig::default());

    let finishes: Vec<u32> = results
        .iter()
        .filter(|r| r.wall_events.iter().any(|e| e.is_finish()))
        .map(|r| r.tick)
        .collect();
    assert_eq!(finishes, vec![66, 74]);

    // First finish leaves the shared start tile open: nothing enclosed yet
    assert_eq!(results[65].captured, 0);
    assert_eq!(results[73].captured, 9 * 18);

    for y in 1..19 {
        assert_eq!(s.tiles().get(10, y), Tile::Wall);
        assert_eq!(s.tiles().get(5, y), Tile::Wall);
        assert_eq!(s.tiles().get(20, y), Tile::Free);
    }
    assert_eq!(s.fill_percent(), 33);
    assert!(!s.level_complete());
}

#[test]
fn test_fill_target_boundary_in_simulation() {
    let exact = SimConfig {
        fill_target_percent: 33,
        ..SimConfig::default()
    };
    let (s, _) = run_split(exact);
    assert!(s.level_complete());

    let above = SimConfig {
        fill_target_percent: 34,
        ..SimConfig::default()
    };
    let (s, _) = run_split(above);
    assert!(!s.level_complete());
}

// =============================================================================
// REPLAY
// =============================================================================

fn record_level(seed: u64, balls: usize, script: &BTreeMap<u32, Vec<PlacementRequest>>, ticks: u32) -> Replay {
    let config = SimConfig::default();
    let setup = LevelSetup::generate(seed, balls, &config);
    let mut rec = ReplayRecorder::new(config, &setup).unwrap();
    for _ in 0..ticks {
        let t = rec.simulation().tick_count() + 1;
        let actions = script.get(&t).cloned().unwrap_or_default();
        let result = rec.tick(&actions);
        if result.level_complete {
            break;
        }
    }
    rec.finish()
}

#[test]
fn test_replay_survives_encodings() {
    let mut script = BTreeMap::new();
    script.insert(5, vec![PlacementRequest::vertical(16, 9)]);
    script.insert(100, vec![PlacementRequest::horizontal(7, 13)]);
    let replay = record_level(2024, 4, &script, 300);

    let from_json = Replay::from_json(&replay.to_json().unwrap()).unwrap();
    let from_bytes = Replay::from_bytes(&replay.to_bytes().unwrap()).unwrap();
    assert_eq!(from_json, replay);
    assert_eq!(from_bytes, replay);

    for decoded in [from_json, from_bytes] {
        let report = validate_level(&decoded, &SimConfig::default(), 4);
        assert!(report.valid, "{:?}", report.error);
        assert_eq!(report.checkpoints_checked, 5);
    }
}

#[test]
fn test_replay_tampering_detected() {
    let script = BTreeMap::new();
    let replay = record_level(77, 2, &script, 180);

    let mut moved = replay.clone();
    moved.checkpoints[2].balls[1].y -= 0.25;
    let report = validate_level(&moved, &SimConfig::default(), 2);
    assert!(!report.valid);
    let error = report.error.unwrap();
    assert_eq!(error.tick(), Some(180));
    assert!(!error.trace().is_empty());

    let mut extra = replay.clone();
    extra.balls.push(enclosure::BallSpawn { x: 5.1, y: 5.1, dir_x: 1.0, dir_y: 1.0 });
    assert!(!validate_level(&extra, &SimConfig::default(), 2).valid);
}

#[test]
fn test_replay_under_other_rules_or_spawns_rejected() {
    let server = SimConfig::default();
    let mut script = BTreeMap::new();
    script.insert(5, vec![PlacementRequest::vertical(16, 9)]);

    // A client that lowered the fill target records a self-consistent replay
    let easy = SimConfig {
        fill_target_percent: 1,
        ..server.clone()
    };
    let setup = LevelSetup::generate(31, 2, &easy);
    let mut rec = ReplayRecorder::new(easy.clone(), &setup).unwrap();
    for t in 1..=120 {
        rec.tick(script.get(&t).map(Vec::as_slice).unwrap_or(&[]));
    }
    let replay = rec.finish();
    assert!(validate_level(&replay, &easy, 2).valid);
    assert_eq!(
        validate_level(&replay, &server, 2).error,
        Some(ValidationError::ConfigMismatch)
    );

    // A client that parked a ball in the corner and replayed from there
    let honest = record_level(31, 2, &script, 120);
    let mut corner = setup.clone();
    corner.balls[0] = enclosure::BallSpawn { x: 0.1, y: 0.1, dir_x: 1.0, dir_y: 1.0 };
    let mut rec = ReplayRecorder::new(server.clone(), &corner).unwrap();
    for t in 1..=120 {
        rec.tick(script.get(&t).map(Vec::as_slice).unwrap_or(&[]));
    }
    let forged = rec.finish();
    assert_ne!(forged.balls, honest.balls);
    assert_eq!(
        validate_level(&forged, &server, 2).error,
        Some(ValidationError::SpawnMismatch { index: 0, seed: 31 })
    );
    assert!(validate_level(&honest, &server, 2).valid);
}

// =============================================================================
// PROPERTIES
// =============================================================================

fn placement_strategy() -> impl Strategy<Value = (u32, PlacementRequest)> {
    (1u32..200, 1i32..31, 1i32..19, any::<bool>())
        .prop_map(|(t, x, y, vertical)| (t, PlacementRequest { x, y, vertical }))
}

fn script_from(placements: Vec<(u32, PlacementRequest)>) -> BTreeMap<u32, Vec<PlacementRequest>> {
    let mut script: BTreeMap<u32, Vec<PlacementRequest>> = BTreeMap::new();
    for (t, request) in placements {
        script.entry(t).or_default().push(request);
    }
    script
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Two independent runs agree bit for bit.
    #[test]
    fn prop_runs_are_deterministic(
        seed in any::<u64>(),
        balls in 1usize..6,
        placements in prop::collection::vec(placement_strategy(), 0..8),
    ) {
        let config = SimConfig::default();
        let setup = LevelSetup::generate(seed, balls, &config);
        let script = script_from(placements);

        let run = || {
            let mut s = Simulation::new(config.clone());
            for spawn in &setup.balls {
                s.spawn(spawn).unwrap();
            }
            let results = run_script(&mut s, &script, 240);
            (results, s.compute_hash())
        };

        let (ra, ha) = run();
        let (rb, hb) = run();
        prop_assert_eq!(ra, rb);
        prop_assert_eq!(ha, hb);
    }

    /// A recorded level always validates against itself.
    #[test]
    fn prop_recorded_replay_validates(
        seed in any::<u64>(),
        balls in 1usize..5,
        placements in prop::collection::vec(placement_strategy(), 0..6),
    ) {
        let replay = record_level(seed, balls, &script_from(placements), 200);
        let report = validate_level(&replay, &SimConfig::default(), balls);
        prop_assert!(report.valid, "{:?}", report.error);
    }

    /// No tile a ball stands on turns solid, even when walls are placed
    /// right under a ball.
    #[test]
    fn prop_enclosure_never_walls_in_a_ball(
        seed in any::<u64>(),
        balls in 1usize..6,
        placements in prop::collection::vec(
            (1u32..240, any::<bool>(), any::<bool>(), 1i32..31, 1i32..19),
            1..12,
        ),
    ) {
        let config = SimConfig::default();
        let setup = LevelSetup::generate(seed, balls, &config);
        let mut s = Simulation::new(config);
        for spawn in &setup.balls {
            s.spawn(spawn).unwrap();
        }

        for t in 1..=240 {
            let actions: Vec<PlacementRequest> = placements
                .iter()
                .filter(|p| p.0 == t)
                .map(|&(_, under_ball, vertical, x, y)| {
                    let (x, y) = if under_ball {
                        let b = &s.balls()[0];
                        (tile_of(b.x), tile_of(b.y))
                    } else {
                        (x, y)
                    };
                    PlacementRequest { x, y, vertical }
                })
                .collect();

            let before = s.tiles().clone();
            let result = s.tick(&actions);
            if !result.tiles_changed {
                continue;
            }
            for (x, y) in ball_corner_tiles(&s) {
                if before.get(x, y) == Tile::Free {
                    prop_assert_eq!(
                        s.tiles().get(x, y),
                        Tile::Free,
                        "tick {} ball over ({}, {})",
                        result.tick,
                        x,
                        y
                    );
                }
            }
        }
    }

    /// Paired walls never stop each other: with nothing else on the board
    /// the first wall to finish has its tip on the border.
    #[test]
    fn prop_pair_never_collides_with_itself(
        x in 1i32..31,
        y in 1i32..19,
        vertical in any::<bool>(),
    ) {
        let mut s = sim();
        let created = s.tick(&[PlacementRequest { x, y, vertical }]);
        prop_assert_eq!(created.new_walls.len(), 2);

        let mut checked = false;
        for _ in 0..300 {
            let result = s.tick(&[]);
            let finished: Vec<_> = result.wall_events.iter().filter(|e| e.is_finish()).collect();
            if finished.is_empty() {
                continue;
            }
            for event in finished {
                let wall = s.wall(event.wall).unwrap();
                let (tx, ty) = wall.tip_tile();
                prop_assert_eq!(s.tiles().get(tx, ty), Tile::Border);
            }
            checked = true;
            break;
        }
        prop_assert!(checked);
    }
}
