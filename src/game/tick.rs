//! Authoritative Simulation Tick
//!
//! The fixed-step loop. Every step runs in a fixed order over entities in
//! handle order, so identical inputs always produce bit-identical states.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};
use tracing::{debug, trace};

use crate::core::rect::Rect;
use crate::game::ball::{BallId, BallSnapshot};
use crate::game::collision::{
    ball_pair_collisions, ball_tile_collision, ball_wall_collision, resolve_wall_hit,
    wall_tile_collision, wall_wall_collision, Normal, WallHitOutcome,
};
use crate::game::events::{BallCollision, WallEvent};
use crate::game::fill::{ball_seeds, fill_enclosures};
use crate::game::placement::{plan_placement, PlacementRequest};
use crate::game::state::Simulation;
use crate::game::wall::{ActiveWall, NewWall, Wall, WallId};

/// Everything a caller needs to know about one tick.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TickResult {
    /// Tick number just produced
    pub tick: u32,
    /// Ball states after moving
    pub balls: Vec<BallSnapshot>,
    /// Ball collisions, in detection order
    pub collisions: Vec<BallCollision>,
    /// Walls that finished or died
    pub wall_events: Vec<WallEvent>,
    /// Walls created by accepted placements
    pub new_walls: Vec<NewWall>,
    /// Walls still building after this tick
    pub active_walls: Vec<ActiveWall>,
    /// Placement requests that started walls
    pub accepted: Vec<PlacementRequest>,
    /// Whether any tile changed
    pub tiles_changed: bool,
    /// Fill target reached?
    pub level_complete: bool,
    /// Fill percentage after this tick
    pub fill_percent: u32,
    /// Tiles captured by enclosure fill this tick
    pub captured: u32,
}

impl Simulation {
    /// Run one tick. See [`tick`].
    pub fn tick(&mut self, actions: &[PlacementRequest]) -> TickResult {
        tick(self, actions)
    }
}

/// Run one simulation tick.
///
/// # Order
///
/// 1. Placement intake
/// 2. Ball vs wall, then ball vs tile if no wall was hit
/// 3. Ball vs ball
/// 4. Resolve and grow walls
/// 5. Apply reflections and move balls
/// 6. Enclosure fill if any wall finished
/// 7. Advance the tick counter
pub fn tick(sim: &mut Simulation, actions: &[PlacementRequest]) -> TickResult {
    let mut result = TickResult::default();
    let mut pending = vec![Normal::ZERO; sim.balls.len()];

    // 1. Intake
    process_placements(sim, actions, &mut result);

    // 2. Ball vs wall / tile
    let mut finished = process_ball_hits(sim, &mut pending, &mut result);

    // 3. Ball vs ball
    process_ball_pairs(sim, &mut pending, &mut result);

    // 4. Walls
    finished |= process_walls(sim, &mut result);

    // 5. Move
    for (ball, normal) in sim.balls.iter_mut().zip(&pending) {
        normal.apply(&mut ball.vx, &mut ball.vy);
        ball.step();
    }

    // 6. Enclosure
    if finished {
        let seeds = ball_seeds(sim.balls.iter(), sim.config.ball_size);
        result.captured = fill_enclosures(&mut sim.grid, &seeds);
        result.tiles_changed = true;
        sim.fill_percent = sim.grid.fill_percent();
        sim.level_complete = sim.fill_percent >= sim.config.fill_target_percent;
        debug!(
            tick = sim.tick + 1,
            captured = result.captured,
            fill = sim.fill_percent,
            complete = sim.level_complete,
            "enclosure filled"
        );
    }

    // 7. Advance
    sim.tick += 1;

    result.tick = sim.tick;
    result.balls = sim.ball_snapshots();
    result.active_walls = sim.building_walls().map(Wall::active).collect();
    result.level_complete = sim.level_complete;
    result.fill_percent = sim.fill_percent;

    #[cfg(feature = "debug-tracing")]
    trace!(
        tick = result.tick,
        collisions = result.collisions.len(),
        wall_events = result.wall_events.len(),
        active = result.active_walls.len(),
        "tick complete"
    );

    result
}

/// Start walls for each acceptable request, in request order.
fn process_placements(sim: &mut Simulation, actions: &[PlacementRequest], result: &mut TickResult) {
    for request in actions {
        let plan = {
            let building: Vec<&Wall> = sim.building_walls().collect();
            plan_placement(&sim.grid, &building, request)
        };

        match plan {
            Ok(placement) => {
                for &direction in placement.directions() {
                    let id = sim
                        .walls
                        .insert_with(|id| Wall::new(id, request.x, request.y, direction));
                    if let Some(wall) = sim.walls.get(id) {
                        result.new_walls.push(wall.creation());
                    }
                }
                result.accepted.push(*request);
            }
            Err(reason) => {
                trace!(x = request.x, y = request.y, ?reason, "placement rejected");
            }
        }
    }
}

/// Ball vs building walls, falling back to ball vs grid. Returns whether
/// any wall finished.
fn process_ball_hits(
    sim: &mut Simulation,
    pending: &mut [Normal],
    result: &mut TickResult,
) -> bool {
    let size = sim.config.ball_size;
    let mut finished = false;

    for i in 0..sim.balls.len() {
        let ball = sim.balls.as_slice()[i].clone();
        let mut hit_wall = false;

        for w in 0..sim.walls.len() {
            let (hit, outcome, wall_id) = {
                let wall = &sim.walls.as_slice()[w];
                match ball_wall_collision(&ball, size, wall) {
                    Some(hit) => (hit, resolve_wall_hit(&hit, wall), wall.id),
                    None => continue,
                }
            };

            hit_wall = true;
            pending[i] = pending[i].merged(hit.normal);
            result
                .collisions
                .push(BallCollision::wall(ball.id, wall_id, hit.normal));

            match outcome {
                WallHitOutcome::Kill => kill_wall(sim, wall_id, ball.id, result),
                WallHitOutcome::Shorten(bounds) => {
                    finish_wall(sim, wall_id, bounds, true, result);
                    finished = true;
                }
                WallHitOutcome::Bounce => {}
            }
        }

        if hit_wall {
            continue;
        }

        if let Some(hit) = ball_tile_collision(&sim.grid, &ball, size) {
            pending[i] = pending[i].merged(hit.normal);
            result.collisions.push(BallCollision::tile(ball.id, hit.normal));
        }
    }

    finished
}

/// Ball vs ball over the spatial hash.
fn process_ball_pairs(sim: &Simulation, pending: &mut [Normal], result: &mut TickResult) {
    let balls = sim.balls.as_slice();
    let hits = ball_pair_collisions(balls, sim.config.ball_size, sim.config.spatial_cell);

    for hit in hits {
        let (a, b): (BallId, BallId) = (balls[hit.a].id, balls[hit.b].id);
        pending[hit.a] = pending[hit.a].merged(hit.normal);
        pending[hit.b] = pending[hit.b].merged(hit.normal.negated());
        result.collisions.push(BallCollision::ball(a, b, hit.normal));
        result
            .collisions
            .push(BallCollision::ball(b, a, hit.normal.negated()));
    }
}

/// Finish walls whose tip reached something solid, grow the rest.
/// Returns whether any wall finished.
fn process_walls(sim: &mut Simulation, result: &mut TickResult) -> bool {
    let speed = sim.config.wall_speed;
    let mut finished = false;

    for w in 0..sim.walls.len() {
        let (id, rect, stop) = {
            let wall = &sim.walls.as_slice()[w];
            if !wall.building {
                continue;
            }
            let stop = wall_tile_collision(&sim.grid, wall)
                || wall_wall_collision(wall, sim.walls.as_slice()).is_some();
            (wall.id, wall.rect, stop)
        };

        if stop {
            finish_wall(sim, id, rect, false, result);
            finished = true;
        } else {
            sim.walls.as_mut_slice()[w].grow(speed);
        }
    }

    finished
}

/// The building partner of `id`, if any.
fn building_partner(sim: &Simulation, id: WallId) -> Option<WallId> {
    let wall = sim.walls.get(id)?;
    sim.building_walls()
        .find(|other| wall.is_paired_with(other))
        .map(|other| other.id)
}

/// Stop a wall and write its full tiles into the grid. The shared start
/// tile is left to the partner while the partner is still growing, and no
/// tile a ball touches now or after this tick's move becomes solid.
fn finish_wall(
    sim: &mut Simulation,
    id: WallId,
    bounds: Rect,
    shortened: bool,
    result: &mut TickResult,
) {
    let partner = building_partner(sim, id);
    let (size, reach) = (sim.config.ball_size, sim.config.ball_speed);
    let keep_out: Vec<Rect> = sim
        .balls
        .iter()
        .map(|b| Rect::new(b.x - reach, b.y - reach, size + 2.0 * reach, size + 2.0 * reach))
        .collect();

    let Some(wall) = sim.walls.get_mut(id) else {
        return;
    };
    if !wall.building {
        return;
    }
    wall.building = false;
    wall.rect = bounds;
    let skip = partner.map(|_| wall.start_tile());

    let changed = sim.grid.materialize(bounds, skip, &keep_out);
    result.tiles_changed |= changed > 0;
    result.wall_events.push(if shortened {
        WallEvent::finish_shortened(id, bounds)
    } else {
        WallEvent::finish(id, bounds)
    });

    debug!(wall = %id, ?bounds, shortened, tiles = changed, "wall finished");
}

/// Kill a wall struck by `ball`, and its partner if still growing.
fn kill_wall(sim: &mut Simulation, id: WallId, ball: BallId, result: &mut TickResult) {
    let partner = building_partner(sim, id);
    let Some(wall) = sim.walls.get_mut(id) else {
        return;
    };
    if !wall.building {
        return;
    }
    wall.building = false;
    result.wall_events.push(WallEvent::die(id, ball));
    debug!(wall = %id, ball = %ball, "wall destroyed");

    if let Some(partner) = partner {
        if let Some(other) = sim.walls.get_mut(partner) {
            other.building = false;
            result.wall_events.push(WallEvent::die_paired(partner, id));
            debug!(wall = %partner, partner = %id, "paired wall destroyed");
        }
    }
}

/// Run `tick_count` ticks, feeding each tick the requests scripted for
/// the tick number it will produce.
pub fn run_script(
    sim: &mut Simulation,
    script: &BTreeMap<u32, Vec<PlacementRequest>>,
    tick_count: u32,
) -> Vec<TickResult> {
    let mut results = Vec::with_capacity(tick_count as usize);
    for _ in 0..tick_count {
        let actions = script
            .get(&(sim.tick_count() + 1))
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        results.push(tick(sim, actions));
    }
    results
}
