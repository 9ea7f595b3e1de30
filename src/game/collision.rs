//! Collision Detection
//!
//! Pure geometry over balls, walls and the tile grid. Nothing here mutates
//! simulation state; the tick loop decides what a hit means.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Serialize, Deserialize};

use crate::core::rect::{tile_of, Rect};
use crate::game::ball::Ball;
use crate::game::grid::Grid;
use crate::game::wall::{Wall, WallId};

/// Corner inset so a ball resting exactly on a tile edge is not "inside".
pub const EPSILON: f64 = 0.01;

/// Penetration ratio below which a single corner counts as a corner hit.
pub const CORNER_RATIO: f64 = 1.5;

/// Reflection direction per axis: `-1`, `0` or `+1`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Normal {
    /// Horizontal component
    pub x: i8,
    /// Vertical component
    pub y: i8,
}

impl Normal {
    /// No reflection.
    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// Create a normal.
    #[inline]
    pub const fn new(x: i8, y: i8) -> Self {
        Self { x, y }
    }

    /// True if neither axis reflects.
    #[inline]
    pub fn is_zero(self) -> bool {
        self.x == 0 && self.y == 0
    }

    /// Opposite normal, as seen from the other body.
    #[inline]
    pub fn negated(self) -> Self {
        Self::new(-self.x, -self.y)
    }

    /// Overlay `other` on top of `self`; axes `other` leaves at zero keep
    /// their current value.
    #[inline]
    pub fn merged(self, other: Normal) -> Self {
        Self::new(
            if other.x != 0 { other.x } else { self.x },
            if other.y != 0 { other.y } else { self.y },
        )
    }

    /// Point each reflecting velocity component along the normal.
    ///
    /// Setting the sign (rather than flipping it) means two hits on the
    /// same axis in one tick cannot cancel each other out.
    pub fn apply(self, vx: &mut f64, vy: &mut f64) {
        if self.x != 0 && *vx != 0.0 {
            *vx = vx.abs() * f64::from(self.x);
        }
        if self.y != 0 && *vy != 0.0 {
            *vy = vy.abs() * f64::from(self.y);
        }
    }
}

#[inline]
fn sign(v: f64) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

// =============================================================================
// BALL VS TILE
// =============================================================================

/// Which corners of the ball's next rectangle landed in solid tiles.
/// Order: top-left, top-right, bottom-left, bottom-right.
pub type CornerHits = [bool; 4];

/// Result of a ball-vs-tile test.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileHit {
    /// Combined reflection normal
    pub normal: Normal,
    /// Corners that hit
    pub corners: CornerHits,
}

/// Crossing normal for one corner that landed in a solid tile.
///
/// Penetration is measured past the tile edge the corner entered through.
/// An axis only counts if the corner changed column (or row) this step;
/// a corner that crossed neither falls back to velocity-signed depth on
/// both axes.
fn corner_normal(cx: f64, cy: f64, vx: f64, vy: f64) -> Normal {
    let tx = tile_of(cx);
    let ty = tile_of(cy);
    let depth = |c: f64, t: i32, v: f64| {
        if v > 0.0 {
            c - t as f64
        } else {
            (t + 1) as f64 - c
        }
    };

    let crossed_x = vx != 0.0 && tile_of(cx - vx) != tx;
    let crossed_y = vy != 0.0 && tile_of(cy - vy) != ty;
    let (dx, dy) = if crossed_x || crossed_y {
        (
            crossed_x.then(|| depth(cx, tx, vx)),
            crossed_y.then(|| depth(cy, ty, vy)),
        )
    } else {
        (
            (vx != 0.0).then(|| depth(cx, tx, vx)),
            (vy != 0.0).then(|| depth(cy, ty, vy)),
        )
    };

    let nx = -sign(vx);
    let ny = -sign(vy);
    match (dx, dy) {
        (Some(px), Some(py)) => {
            if px * CORNER_RATIO > py && py * CORNER_RATIO > px {
                Normal::new(nx, ny)
            } else if px < py {
                Normal::new(nx, 0)
            } else {
                Normal::new(0, ny)
            }
        }
        (Some(_), None) => Normal::new(nx, 0),
        (None, Some(_)) => Normal::new(0, ny),
        (None, None) => Normal::ZERO,
    }
}

/// Test a ball's next rectangle against the grid.
pub fn ball_tile_collision(grid: &Grid, ball: &Ball, size: f64) -> Option<TileHit> {
    let next = ball.next_rect(size);
    let left = next.x + EPSILON;
    let right = next.right() - EPSILON;
    let top = next.y + EPSILON;
    let bottom = next.bottom() - EPSILON;
    let corners = [(left, top), (right, top), (left, bottom), (right, bottom)];

    let mut hits: CornerHits = [false; 4];
    let mut sum_x = 0i32;
    let mut sum_y = 0i32;
    for (i, &(cx, cy)) in corners.iter().enumerate() {
        if !grid.get(tile_of(cx), tile_of(cy)).is_solid() {
            continue;
        }
        hits[i] = true;
        let n = corner_normal(cx, cy, ball.vx, ball.vy);
        sum_x += i32::from(n.x);
        sum_y += i32::from(n.y);
    }

    if !hits.iter().any(|&h| h) {
        return None;
    }

    // A flat edge hit touches both corners of one side. Their individual
    // normals can both read as corner hits; force the single-axis normal.
    let [tl, tr, bl, br] = hits;
    let normal = if tl && tr && !bl && !br {
        Normal::new(0, 1)
    } else if bl && br && !tl && !tr {
        Normal::new(0, -1)
    } else if tl && bl && !tr && !br {
        Normal::new(1, 0)
    } else if tr && br && !tl && !bl {
        Normal::new(-1, 0)
    } else {
        Normal::new(sum_x.signum() as i8, sum_y.signum() as i8)
    };

    Some(TileHit { normal, corners: hits })
}

// =============================================================================
// BALL VS WALL / BALL VS BALL
// =============================================================================

/// Separating-axis normal pushing `a` away from `b`.
///
/// The axis with the smaller centre overlap is the collision axis. When
/// the centres coincide on that axis, the normal opposes `a`'s velocity.
pub fn center_normal(a: &Rect, b: &Rect, vx: f64, vy: f64) -> Normal {
    let (ox, oy) = a.center_overlap(b);
    let (ax, ay) = a.center();
    let (bx, by) = b.center();
    if ox < oy {
        let s = sign(ax - bx);
        Normal::new(if s != 0 { s } else { -sign(vx) }, 0)
    } else {
        let s = sign(ay - by);
        Normal::new(0, if s != 0 { s } else { -sign(vy) })
    }
}

/// Where on a wall a ball struck.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WallHitZone {
    /// The body behind the tip strip
    Inner,
    /// Only the leading one-tile strip
    Tip,
}

/// A ball's next rectangle overlapping a building wall.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BallWallHit {
    /// Wall struck
    pub wall: WallId,
    /// Normal for the ball
    pub normal: Normal,
    /// Inner or tip-only
    pub zone: WallHitZone,
}

/// What a ball-vs-wall hit does to the wall.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WallHitOutcome {
    /// Inner hit: the wall dies
    Kill,
    /// Tip hit along the growth axis: finish with these bounds
    Shorten(Rect),
    /// The ball bounces, the wall keeps growing
    Bounce,
}

/// Test a ball's next rectangle against one wall.
pub fn ball_wall_collision(ball: &Ball, size: f64, wall: &Wall) -> Option<BallWallHit> {
    if !wall.building {
        return None;
    }
    let next = ball.next_rect(size);
    if !next.intersects(&wall.rect) {
        return None;
    }

    let normal = center_normal(&next, &wall.rect, ball.vx, ball.vy);
    let zone = match wall.inner_rect() {
        Some(inner) if next.intersects(&inner) => WallHitZone::Inner,
        _ => WallHitZone::Tip,
    };

    Some(BallWallHit {
        wall: wall.id,
        normal,
        zone,
    })
}

/// Decide what a hit does to the wall.
///
/// A tip hit only finishes the wall when the ball came in along the
/// wall's growth axis and the shortened wall still covers a full tile.
pub fn resolve_wall_hit(hit: &BallWallHit, wall: &Wall) -> WallHitOutcome {
    match hit.zone {
        WallHitZone::Inner => WallHitOutcome::Kill,
        WallHitZone::Tip => {
            let along_axis = if wall.direction.is_vertical() {
                hit.normal.y != 0
            } else {
                hit.normal.x != 0
            };
            match wall.shortened_rect() {
                Some(bounds) if along_axis => WallHitOutcome::Shorten(bounds),
                _ => WallHitOutcome::Bounce,
            }
        }
    }
}

/// Two balls whose next rectangles overlap. `normal` applies to `a`;
/// `b` takes its negation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BallPairHit {
    /// Lower index
    pub a: usize,
    /// Higher index
    pub b: usize,
    /// Normal for `a`
    pub normal: Normal,
}

/// All overlapping ball pairs, in ascending `(a, b)` order.
///
/// Balls are bucketed into a uniform grid keyed by next position; only
/// balls in the same or adjacent cells are compared. Cells must be at least
/// as large as a ball for the neighbourhood to be complete.
pub fn ball_pair_collisions(balls: &[Ball], size: f64, cell: f64) -> Vec<BallPairHit> {
    let next: Vec<Rect> = balls.iter().map(|b| b.next_rect(size)).collect();
    let cell = cell.max(size);

    let mut buckets: BTreeMap<(i32, i32), Vec<usize>> = BTreeMap::new();
    for (i, r) in next.iter().enumerate() {
        let key = ((r.x / cell).floor() as i32, (r.y / cell).floor() as i32);
        buckets.entry(key).or_default().push(i);
    }

    let mut candidates = BTreeSet::new();
    for (&(cx, cy), members) in &buckets {
        for dy in -1..=1 {
            for dx in -1..=1 {
                let Some(neighbours) = buckets.get(&(cx + dx, cy + dy)) else {
                    continue;
                };
                for &i in members {
                    for &j in neighbours {
                        if i < j {
                            candidates.insert((i, j));
                        }
                    }
                }
            }
        }
    }

    candidates
        .into_iter()
        .filter(|&(a, b)| next[a].intersects(&next[b]))
        .map(|(a, b)| BallPairHit {
            a,
            b,
            normal: center_normal(&next[a], &next[b], balls[a].vx, balls[a].vy),
        })
        .collect()
}

// =============================================================================
// WALL VS GRID / WALL VS WALL
// =============================================================================

/// Has the wall's tip run into a solid tile?
pub fn wall_tile_collision(grid: &Grid, wall: &Wall) -> bool {
    if !wall.tip_left_start() {
        return false;
    }
    let (x, y) = wall.tip_tile();
    grid.get(x, y).is_solid()
}

/// First other building wall (by id) that the tip strip overlaps. A
/// wall's pair is never a collision partner.
pub fn wall_wall_collision(wall: &Wall, walls: &[Wall]) -> Option<WallId> {
    if !wall.tip_left_start() {
        return None;
    }
    let tip = wall.tip_rect();
    walls
        .iter()
        .filter(|other| other.building && other.id != wall.id && !wall.is_paired_with(other))
        .find(|other| tip.intersects(&other.rect))
        .map(|other| other.id)
}
