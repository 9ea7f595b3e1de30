//! Enclosure Filler
//!
//! After a wall finishes, every `Free` region that no ball can reach is
//! captured. Reachable tiles are marked `Temp` by an explicit-stack flood
//! fill seeded at the ball corners, then `Free` becomes `Wall` and `Temp`
//! goes back to `Free`.

use crate::core::rect::tile_of;
use crate::game::ball::Ball;
use crate::game::collision::EPSILON;
use crate::game::grid::{Grid, Tile};

/// Tiles under the epsilon-inset corners of each ball, in ball order.
pub fn ball_seeds<'a>(balls: impl IntoIterator<Item = &'a Ball>, size: f64) -> Vec<(i32, i32)> {
    let mut seeds = Vec::new();
    for ball in balls {
        let r = ball.rect(size);
        let left = tile_of(r.x + EPSILON);
        let right = tile_of(r.right() - EPSILON);
        let top = tile_of(r.y + EPSILON);
        let bottom = tile_of(r.bottom() - EPSILON);
        seeds.extend([(left, top), (right, top), (left, bottom), (right, bottom)]);
    }
    seeds
}

/// Capture every `Free` tile not reachable from `seeds`. Returns the
/// number of tiles captured.
pub fn fill_enclosures(grid: &mut Grid, seeds: &[(i32, i32)]) -> u32 {
    let mut stack: Vec<(i32, i32)> = Vec::new();

    for &(x, y) in seeds {
        if grid.is_free(x, y) {
            grid.set(x, y, Tile::Temp);
            stack.push((x, y));
        }
    }

    while let Some((x, y)) = stack.pop() {
        for (nx, ny) in [(x + 1, y), (x - 1, y), (x, y + 1), (x, y - 1)] {
            if grid.is_free(nx, ny) {
                grid.set(nx, ny, Tile::Temp);
                stack.push((nx, ny));
            }
        }
    }

    let mut captured = 0;
    for tile in grid.tiles_mut() {
        match *tile {
            Tile::Free => {
                *tile = Tile::Wall;
                captured += 1;
            }
            Tile::Temp => *tile = Tile::Free,
            _ => {}
        }
    }
    captured
}
