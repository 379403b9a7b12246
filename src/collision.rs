use crate::components::{Actor, TerminalReason, TileCoord, TileKind};
use crate::config::PhysicsConfig;
use crate::geometry::Aabb;
use crate::tilemap::{MapBounds, TileLayer, TileQuery};
use bevy::math::Vec2;

/// Neighbourhood cell relative to the actor's tile.
///
/// The discriminant encodes the grid offset: `index / 3 - 1` is the row offset and
/// `index % 3 - 1` the column offset, with row -1 above the actor.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum QueryPosition {
    AboveLeft = 0,
    Above = 1,
    AboveRight = 2,
    Left = 3,
    Center = 4,
    Right = 5,
    BelowLeft = 6,
    Below = 7,
    BelowRight = 8,
}

/// Axis-aligned neighbours first, diagonals last.
pub const RESOLUTION_ORDER: [QueryPosition; 8] = [
    QueryPosition::Below,
    QueryPosition::Above,
    QueryPosition::Left,
    QueryPosition::Right,
    QueryPosition::AboveLeft,
    QueryPosition::AboveRight,
    QueryPosition::BelowLeft,
    QueryPosition::BelowRight,
];

impl QueryPosition {
    pub fn index(self) -> u8 {
        self as u8
    }

    /// `(column, row)` offset in tiles.
    pub fn offset(self) -> (i32, i32) {
        let i = self.index() as i32;
        (i % 3 - 1, i / 3 - 1)
    }

    pub fn is_diagonal(self) -> bool {
        let (dcol, drow) = self.offset();
        dcol != 0 && drow != 0
    }
}

/// Output of one simulation step, for the host to present.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct StepResult {
    pub position: Vec2,
    pub velocity: Vec2,
    pub on_ground: bool,
    pub terminal: Option<TerminalReason>,
}

impl StepResult {
    pub fn from_actor(actor: &Actor) -> Self {
        Self {
            position: actor.position,
            velocity: actor.velocity,
            on_ground: actor.on_ground,
            terminal: actor.terminal(),
        }
    }
}

/// Collision box around `center`: inset horizontally to avoid snagging on walls and,
/// for sprites shorter than a tile, stretched to tile height (a quarter below the feet).
pub fn collision_box(center: Vec2, size: Vec2, tile_size: Vec2, inset: f32) -> Aabb {
    let clip = (tile_size.y - size.y).max(0.0);
    Aabb::new(
        center.x - size.x * 0.5 + inset,
        center.y - size.y * 0.5 - clip * 0.25,
        size.x - inset * 2.0,
        size.y + clip,
    )
}

fn actor_box(actor: &Actor, bounds: &MapBounds, config: &PhysicsConfig) -> Aabb {
    collision_box(
        actor.desired_position,
        actor.size,
        bounds.tile_size,
        config.collision_inset,
    )
}

fn push_up(actor: &mut Actor, amount: f32) {
    actor.desired_position.y += amount;
    actor.velocity.y = actor.velocity.y.max(0.0);
    actor.on_ground = true;
}

fn push_down(actor: &mut Actor, amount: f32) {
    actor.desired_position.y -= amount;
    actor.velocity.y = actor.velocity.y.min(0.0);
}

/// Move the desired position out of a solid tile at `position` overlapping by
/// `overlap`.
pub fn resolve_overlap(actor: &mut Actor, position: QueryPosition, overlap: &Aabb) {
    let (w, h) = (overlap.width(), overlap.height());
    match position {
        QueryPosition::Below => push_up(actor, h),
        QueryPosition::Above => push_down(actor, h),
        QueryPosition::Left => actor.desired_position.x += w,
        QueryPosition::Right => actor.desired_position.x -= w,
        QueryPosition::AboveLeft
        | QueryPosition::AboveRight
        | QueryPosition::BelowLeft
        | QueryPosition::BelowRight => {
            let (dcol, drow) = position.offset();
            if w > h {
                // Wide, shallow overlap: the corner tile acts as a floor or ceiling.
                if drow > 0 {
                    push_up(actor, h);
                } else {
                    push_down(actor, h);
                }
            } else if dcol < 0 {
                actor.desired_position.x += w;
            } else {
                actor.desired_position.x -= w;
            }
        }
        QueryPosition::Center => {}
    }
}

/// Any non-empty cell in the hazard layer is lethal.
fn touches_hazard<M: TileQuery + ?Sized>(map: &M, actor_coord: TileCoord, bbox: &Aabb) -> bool {
    RESOLUTION_ORDER.iter().any(|position| {
        let (dcol, drow) = position.offset();
        map.tile_at(actor_coord.offset(dcol, drow), TileLayer::Hazards)
            .is_some_and(|tile| bbox.intersection(&tile.frame).is_some())
    })
}

/// Goal threshold: past `goal_fraction` of the map width.
pub fn reached_goal(position: Vec2, bounds: &MapBounds, config: &PhysicsConfig) -> bool {
    position.x > bounds.width_points() * config.goal_fraction
}

/// Resolve the actor's desired position against the terrain and hazard layers and
/// commit it.
///
/// Falling past the bottom of the map ends the step early without committing. Hazard
/// contact is reported but never pushes the actor.
pub fn resolve<M: TileQuery + ?Sized>(
    actor: &mut Actor,
    map: &M,
    config: &PhysicsConfig,
) -> StepResult {
    if !actor.is_alive() {
        return StepResult::from_actor(actor);
    }
    actor.on_ground = false;

    let bounds = map.bounds();
    let initial_box = actor_box(actor, &bounds, config);
    let coord = map.world_to_tile(actor.desired_position);

    if coord.row > bounds.height_tiles.saturating_add(config.fall_tolerance) {
        actor.terminate(TerminalReason::Fell);
        return StepResult::from_actor(actor);
    }

    for position in RESOLUTION_ORDER {
        let (dcol, drow) = position.offset();
        let Some(tile) = map.tile_at(coord.offset(dcol, drow), TileLayer::Terrain) else {
            continue;
        };
        if tile.kind != TileKind::Solid {
            continue;
        }
        // Earlier corrections in this pass move the box.
        let bbox = actor_box(actor, &bounds, config);
        if let Some(overlap) = bbox.intersection(&tile.frame) {
            resolve_overlap(actor, position, &overlap);
        }
    }

    if touches_hazard(map, coord, &initial_box) {
        actor.terminate(TerminalReason::Hazard);
    }

    actor.position = actor.desired_position;

    if reached_goal(actor.position, &bounds, config) {
        actor.terminate(TerminalReason::Goal);
    }

    StepResult::from_actor(actor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tilemap::Tilemap;

    fn actor_with_desired(x: f32, y: f32) -> Actor {
        let mut actor = Actor::spawn(Vec2::new(x, y), Vec2::new(18.0, 26.0));
        actor.desired_position = Vec2::new(x, y);
        actor
    }

    fn single_tile_map(col: i32, row: i32) -> Tilemap {
        let mut tilemap = Tilemap::empty(6, 4);
        tilemap.set(TileLayer::Terrain, col, row, TileKind::Solid);
        tilemap
    }

    #[test]
    fn query_positions_decompose_into_grid_offsets() {
        assert_eq!(QueryPosition::AboveLeft.offset(), (-1, -1));
        assert_eq!(QueryPosition::Above.offset(), (0, -1));
        assert_eq!(QueryPosition::Left.offset(), (-1, 0));
        assert_eq!(QueryPosition::Center.offset(), (0, 0));
        assert_eq!(QueryPosition::Right.offset(), (1, 0));
        assert_eq!(QueryPosition::Below.offset(), (0, 1));
        assert_eq!(QueryPosition::BelowRight.offset(), (1, 1));
        let diagonals = RESOLUTION_ORDER.iter().filter(|p| p.is_diagonal()).count();
        assert_eq!(diagonals, 4);
        assert!(RESOLUTION_ORDER[..4].iter().all(|p| !p.is_diagonal()));
    }

    #[test]
    fn short_sprite_box_grows_to_tile_height() {
        let bbox = collision_box(Vec2::new(20.0, 20.0), Vec2::new(10.0, 8.0), Vec2::splat(16.0), 1.0);
        assert_eq!(bbox, Aabb::new(16.0, 14.0, 8.0, 16.0));
    }

    #[test]
    fn floor_overlap_pushes_up_and_grounds() {
        let tilemap = Tilemap::from_rows(&["......", "......", "......", "######"]).unwrap();
        let mut actor = actor_with_desired(40.0, 26.0);
        actor.velocity.y = -90.0;
        let out = resolve(&mut actor, &tilemap, &PhysicsConfig::default());
        assert!((out.position.y - 29.0).abs() < 0.0001);
        assert_eq!(out.velocity.y, 0.0);
        assert!(out.on_ground);
        assert_eq!(out.terminal, None);
        assert_eq!(actor.position, actor.desired_position);
    }

    #[test]
    fn wall_on_the_right_pushes_left() {
        let tilemap = Tilemap::from_rows(&["......", "...#..", "...#..", "######"]).unwrap();
        let mut actor = actor_with_desired(43.0, 29.0);
        actor.velocity.x = 120.0;
        let out = resolve(&mut actor, &tilemap, &PhysicsConfig::default());
        assert!((out.position.x - 41.0).abs() < 0.0001);
        assert!((out.position.y - 29.0).abs() < 0.0001);
        assert!(!out.on_ground);
    }

    #[test]
    fn ceiling_overlap_pushes_down() {
        let tilemap = single_tile_map(2, 1);
        // Tile (2, 1) spans y 32..48; the box top sits 3 points inside it.
        let mut actor = actor_with_desired(40.0, 22.0);
        actor.velocity.y = 200.0;
        let out = resolve(&mut actor, &tilemap, &PhysicsConfig::default());
        assert!((out.position.y - 19.0).abs() < 0.0001);
        assert_eq!(out.velocity.y, 0.0);
        assert!(!out.on_ground);
    }

    #[test]
    fn shallow_corner_overlap_below_acts_as_ledge() {
        let tilemap = single_tile_map(3, 3);
        let mut actor = actor_with_desired(45.0, 27.0);
        actor.velocity.y = -50.0;
        let out = resolve(&mut actor, &tilemap, &PhysicsConfig::default());
        assert!((out.position.y - 29.0).abs() < 0.0001);
        assert!((out.position.x - 45.0).abs() < 0.0001);
        assert_eq!(out.velocity.y, 0.0);
        assert!(out.on_ground);
    }

    #[test]
    fn tall_corner_overlap_pushes_sideways() {
        let tilemap = single_tile_map(3, 3);
        let mut actor = actor_with_desired(43.0, 25.0);
        let out = resolve(&mut actor, &tilemap, &PhysicsConfig::default());
        assert!((out.position.x - 41.0).abs() < 0.0001);
        assert!((out.position.y - 25.0).abs() < 0.0001);
        assert!(!out.on_ground);
    }

    #[test]
    fn shallow_corner_overlap_above_does_not_ground() {
        let tilemap = single_tile_map(1, 1);
        let mut actor = actor_with_desired(35.0, 21.0);
        actor.velocity.y = 100.0;
        let out = resolve(&mut actor, &tilemap, &PhysicsConfig::default());
        assert!((out.position.y - 19.0).abs() < 0.0001);
        assert_eq!(out.velocity.y, 0.0);
        assert!(!out.on_ground);
    }

    #[test]
    fn touching_a_tile_is_not_a_collision() {
        let tilemap = Tilemap::from_rows(&["......", "......", "......", "######"]).unwrap();
        let mut actor = actor_with_desired(40.0, 29.0);
        let out = resolve(&mut actor, &tilemap, &PhysicsConfig::default());
        assert_eq!(out.position, Vec2::new(40.0, 29.0));
        assert!(!out.on_ground);
    }

    #[test]
    fn hazard_overlap_is_terminal_without_push() {
        let tilemap = Tilemap::from_rows(&["......", "......", "......", "..^..."]).unwrap();
        let mut actor = actor_with_desired(40.0, 26.0);
        let out = resolve(&mut actor, &tilemap, &PhysicsConfig::default());
        assert_eq!(out.terminal, Some(TerminalReason::Hazard));
        assert_eq!(out.position, Vec2::new(40.0, 26.0));
    }

    #[test]
    fn hazard_wins_even_when_terrain_pushes_clear() {
        let mut tilemap = Tilemap::from_rows(&["......", "......", "......", "######"]).unwrap();
        tilemap.set(TileLayer::Hazards, 2, 3, TileKind::Hazard);
        let mut actor = actor_with_desired(40.0, 26.0);
        let out = resolve(&mut actor, &tilemap, &PhysicsConfig::default());
        assert!(out.on_ground);
        assert_eq!(out.terminal, Some(TerminalReason::Hazard));
    }

    #[test]
    fn any_hazard_layer_code_is_lethal() {
        let mut tilemap = Tilemap::empty(6, 4);
        tilemap.set(TileLayer::Hazards, 2, 3, TileKind::Solid);
        let mut actor = actor_with_desired(40.0, 26.0);
        let out = resolve(&mut actor, &tilemap, &PhysicsConfig::default());
        assert_eq!(out.terminal, Some(TerminalReason::Hazard));
    }

    #[test]
    fn falling_below_the_map_is_terminal() {
        let tilemap = Tilemap::empty(4, 4);
        let mut actor = Actor::spawn(Vec2::new(20.0, 0.0), Vec2::new(18.0, 26.0));
        actor.desired_position = Vec2::new(20.0, -40.0);
        assert_eq!(tilemap.world_to_tile(actor.desired_position), TileCoord::new(1, 6));
        let out = resolve(&mut actor, &tilemap, &PhysicsConfig::default());
        assert_eq!(out.terminal, Some(TerminalReason::Fell));
        assert_eq!(out.position, Vec2::new(20.0, 0.0));

        let mut within = actor_with_desired(20.0, -20.0);
        let out = resolve(&mut within, &tilemap, &PhysicsConfig::default());
        assert_eq!(out.terminal, None);
    }

    #[test]
    fn huge_fall_tolerance_does_not_overflow() {
        let tilemap = Tilemap::empty(4, 4);
        let config = PhysicsConfig {
            fall_tolerance: i32::MAX,
            ..Default::default()
        };
        let mut actor = actor_with_desired(20.0, -4000.0);
        let out = resolve(&mut actor, &tilemap, &config);
        assert_eq!(out.terminal, None);
    }

    #[test]
    fn passing_goal_fraction_finishes() {
        let tilemap = Tilemap::empty(10, 4);
        let mut short = actor_with_desired(150.0, 40.0);
        assert_eq!(resolve(&mut short, &tilemap, &PhysicsConfig::default()).terminal, None);
        let mut past = actor_with_desired(153.0, 40.0);
        assert_eq!(
            resolve(&mut past, &tilemap, &PhysicsConfig::default()).terminal,
            Some(TerminalReason::Goal)
        );
    }

    #[test]
    fn terminal_actor_is_frozen() {
        let tilemap = Tilemap::from_rows(&["......", "......", "......", "######"]).unwrap();
        let mut actor = actor_with_desired(40.0, 26.0);
        actor.terminate(TerminalReason::Hazard);
        let out = resolve(&mut actor, &tilemap, &PhysicsConfig::default());
        assert_eq!(out.position, Vec2::new(40.0, 26.0));
        assert!(!out.on_ground);
        assert_eq!(out.terminal, Some(TerminalReason::Hazard));
    }
}
