use crate::components::{TileCoord, TileKind};
use crate::geometry::Aabb;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// The tile layers the engine reads.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TileLayer {
    Terrain,
    Hazards,
}

/// A non-empty tile as returned by a [`TileQuery`].
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Tile {
    pub frame: Aabb,
    pub kind: TileKind,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct MapBounds {
    pub width_tiles: i32,
    pub height_tiles: i32,
    pub tile_size: Vec2,
}

impl MapBounds {
    pub fn width_points(&self) -> f32 {
        self.width_tiles as f32 * self.tile_size.x
    }

    pub fn height_points(&self) -> f32 {
        self.height_tiles as f32 * self.tile_size.y
    }

    /// World point to tile coordinates. World +y is up with the origin at the bottom-left
    /// corner of the map; tile row 0 is the top row.
    pub fn world_to_tile(&self, point: Vec2) -> TileCoord {
        TileCoord {
            col: (point.x / self.tile_size.x).floor() as i32,
            row: ((self.height_points() - point.y) / self.tile_size.y).floor() as i32,
        }
    }

    pub fn tile_frame(&self, coord: TileCoord) -> Aabb {
        Aabb::new(
            coord.col as f32 * self.tile_size.x,
            self.height_points() - (coord.row + 1) as f32 * self.tile_size.y,
            self.tile_size.x,
            self.tile_size.y,
        )
    }
}

/// Read-only tile lookup consumed by the collision resolver.
pub trait TileQuery {
    fn bounds(&self) -> MapBounds;

    /// The tile at `coord` in `layer`, or `None` for empty space. Coordinates outside the
    /// grid are empty space, not an error.
    fn tile_at(&self, coord: TileCoord, layer: TileLayer) -> Option<Tile>;

    fn world_to_tile(&self, point: Vec2) -> TileCoord {
        self.bounds().world_to_tile(point)
    }
}

/// In-memory level: two row-major layers of [`TileKind`] codes.
#[derive(Resource, Clone, Debug, Serialize, Deserialize)]
pub struct Tilemap {
    pub width: usize,
    pub height: usize,
    #[serde(default = "default_tile_edge")]
    pub tile_width: f32,
    #[serde(default = "default_tile_edge")]
    pub tile_height: f32,
    pub terrain: Vec<u8>,
    /// May be left empty for levels without hazards.
    #[serde(default)]
    pub hazards: Vec<u8>,
    /// Spawn tile as (column, row).
    pub player_spawn: (i32, i32),
}

fn default_tile_edge() -> f32 {
    16.0
}

impl Default for Tilemap {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            tile_width: default_tile_edge(),
            tile_height: default_tile_edge(),
            terrain: Vec::new(),
            hazards: Vec::new(),
            player_spawn: (0, 0),
        }
    }
}

impl Tilemap {
    pub fn empty(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            terrain: vec![TileKind::Empty as u8; width * height],
            hazards: vec![TileKind::Empty as u8; width * height],
            ..Default::default()
        }
    }

    fn index(&self, col: i32, row: i32) -> Option<usize> {
        if col < 0 || row < 0 || col >= self.width as i32 || row >= self.height as i32 {
            return None;
        }
        Some(row as usize * self.width + col as usize)
    }

    pub fn get(&self, layer: TileLayer, col: i32, row: i32) -> TileKind {
        let cells = match layer {
            TileLayer::Terrain => &self.terrain,
            TileLayer::Hazards => &self.hazards,
        };
        self.index(col, row)
            .and_then(|i| cells.get(i))
            .map_or(TileKind::Empty, |&id| TileKind::from_u8(id))
    }

    /// Number of cells per layer, or `None` when the dimensions do not fit the
    /// `i32` tile coordinates.
    pub fn cell_count(&self) -> Option<usize> {
        let max = i32::MAX as usize;
        if self.width > max || self.height > max {
            return None;
        }
        self.width.checked_mul(self.height)
    }

    pub fn set(&mut self, layer: TileLayer, col: i32, row: i32, kind: TileKind) {
        let Some(len) = self.cell_count() else {
            return;
        };
        let Some(i) = self.index(col, row) else {
            return;
        };
        let cells = match layer {
            TileLayer::Terrain => &mut self.terrain,
            TileLayer::Hazards => &mut self.hazards,
        };
        if cells.len() != len {
            cells.resize(len, TileKind::Empty as u8);
        }
        cells[i] = kind as u8;
    }

    /// World position that puts an actor of `size` on the spawn tile, centred
    /// horizontally with its feet on the tile's bottom edge.
    pub fn spawn_point(&self, size: Vec2) -> Vec2 {
        let (col, row) = self.player_spawn;
        let frame = self.bounds().tile_frame(TileCoord::new(col, row));
        Vec2::new(frame.center().x, frame.min_y + size.y * 0.5)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!(
                "level must have at least one tile, got {}x{}",
                self.width, self.height
            ));
        }
        if !(self.tile_width > 0.0 && self.tile_height > 0.0) {
            return Err(format!(
                "tile size must be positive, got {}x{}",
                self.tile_width, self.tile_height
            ));
        }
        let Some(cells) = self.cell_count() else {
            return Err(format!(
                "level dimensions {}x{} are too large",
                self.width, self.height
            ));
        };
        if self.terrain.len() != cells {
            return Err(format!(
                "terrain layer has {} tiles, expected {}",
                self.terrain.len(),
                cells
            ));
        }
        if !self.hazards.is_empty() && self.hazards.len() != cells {
            return Err(format!(
                "hazard layer has {} tiles, expected {}",
                self.hazards.len(),
                cells
            ));
        }
        check_layer_codes("terrain", &self.terrain, TileKind::Solid)?;
        check_layer_codes("hazard", &self.hazards, TileKind::Hazard)?;
        let (col, row) = self.player_spawn;
        if self.index(col, row).is_none() {
            return Err(format!("player spawn ({col}, {row}) is outside the level"));
        }
        Ok(())
    }

    pub fn from_json_str(contents: &str) -> Result<Self, String> {
        let tilemap: Tilemap =
            serde_json::from_str(contents).map_err(|e| format!("invalid level: {e}"))?;
        tilemap.validate()?;
        Ok(tilemap)
    }

    /// Build a level from text rows, top row first.
    /// `#` solid, `^` hazard, `P` player spawn, `.` or space empty.
    pub fn from_rows(rows: &[&str]) -> Result<Self, String> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.chars().count());
        let mut tilemap = Tilemap::empty(width, height);
        let mut spawn = None;

        for (row, line) in rows.iter().enumerate() {
            if line.chars().count() != width {
                return Err(format!(
                    "row {row} has {} columns, expected {width}",
                    line.chars().count()
                ));
            }
            for (col, ch) in line.chars().enumerate() {
                let (col, row) = (col as i32, row as i32);
                match ch {
                    '#' => tilemap.set(TileLayer::Terrain, col, row, TileKind::Solid),
                    '^' => tilemap.set(TileLayer::Hazards, col, row, TileKind::Hazard),
                    'P' => spawn = Some((col, row)),
                    '.' | ' ' => {}
                    other => return Err(format!("unknown tile '{other}' at ({col}, {row})")),
                }
            }
        }

        tilemap.player_spawn = spawn.unwrap_or((0, 0));
        tilemap.validate()?;
        Ok(tilemap)
    }

    /// A simple test level for development
    pub fn test_level() -> Self {
        let width = 48;
        let height = 12;
        let mut tilemap = Tilemap::empty(width, height);
        let (w, h) = (width as i32, height as i32);

        // Two rows of ground along the bottom
        for col in 0..w {
            for row in (h - 2)..h {
                tilemap.set(TileLayer::Terrain, col, row, TileKind::Solid);
            }
        }

        // Spike pit (x=12..15)
        for col in 12..15 {
            tilemap.set(TileLayer::Terrain, col, h - 2, TileKind::Empty);
            tilemap.set(TileLayer::Hazards, col, h - 2, TileKind::Hazard);
        }

        // Bottomless gap (x=24..27)
        for col in 24..27 {
            for row in (h - 2)..h {
                tilemap.set(TileLayer::Terrain, col, row, TileKind::Empty);
            }
        }

        // Floating platforms
        for col in 8..12 {
            tilemap.set(TileLayer::Terrain, col, 6, TileKind::Solid);
        }
        for col in 18..23 {
            tilemap.set(TileLayer::Terrain, col, 4, TileKind::Solid);
        }

        // Wall (x=32, three tiles high)
        for row in (h - 5)..(h - 2) {
            tilemap.set(TileLayer::Terrain, 32, row, TileKind::Solid);
        }

        tilemap.player_spawn = (3, h - 3);
        tilemap
    }
}

/// A layer may only hold empty cells and its own kind of tile.
fn check_layer_codes(name: &str, cells: &[u8], allowed: TileKind) -> Result<(), String> {
    match cells
        .iter()
        .position(|&id| id != TileKind::Empty as u8 && id != allowed as u8)
    {
        Some(i) => Err(format!(
            "{name} layer has tile code {} at index {i}, expected {} or {}",
            cells[i],
            TileKind::Empty as u8,
            allowed as u8
        )),
        None => Ok(()),
    }
}

impl TileQuery for Tilemap {
    fn bounds(&self) -> MapBounds {
        MapBounds {
            width_tiles: self.width as i32,
            height_tiles: self.height as i32,
            tile_size: Vec2::new(self.tile_width, self.tile_height),
        }
    }

    fn tile_at(&self, coord: TileCoord, layer: TileLayer) -> Option<Tile> {
        match self.get(layer, coord.col, coord.row) {
            TileKind::Empty => None,
            kind => Some(Tile {
                frame: self.bounds().tile_frame(coord),
                kind,
            }),
        }
    }
}
