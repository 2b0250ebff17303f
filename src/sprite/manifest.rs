//! JSON record written next to a sprite so renderers can map grid cells back to people.

use serde::{Deserialize, Serialize};

use crate::layout::Layout;
use crate::source::Tile;

pub const MANIFEST_VERSION: u32 = 1;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub name: String,
    /// `false` when the cell holds a transparent placeholder.
    pub image: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SpriteManifest {
    pub version: u32,
    pub tile_size: u32,
    pub tiles_per_row: u32,
    pub row_count: u32,
    pub tile_count: usize,
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Same order as the tiles on the canvas (row-major).
    pub entries: Vec<ManifestEntry>,
}

impl SpriteManifest {
    pub fn new(layout: &Layout, tiles: &[Tile]) -> Self {
        Self {
            version: MANIFEST_VERSION,
            tile_size: layout.tile_size,
            tiles_per_row: layout.tiles_per_row,
            row_count: layout.row_count,
            tile_count: layout.tile_count,
            canvas_width: layout.canvas_width,
            canvas_height: layout.canvas_height,
            entries: tiles.iter().map(|t| ManifestEntry { name: t.id.clone(), image: t.has_image }).collect(),
        }
    }

    /// Entry drawn at canvas pixel `(x, y)`.
    pub fn lookup(&self, x: u32, y: u32) -> Option<&ManifestEntry> {
        if self.tile_size == 0 || x >= self.canvas_width || y >= self.canvas_height {
            return None;
        }
        let index = (y / self.tile_size) as usize * self.tiles_per_row as usize + (x / self.tile_size) as usize;
        self.entries.get(index)
    }

    /// Human-readable inconsistencies between the recorded geometry and the entries.
    pub fn check(&self) -> Vec<String> {
        let mut w = Vec::new();
        if self.entries.len() != self.tile_count {
            w.push(format!("{} entries but tileCount {}", self.entries.len(), self.tile_count));
        }
        if self.tile_size == 0 || self.tiles_per_row == 0 {
            w.push("tileSize and tilesPerRow must be > 0".into());
            return w;
        }
        let per_row = self.tiles_per_row as usize;
        let expected_rows = self.tile_count.div_ceil(per_row);
        if self.row_count as usize != expected_rows {
            w.push(format!("rowCount {} but {} tiles need {expected_rows} rows", self.row_count, self.tile_count));
        }
        match self.row_count.checked_mul(self.tile_size) {
            Some(h) if h == self.canvas_height => {}
            Some(_) => w.push(format!("canvasHeight {} != rowCount*tileSize", self.canvas_height)),
            None => w.push(format!("rowCount {} * tileSize {} overflows u32", self.row_count, self.tile_size)),
        }
        let columns = u32::try_from(self.tile_count.min(per_row)).unwrap_or(u32::MAX);
        match columns.checked_mul(self.tile_size) {
            Some(cw) if cw == self.canvas_width => {}
            Some(_) => w.push(format!("canvasWidth {} != {columns} columns * tileSize", self.canvas_width)),
            None => w.push(format!("{columns} columns * tileSize {} overflows u32", self.tile_size)),
        }
        w
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::compute_layout;

    fn tiles(n: usize) -> Vec<Tile> {
        (0..n)
            .map(|i| {
                let mut t = Tile::placeholder(format!("user{i}"), 8);
                t.has_image = i % 2 == 0;
                t
            })
            .collect()
    }

    #[test]
    fn serializes_with_camel_case_geometry() {
        let layout = compute_layout(3, 8, 16).unwrap();
        let m = SpriteManifest::new(&layout, &tiles(3));
        let js = serde_json::to_value(&m).unwrap();
        assert_eq!(js["tilesPerRow"], 2);
        assert_eq!(js["rowCount"], 2);
        assert_eq!(js["tileSize"], 8);
        assert_eq!(js["entries"][1], serde_json::json!({"name": "user1", "image": false}));
        assert!(m.check().is_empty(), "{:?}", m.check());
    }

    #[test]
    fn lookup_maps_pixels_back_to_entries() {
        let layout = compute_layout(5, 8, 24).unwrap(); // 3 per row
        let m = SpriteManifest::new(&layout, &tiles(5));
        assert_eq!(m.lookup(0, 0).unwrap().name, "user0");
        assert_eq!(m.lookup(23, 7).unwrap().name, "user2");
        assert_eq!(m.lookup(9, 9).unwrap().name, "user4");
        assert!(m.lookup(17, 9).is_none()); // empty cell in last row
        assert!(m.lookup(24, 0).is_none());
    }

    #[test]
    fn check_reports_mismatched_geometry() {
        let layout = compute_layout(4, 8, 16).unwrap();
        let mut m = SpriteManifest::new(&layout, &tiles(4));
        m.row_count = 3;
        m.entries.pop();
        let w = m.check();
        assert_eq!(w.len(), 3, "{w:?}");
    }

    #[test]
    fn check_reports_overflowing_geometry_instead_of_panicking() {
        let m: SpriteManifest = serde_json::from_value(serde_json::json!({
            "version": 1,
            "tileSize": 65536,
            "tilesPerRow": 1,
            "rowCount": 65536,
            "tileCount": 65536,
            "canvasWidth": 65536,
            "canvasHeight": 0,
            "entries": []
        }))
        .unwrap();
        let w = m.check();
        assert!(w.iter().any(|s| s.contains("overflows")), "{w:?}");
        assert!(w.iter().any(|s| s.contains("tileCount 65536")), "{w:?}");
    }
}
