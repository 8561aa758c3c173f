//! Bounded tile grid.
//!
//! Cell `(x, y)` covers the unit square `[x, x+1] × [y, y+1]`.  Cells outside
//! the grid are open for collision and end a raycast without a hit.

use crate::definitions::{DefinitionLibrary, TileDefinition};
use crate::error::{SimError, SimResult};
use crate::geometry::{raycast_vs_tile_grid, Ray3, RayImpact};
use bevy::math::{IVec2, Vec2};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct TileGrid {
    dimensions: IVec2,
    tiles: Vec<Arc<TileDefinition>>,
}

impl TileGrid {
    /// Build from layout rows; `rows[0]` becomes `y = 0`.
    pub fn from_rows(
        map_name: &str,
        rows: &[String],
        legend: &BTreeMap<String, String>,
        library: &DefinitionLibrary,
    ) -> SimResult<Self> {
        let mut symbols: HashMap<char, Arc<TileDefinition>> = HashMap::new();
        for (key, tile_name) in legend {
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(symbol), None) => {
                    symbols.insert(symbol, Arc::clone(library.tile(tile_name)?));
                }
                _ => {
                    return Err(SimError::DefinitionParse {
                        source_name: map_name.to_string(),
                        message: format!("legend key '{key}' must be a single character"),
                    })
                }
            }
        }

        let width = rows.first().map_or(0, |row| row.chars().count());
        let mut tiles = Vec::with_capacity(width * rows.len());
        for (y, row) in rows.iter().enumerate() {
            if row.chars().count() != width {
                return Err(SimError::RaggedTileRows {
                    map: map_name.to_string(),
                    row: y,
                });
            }
            for symbol in row.chars() {
                let tile = symbols.get(&symbol).ok_or_else(|| SimError::UnknownTileSymbol {
                    map: map_name.to_string(),
                    symbol,
                })?;
                tiles.push(Arc::clone(tile));
            }
        }

        Ok(Self {
            dimensions: IVec2::new(width as i32, rows.len() as i32),
            tiles,
        })
    }

    pub fn dimensions(&self) -> IVec2 {
        self.dimensions
    }

    #[inline]
    pub fn in_bounds(&self, cell: IVec2) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.dimensions.x && cell.y < self.dimensions.y
    }

    fn index(&self, cell: IVec2) -> Option<usize> {
        self.in_bounds(cell)
            .then(|| (cell.x + cell.y * self.dimensions.x) as usize)
    }

    pub fn tile(&self, cell: IVec2) -> Option<&TileDefinition> {
        self.index(cell).map(|i| self.tiles[i].as_ref())
    }

    pub fn is_solid(&self, cell: IVec2) -> bool {
        self.tile(cell).is_some_and(|t| t.is_solid)
    }

    /// `(min, max)` corners of a cell.
    pub fn cell_bounds(cell: IVec2) -> (Vec2, Vec2) {
        let min = cell.as_vec2();
        (min, min + Vec2::ONE)
    }

    pub fn raycast(&self, ray: &Ray3) -> Option<RayImpact> {
        raycast_vs_tile_grid(ray, |c| self.in_bounds(c), |c| self.is_solid(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> DefinitionLibrary {
        let mut library = DefinitionLibrary::default();
        library.insert_tile(TileDefinition {
            name: "Wall".into(),
            is_solid: true,
            ..Default::default()
        });
        library.insert_tile(TileDefinition {
            name: "Floor".into(),
            ..Default::default()
        });
        library
    }

    fn legend() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("#".to_string(), "Wall".to_string()),
            (".".to_string(), "Floor".to_string()),
        ])
    }

    #[test]
    fn first_row_is_y_zero() {
        let rows = vec!["#..".to_string(), "...".to_string()];
        let grid = TileGrid::from_rows("test", &rows, &legend(), &library()).unwrap();
        assert_eq!(grid.dimensions(), IVec2::new(3, 2));
        assert!(grid.is_solid(IVec2::new(0, 0)));
        assert!(!grid.is_solid(IVec2::new(0, 1)));
        assert!(!grid.is_solid(IVec2::new(-1, 0)));
    }

    #[test]
    fn ragged_rows_and_unknown_symbols_are_rejected() {
        let ragged = vec!["###".to_string(), "#.".to_string()];
        assert_eq!(
            TileGrid::from_rows("r", &ragged, &legend(), &library()).unwrap_err(),
            SimError::RaggedTileRows {
                map: "r".into(),
                row: 1
            }
        );
        let unknown = vec!["#?#".to_string()];
        assert!(matches!(
            TileGrid::from_rows("u", &unknown, &legend(), &library()),
            Err(SimError::UnknownTileSymbol { symbol: '?', .. })
        ));
    }
}
