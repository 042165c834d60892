//! Run configuration: grid size, generation count, seed placement.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pattern::{Pattern, Shape};

fn default_shape() -> Shape {
    Shape::Glider
}

/// Where the seed pattern goes, in global coordinates of its top-left cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    #[serde(default = "default_shape")]
    pub shape: Shape,
    pub row: usize,
    pub col: usize,
}

/// Everything a worker needs to know before it allocates its slab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Cells per row.
    pub width: usize,
    /// Global number of rows.
    pub height: usize,
    /// Generations to run.
    pub iterations: u32,
    pub pattern: Placement,
    /// Gather and emit the whole grid every this many generations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_every: Option<u32>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::centered(3000, 3000, 5000, Shape::Glider)
    }
}

impl SimulationConfig {
    /// A `width` x `height` run with `shape` roughly centred on the grid.
    pub fn centered(width: usize, height: usize, iterations: u32, shape: Shape) -> Self {
        let cols = shape.pattern().map(|p| p.cols()).unwrap_or(0);
        SimulationConfig {
            width,
            height,
            iterations,
            pattern: Placement {
                shape,
                row: height / 2,
                col: (width / 2).saturating_sub(cols / 2),
            },
            output_every: None,
        }
    }

    /// Check sizes and placement, returning the parsed seed pattern.
    ///
    /// Worker counts are checked separately by [`crate::partition::decompose`],
    /// since they come from the launcher rather than the config.
    pub fn validate(&self) -> Result<Pattern, ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyGrid {
                width: self.width,
                height: self.height,
            });
        }
        if self.output_every == Some(0) {
            return Err(ConfigError::ZeroOutputEvery);
        }

        let pattern = self.pattern.shape.pattern()?;
        let fits = |offset: usize, len: usize, limit: usize| {
            offset.checked_add(len).map_or(false, |end| end <= limit)
        };
        if !fits(self.pattern.row, pattern.rows(), self.height)
            || !fits(self.pattern.col, pattern.cols(), self.width)
        {
            return Err(ConfigError::PatternOutOfBounds {
                rows: pattern.rows(),
                cols: pattern.cols(),
                row: self.pattern.row,
                col: self.pattern.col,
                width: self.width,
                height: self.height,
            });
        }
        Ok(pattern)
    }

    /// Whether generation `generation` (0-based) is an output generation.
    pub fn is_output_generation(&self, generation: u32) -> bool {
        match self.output_every {
            Some(every) if every > 0 => (generation + 1) % every == 0,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_places_glider_at_the_centre() {
        let config = SimulationConfig::default();
        assert_eq!((config.width, config.height, config.iterations), (3000, 3000, 5000));
        assert_eq!((config.pattern.row, config.pattern.col), (1500, 1499));
        assert_eq!(config.validate().unwrap().population(), 5);
    }

    #[test]
    fn defaults_round_trip_through_json() {
        let config = SimulationConfig::default();
        let text = serde_json::to_string_pretty(&config).unwrap();
        let back: SimulationConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn shape_defaults_to_glider() {
        let json = r#"{"width":8,"height":8,"iterations":4,"pattern":{"row":1,"col":2}}"#;
        let config: SimulationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.pattern.shape, Shape::Glider);
        assert_eq!(config.output_every, None);
    }

    #[test]
    fn pattern_must_fit() {
        let mut config = SimulationConfig::centered(10, 10, 1, Shape::Glider);
        config.pattern.row = 8;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::PatternOutOfBounds { row: 8, .. })
        ));
        config.pattern.row = 7;
        config.pattern.col = usize::MAX;
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_grids_and_zero_output_are_rejected() {
        let config = SimulationConfig::centered(0, 10, 1, Shape::Block);
        assert!(matches!(config.validate(), Err(ConfigError::EmptyGrid { .. })));

        let mut config = SimulationConfig::centered(10, 10, 1, Shape::Block);
        config.output_every = Some(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroOutputEvery));
    }

    #[test]
    fn output_generations() {
        let mut config = SimulationConfig::centered(10, 10, 10, Shape::Block);
        assert!(!config.is_output_generation(0));
        config.output_every = Some(5);
        let hits: Vec<u32> = (0..10).filter(|&g| config.is_output_generation(g)).collect();
        assert_eq!(hits, vec![4, 9]);
    }
}
