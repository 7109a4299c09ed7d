use std::time::Duration;

use hyp_engine::coords::Color;

/// Game of Life demo settings.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub rows: usize,
    pub cols: usize,

    /// World-space size of the board; the camera maps it onto the window.
    pub world_width: f32,
    pub world_height: f32,

    /// Time between generations.
    pub step_interval: Duration,

    /// Fraction of cells alive after seeding.
    pub density: f64,
    /// Fixed RNG seed; `None` seeds from the OS.
    pub seed: Option<u64>,

    pub clear_color: Color,
    pub alive_color: Color,
    pub dead_color: Color,
    pub grid_color: Color,
    pub show_grid: bool,

    pub light_radius: f32,
    pub light_intensity: f32,
}

impl GameConfig {
    pub fn cell_width(&self) -> f32 {
        self.world_width / self.cols.max(1) as f32
    }

    pub fn cell_height(&self) -> f32 {
        self.world_height / self.rows.max(1) as f32
    }

    /// Board cell under a world-space point.
    pub fn cell_at(&self, x: f32, y: f32) -> Option<(usize, usize)> {
        if !(0.0..self.world_width).contains(&x) || !(0.0..self.world_height).contains(&y) {
            return None;
        }
        let col = (x / self.cell_width()) as usize;
        let row = (y / self.cell_height()) as usize;
        (row < self.rows && col < self.cols).then_some((row, col))
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rows: 50,
            cols: 50,
            world_width: 600.0,
            world_height: 600.0,
            step_interval: Duration::from_millis(500),
            density: 0.5,
            seed: None,
            clear_color: Color::new(0.3, 0.4, 0.1, 1.0),
            alive_color: Color::WHITE,
            dead_color: Color::BLACK,
            grid_color: Color::new(0.25, 0.25, 0.25, 1.0),
            show_grid: true,
            light_radius: 180.0,
            light_intensity: 1.6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cells_are_twelve_pixels() {
        let cfg = GameConfig::default();
        assert_eq!(cfg.cell_width(), 12.0);
        assert_eq!(cfg.cell_height(), 12.0);
    }

    #[test]
    fn cell_lookup() {
        let cfg = GameConfig::default();
        assert_eq!(cfg.cell_at(0.0, 0.0), Some((0, 0)));
        assert_eq!(cfg.cell_at(25.0, 13.0), Some((1, 2)));
        assert_eq!(cfg.cell_at(599.9, 599.9), Some((49, 49)));
        assert_eq!(cfg.cell_at(600.0, 10.0), None);
        assert_eq!(cfg.cell_at(-1.0, 10.0), None);
    }
}
