use crate::models::player::circles_overlap;

/// A consumable world object. Its id is the key it lives under in the spore registry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spore {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl Spore {
    pub fn overlaps(&self, x: f64, y: f64, radius: f64) -> bool {
        circles_overlap(self.x, self.y, self.radius, x, y, radius)
    }
}
