use serde::Serialize;

/// Integer pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn scaled(self, factor: i32) -> Self {
        Self {
            x: self.x.saturating_mul(factor),
            y: self.y.saturating_mul(factor),
        }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// One detected capstone as reported by the log, in original image resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Capstone {
    pub id: u32,
    pub center: Option<Point>,
    pub corners: Vec<Point>,
}

impl Capstone {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            center: None,
            corners: Vec::new(),
        }
    }

    /// A record worth keeping carries a center or at least one corner.
    pub fn has_geometry(&self) -> bool {
        self.center.is_some() || !self.corners.is_empty()
    }

    pub fn label(&self) -> String {
        format!("#{}", self.id)
    }

    pub fn scaled_corners(&self, factor: i32) -> Vec<Point> {
        self.corners.iter().map(|p| p.scaled(factor)).collect()
    }

    pub fn scaled_center(&self, factor: i32) -> Option<Point> {
        self.center.map(|p| p.scaled(factor))
    }
}
