use serde::{Deserialize, Serialize};

/// A pointer position in scene-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle used for point-in-region testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    #[serde(alias = "w")]
    pub width: i32,
    #[serde(alias = "h")]
    pub height: i32,
}

impl Region {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_well_formed(&self) -> bool {
        self.width >= 0 && self.height >= 0
    }

    /// Inclusive on all four edges.
    pub fn contains(&self, point: Point) -> bool {
        let (px, py) = (i64::from(point.x), i64::from(point.y));
        let (left, top) = (i64::from(self.x), i64::from(self.y));
        let right = left + i64::from(self.width);
        let bottom = top + i64::from(self.height);
        px >= left && px <= right && py >= top && py <= bottom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_is_inclusive_on_every_edge() {
        let region = Region::new(10, 10, 5, 5);
        for point in [
            Point::new(10, 10),
            Point::new(15, 10),
            Point::new(10, 15),
            Point::new(15, 15),
            Point::new(12, 12),
        ] {
            assert!(region.contains(point), "{:?} should be inside", point);
        }
        for point in [
            Point::new(9, 12),
            Point::new(16, 12),
            Point::new(12, 9),
            Point::new(12, 16),
        ] {
            assert!(!region.contains(point), "{:?} should be outside", point);
        }
    }

    #[test]
    fn test_zero_sized_region_contains_only_its_origin() {
        let region = Region::new(3, 4, 0, 0);
        assert!(region.contains(Point::new(3, 4)));
        assert!(!region.contains(Point::new(4, 4)));
    }

    #[test]
    fn test_extreme_coordinates_do_not_overflow() {
        let region = Region::new(i32::MAX - 1, i32::MAX - 1, i32::MAX, i32::MAX);
        assert!(region.contains(Point::new(i32::MAX, i32::MAX)));
        assert!(!region.contains(Point::new(0, 0)));
    }

    #[test]
    fn test_negative_size_is_not_well_formed() {
        assert!(Region::new(0, 0, 0, 0).is_well_formed());
        assert!(!Region::new(0, 0, -1, 4).is_well_formed());
        assert!(!Region::new(0, 0, 4, -1).is_well_formed());
    }

    #[test]
    fn test_short_size_keys_are_accepted() {
        let region: Region = serde_json::from_str(r#"{"x":1,"y":2,"w":3,"h":4}"#).unwrap();
        assert_eq!(region, Region::new(1, 2, 3, 4));
    }
}
