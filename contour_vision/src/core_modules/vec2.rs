// THEORY:
// The `Vec2` module is the small piece of linear algebra the tracer and the
// optimizer lean on. Direction changes are never measured as angles; both stages
// compare the dot product of two normalized vectors against a cosine cutoff.
// A dot product of 1.0 means "same direction", 0.0 means a right angle.
//
// Key architectural principles:
// 1.  **Value Semantics**: `Vec2` is `Copy`. Every operation returns a new vector
//     instead of mutating in place, so a reference direction captured once can be
//     compared against many candidates without being disturbed.
// 2.  **Explicit Degeneracy**: Normalizing a zero-length vector has no answer.
//     `normalized` returns `None` for it and callers decide what a missing
//     direction means for them.

pub mod vec2 {
    use crate::core_modules::line_segment::Point;

    /// A 2D direction or displacement in pixel units.
    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct Vec2 {
        pub x: f32,
        pub y: f32,
    }

    impl Vec2 {
        pub fn new(x: f32, y: f32) -> Self {
            Self { x, y }
        }

        /// The displacement that takes `a` to `b`.
        pub fn from_points(a: Point, b: Point) -> Self {
            Self {
                x: (b.x - a.x) as f32,
                y: (b.y - a.y) as f32,
            }
        }

        pub fn dot(&self, other: &Vec2) -> f32 {
            self.x * other.x + self.y * other.y
        }

        pub fn length(&self) -> f32 {
            (self.x * self.x + self.y * self.y).sqrt()
        }

        /// Unit vector in the same direction, or `None` for a zero vector.
        pub fn normalized(&self) -> Option<Vec2> {
            let len = self.length();
            if len == 0.0 || !len.is_finite() {
                return None;
            }
            let one_over_len = 1.0 / len;
            Some(Vec2 {
                x: self.x * one_over_len,
                y: self.y * one_over_len,
            })
        }

        pub fn sub(&self, other: &Vec2) -> Vec2 {
            Vec2 {
                x: self.x - other.x,
                y: self.y - other.y,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::vec2::Vec2;
    use crate::core_modules::line_segment::Point;

    #[test]
    fn from_points_is_end_minus_start() {
        let v = Vec2::from_points(Point::new(2, 3), Point::new(5, -1));
        assert_eq!(v, Vec2::new(3.0, -4.0));
        assert_eq!(v.length(), 5.0);
    }

    #[test]
    fn sub_is_component_wise() {
        let a = Vec2::new(10.0, 20.0);
        let b = Vec2::new(1.0, 2.0);
        assert_eq!(a.sub(&b), Vec2::new(9.0, 18.0));
        assert_eq!(b.sub(&a), Vec2::new(-9.0, -18.0));
    }

    #[test]
    fn normalized_has_unit_length() {
        let v = Vec2::new(3.0, 4.0).normalized().expect("non-zero vector");
        assert!((v.length() - 1.0).abs() < 1e-6);
        assert!((v.dot(&Vec2::new(0.6, 0.8)) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_has_no_direction() {
        assert_eq!(Vec2::default().normalized(), None);
    }

    #[test]
    fn perpendicular_vectors_have_zero_dot() {
        let right = Vec2::new(1.0, 0.0);
        let down = Vec2::new(0.0, 1.0);
        assert_eq!(right.dot(&down), 0.0);
        assert_eq!(right.dot(&Vec2::new(-1.0, 0.0)), -1.0);
    }
}
