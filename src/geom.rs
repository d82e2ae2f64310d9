use std::fmt;
use std::str::FromStr;

use glam::Vec3A;

use crate::error::ConvertError;

/// An axis-aligned bounding volume accumulator.
///
/// A range starts out invalid (no points seen) and becomes valid once a point
/// is inserted or a valid range is merged into it. `min`, `max`, `size`, and
/// `center` are only meaningful while `is_valid()` holds; callers must guard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range3 {
    min: Vec3A,
    max: Vec3A,
}

impl Range3 {
    /// Creates an invalid range. Inverted infinite bounds make the first
    /// inserted point snap both corners.
    pub fn empty() -> Self {
        Self {
            min: Vec3A::splat(f32::INFINITY),
            max: Vec3A::splat(f32::NEG_INFINITY),
        }
    }

    /// Folds every point of the iterator into a fresh range. An empty
    /// iterator yields an invalid range.
    pub fn from_points(points: impl IntoIterator<Item = Vec3A>) -> Self {
        let mut range = Self::empty();
        for point in points {
            range.insert(point);
        }
        range
    }

    /// Grows the range to include a point.
    pub fn insert(&mut self, point: Vec3A) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Merges another range into this one. Invalid operands leave the
    /// receiver unchanged, so validity propagates through unions.
    pub fn union_with(&mut self, other: &Range3) {
        if other.is_valid() {
            self.min = self.min.min(other.min);
            self.max = self.max.max(other.max);
        }
    }

    pub fn is_valid(&self) -> bool {
        self.min.cmple(self.max).all()
    }

    pub fn min(&self) -> Vec3A {
        self.min
    }

    pub fn max(&self) -> Vec3A {
        self.max
    }

    pub fn size(&self) -> Vec3A {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3A {
        (self.min + self.max) * 0.5
    }
}

impl Default for Range3 {
    fn default() -> Self {
        Self::empty()
    }
}

/// One of the three coordinate axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn of(self, v: Vec3A) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
            Axis::Z => v.z,
        }
    }

    fn letter(self) -> char {
        match self {
            Axis::X => 'x',
            Axis::Y => 'y',
            Axis::Z => 'z',
        }
    }
}

/// A parsed axis-remap spec. Each output component names the source axis it
/// draws from and whether the sign flips, e.g. `x-zy` maps X to X, Y to -Z,
/// and Z to Y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Swizzle {
    components: [(Axis, bool); 3],
}

impl Swizzle {
    pub fn apply(&self, v: Vec3A) -> Vec3A {
        let component = |(axis, negate): (Axis, bool)| {
            if negate {
                -axis.of(v)
            } else {
                axis.of(v)
            }
        };

        Vec3A::new(
            component(self.components[0]),
            component(self.components[1]),
            component(self.components[2]),
        )
    }
}

impl FromStr for Swizzle {
    type Err = ConvertError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let malformed = || ConvertError::Config(format!("malformed swizzle spec: {:?}", spec));

        let mut chars = spec.chars().peekable();
        let mut components = [(Axis::X, false); 3];

        for component in &mut components {
            let negate = match chars.peek() {
                Some('-') => {
                    chars.next();
                    true
                }
                Some('+') => {
                    chars.next();
                    false
                }
                _ => false,
            };

            let axis = match chars.next() {
                Some('x') | Some('X') => Axis::X,
                Some('y') | Some('Y') => Axis::Y,
                Some('z') | Some('Z') => Axis::Z,
                _ => return Err(malformed()),
            };

            *component = (axis, negate);
        }

        if chars.next().is_some() {
            return Err(malformed());
        }

        Ok(Self { components })
    }
}

impl fmt::Display for Swizzle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &(axis, negate) in &self.components {
            if negate {
                write!(f, "-")?;
            }
            write!(f, "{}", axis.letter())?;
        }
        Ok(())
    }
}
