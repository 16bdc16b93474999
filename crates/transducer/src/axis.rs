//! Per-axis shaping: dead zone, clamp, offset removal, scale.
//!
//! Both axes go through the same steps; only the parameters differ.

/// Shaping parameters for one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisConfig {
    dead_zone: f64,
    max: f64,
    scale: f64,
}

impl AxisConfig {
    /// `scale` is pointer units per degree beyond the dead zone.
    pub fn new(dead_zone_degrees: f64, max_degrees: f64, scale: f64) -> Self {
        Self {
            dead_zone: dead_zone_degrees.abs(),
            max: max_degrees.abs(),
            scale,
        }
    }

    pub fn dead_zone(&self) -> f64 {
        self.dead_zone
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Inside the dead zone, boundary included.
    pub fn is_dead(&self, angle: f64) -> bool {
        angle.abs() <= self.dead_zone
    }

    /// Clamped angle with the dead-zone offset removed, in degrees.
    ///
    /// Zero at the dead-zone boundary and `±(max - dead_zone)` at the range
    /// limit. NaN maps to zero.
    pub fn shape(&self, angle: f64) -> f64 {
        if angle.is_nan() || self.is_dead(angle) {
            return 0.0;
        }
        let clamped = clamp_symmetric(angle, self.max);
        let magnitude = (clamped.abs() - self.dead_zone).max(0.0);
        magnitude.copysign(clamped)
    }

    /// Desired pointer offset for `angle`, in (fractional) pointer units.
    pub fn desired(&self, angle: f64) -> f64 {
        self.shape(angle) * self.scale
    }

    /// Largest integer step this axis may emit in one tick.
    pub fn step_bound(&self) -> f64 {
        let bound = (self.scale * (self.max - self.dead_zone).max(0.0)).round();
        if bound.is_finite() {
            bound.abs()
        } else {
            0.0
        }
    }
}

/// `value` limited to `[-bound, bound]`. Unlike `f64::clamp`, never panics.
fn clamp_symmetric(value: f64, bound: f64) -> f64 {
    value.max(-bound).min(bound)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaw() -> AxisConfig {
        AxisConfig::new(2.5, 28.5, 25.0)
    }

    #[test]
    fn test_dead_zone_boundary_is_inside() {
        let axis = yaw();
        assert!(axis.is_dead(2.5));
        assert!(axis.is_dead(-2.5));
        assert!(!axis.is_dead(2.5000001));
        assert_eq!(axis.desired(2.5), 0.0);
    }

    #[test]
    fn test_output_starts_at_zero_past_dead_zone() {
        let axis = yaw();
        let just_outside = axis.desired(2.6);
        assert!((just_outside - 0.1 * 25.0).abs() < 1e-9);
        assert!((axis.desired(-2.6) + 0.1 * 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_clamp_limits_output() {
        let axis = yaw();
        assert!((axis.desired(28.5) - 650.0).abs() < 1e-9);
        assert!((axis.desired(90.0) - 650.0).abs() < 1e-9);
        assert!((axis.desired(f64::NEG_INFINITY) + 650.0).abs() < 1e-9);
        assert_eq!(axis.step_bound(), 650.0);
    }

    #[test]
    fn test_nan_shapes_to_zero() {
        assert_eq!(yaw().shape(f64::NAN), 0.0);
    }

    #[test]
    fn test_zero_width_range() {
        let axis = AxisConfig::new(3.0, 3.0, 10.0);
        assert_eq!(axis.desired(45.0), 0.0);
        assert_eq!(axis.step_bound(), 0.0);
    }
}
