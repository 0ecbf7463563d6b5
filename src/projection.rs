//! Spherical Mercator matching d3's `geoMercator()` with
//! `.center()`, `.rotate()`, `.scale()` and `.translate()` applied.
//!
//! A geographic point is first rotated on the sphere, then projected with the
//! raw Mercator formula and finally scaled and shifted so that `center`
//! lands on `translate`. Screen y grows downward.

use crate::config::MapConfig;
use std::f64::consts::{FRAC_PI_2, PI, TAU};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    scale: f64,
    translate: [f64; 2],
    rotation: Rotation,
    // Raw Mercator coordinates of the center, before scaling.
    origin: [f64; 2],
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Rotation {
    lambda: f64,
    cos_phi: f64,
    sin_phi: f64,
    cos_gamma: f64,
    sin_gamma: f64,
    tilted: bool,
}

impl Rotation {
    fn new([lambda, phi, gamma]: [f64; 3]) -> Self {
        let (phi, gamma) = (phi.to_radians(), gamma.to_radians());
        Rotation {
            lambda: lambda.to_radians() % TAU,
            cos_phi: phi.cos(),
            sin_phi: phi.sin(),
            cos_gamma: gamma.cos(),
            sin_gamma: gamma.sin(),
            tilted: phi != 0.0 || gamma != 0.0,
        }
    }

    fn apply(&self, mut lambda: f64, phi: f64) -> (f64, f64) {
        lambda += self.lambda;
        if lambda.abs() > PI {
            lambda -= (lambda / TAU).round() * TAU;
        }
        if !self.tilted {
            return (lambda, phi);
        }

        let cos_phi = phi.cos();
        let x = lambda.cos() * cos_phi;
        let y = lambda.sin() * cos_phi;
        let z = phi.sin();
        let k = z * self.cos_phi + x * self.sin_phi;
        (
            (y * self.cos_gamma - k * self.sin_gamma).atan2(x * self.cos_phi - z * self.sin_phi),
            (k * self.cos_gamma + y * self.sin_gamma).clamp(-1.0, 1.0).asin(),
        )
    }
}

fn mercator_raw(lambda: f64, phi: f64) -> [f64; 2] {
    [lambda, ((FRAC_PI_2 + phi) / 2.0).tan().ln()]
}

impl Projection {
    pub fn new(center: [f64; 2], rotate: [f64; 3], scale: f64, translate: [f64; 2]) -> Self {
        Projection {
            scale,
            translate,
            rotation: Rotation::new(rotate),
            origin: mercator_raw(center[0].to_radians(), center[1].to_radians()),
        }
    }

    pub fn from_config(map: &MapConfig) -> Self {
        Self::new(map.center, map.rotate, map.scale, map.translate())
    }

    /// Projects `(longitude, latitude)` in degrees to screen `(x, y)`.
    ///
    /// Non-finite input yields non-finite output; callers that need a
    /// drawable position use [`Projection::project_finite`].
    pub fn project(&self, longitude: f64, latitude: f64) -> (f64, f64) {
        let (lambda, phi) = self
            .rotation
            .apply(longitude.to_radians(), latitude.to_radians());
        let [x, y] = mercator_raw(lambda, phi);
        (
            self.translate[0] + self.scale * (x - self.origin[0]),
            self.translate[1] - self.scale * (y - self.origin[1]),
        )
    }

    /// Like [`Projection::project`] but `None` for points that do not land on
    /// a finite screen position.
    pub fn project_finite(&self, longitude: f64, latitude: f64) -> Option<(f64, f64)> {
        let (x, y) = self.project(longitude, latitude);
        (x.is_finite() && y.is_finite()).then_some((x, y))
    }
}
