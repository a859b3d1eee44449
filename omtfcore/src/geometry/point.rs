use nalgebra::{Point3, Vector3};

/// A point in the local frame of a single chamber, in centimeters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl LocalPoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        LocalPoint { x, y, z }
    }
}

/// A point in the global detector frame, in centimeters.
///
/// The beam line runs along z; `eta` and `phi` are the usual collider
/// coordinates of the position vector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlobalPoint(Point3<f64>);

impl GlobalPoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        GlobalPoint(Point3::new(x, y, z))
    }

    /// Builds a point from polar coordinates.
    ///
    /// # Arguments
    ///
    /// * `theta` - polar angle measured from the +z axis.
    /// * `phi` - azimuth.
    /// * `mag` - distance from the origin.
    pub fn from_polar(theta: f64, phi: f64, mag: f64) -> Self {
        GlobalPoint(Point3::new(
            mag * theta.sin() * phi.cos(),
            mag * theta.sin() * phi.sin(),
            mag * theta.cos(),
        ))
    }

    pub fn x(&self) -> f64 {
        self.0.x
    }

    pub fn y(&self) -> f64 {
        self.0.y
    }

    pub fn z(&self) -> f64 {
        self.0.z
    }

    /// Distance from the beam line.
    pub fn perp(&self) -> f64 {
        self.0.x.hypot(self.0.y)
    }

    /// Distance from the origin.
    pub fn mag(&self) -> f64 {
        Vector3::new(self.0.x, self.0.y, self.0.z).norm()
    }

    /// Polar angle measured from the +z axis, in [0, pi].
    pub fn theta(&self) -> f64 {
        self.perp().atan2(self.0.z)
    }

    /// Azimuth in (-pi, pi].
    pub fn phi(&self) -> f64 {
        self.0.y.atan2(self.0.x)
    }

    /// Pseudorapidity, -ln tan(theta / 2).
    pub fn eta(&self) -> f64 {
        -(self.theta() / 2.0).tan().ln()
    }
}
