//! Closed-form reprojection from BC Albers (EPSG:3005) to Web Mercator
//! (EPSG:3857).
//!
//! Source geometries arrive in BC Albers, an Albers equal-area conic on the
//! GRS80 ellipsoid. The spatial sink publishes Web Mercator, so each
//! coordinate goes through the ellipsoidal inverse Albers (Snyder's
//! formulation) and then the spherical Mercator forward.

use geo::{Coord, Geometry, MapCoords};

/// Semi-major axis shared by GRS80 and the Web Mercator sphere (metres).
const SEMI_MAJOR: f64 = 6_378_137.0;
/// GRS80 flattening.
const FLATTENING: f64 = 1.0 / 298.257_222_101;

/// EPSG:3005 parameters.
const LAT_ORIGIN_DEG: f64 = 45.0;
const LAT_PARALLEL_1_DEG: f64 = 50.0;
const LAT_PARALLEL_2_DEG: f64 = 58.5;
const LON_ORIGIN_DEG: f64 = -126.0;
const FALSE_EASTING: f64 = 1_000_000.0;
const FALSE_NORTHING: f64 = 0.0;

const CONVERGENCE: f64 = 1e-12;
const MAX_ITERATIONS: usize = 16;

/// Precomputed Albers constants for the EPSG:3005 parameter set.
struct BcAlbers {
    e: f64,
    e2: f64,
    n: f64,
    c: f64,
    rho0: f64,
}

impl BcAlbers {
    fn new() -> Self {
        let e2 = FLATTENING * (2.0 - FLATTENING);
        let e = e2.sqrt();
        let phi0 = LAT_ORIGIN_DEG.to_radians();
        let phi1 = LAT_PARALLEL_1_DEG.to_radians();
        let phi2 = LAT_PARALLEL_2_DEG.to_radians();

        let m1 = m(phi1, e2);
        let m2 = m(phi2, e2);
        let q0 = q(phi0, e, e2);
        let q1 = q(phi1, e, e2);
        let q2 = q(phi2, e, e2);

        let n = (m1 * m1 - m2 * m2) / (q2 - q1);
        let c = m1 * m1 + n * q1;
        let rho0 = SEMI_MAJOR * (c - n * q0).sqrt() / n;
        Self { e, e2, n, c, rho0 }
    }

    /// Inverse projection: planar (x, y) metres → (longitude, latitude) radians.
    fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let dx = x - FALSE_EASTING;
        let dy = y - FALSE_NORTHING;
        let rho_y = self.rho0 - dy;
        let rho = (dx * dx + rho_y * rho_y).sqrt();
        let theta = dx.atan2(rho_y);
        let q = (self.c - (rho * self.n / SEMI_MAJOR).powi(2)) / self.n;

        let mut phi = (q / 2.0).clamp(-1.0, 1.0).asin();
        for _ in 0..MAX_ITERATIONS {
            let sin = phi.sin();
            let one_minus = 1.0 - self.e2 * sin * sin;
            let delta = (one_minus * one_minus / (2.0 * phi.cos()))
                * (q / (1.0 - self.e2) - sin / one_minus
                    + (1.0 / (2.0 * self.e))
                        * ((1.0 - self.e * sin) / (1.0 + self.e * sin)).ln());
            phi += delta;
            if delta.abs() < CONVERGENCE {
                break;
            }
        }

        let lambda = LON_ORIGIN_DEG.to_radians() + theta / self.n;
        (lambda, phi)
    }
}

fn m(phi: f64, e2: f64) -> f64 {
    phi.cos() / (1.0 - e2 * phi.sin() * phi.sin()).sqrt()
}

fn q(phi: f64, e: f64, e2: f64) -> f64 {
    let sin = phi.sin();
    (1.0 - e2)
        * (sin / (1.0 - e2 * sin * sin)
            - (1.0 / (2.0 * e)) * ((1.0 - e * sin) / (1.0 + e * sin)).ln())
}

/// Spherical Mercator forward: (longitude, latitude) radians → metres.
fn web_mercator(lambda: f64, phi: f64) -> (f64, f64) {
    let x = SEMI_MAJOR * lambda;
    let y = SEMI_MAJOR * (std::f64::consts::FRAC_PI_4 + phi / 2.0).tan().ln();
    (x, y)
}

/// Transform one BC Albers coordinate to Web Mercator.
pub fn coord_to_web_mercator(coord: Coord<f64>) -> Coord<f64> {
    let albers = BcAlbers::new();
    let (lambda, phi) = albers.inverse(coord.x, coord.y);
    let (x, y) = web_mercator(lambda, phi);
    Coord { x, y }
}

/// Transform every coordinate of a geometry from BC Albers to Web Mercator.
pub fn geometry_to_web_mercator(geometry: &Geometry<f64>) -> Geometry<f64> {
    let albers = BcAlbers::new();
    geometry.map_coords(|coord| {
        let (lambda, phi) = albers.inverse(coord.x, coord.y);
        let (x, y) = web_mercator(lambda, phi);
        Coord { x, y }
    })
}
