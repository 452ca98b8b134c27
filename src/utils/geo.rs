use ::geo::{Distance, Geodesic, Point};

/// Radius used to turn a central angle into a distance that never exceeds the
/// WGS-84 geodesic distance for the same pair of points. Sits below the
/// smallest radius of curvature of the ellipsoid (6 335 439 m at the equator,
/// meridional) with margin for treating geodetic latitude as spherical.
const LOWER_BOUND_RADIUS_M: f64 = 6_300_000.0;

pub const MIN_LONGITUDE: f64 = -180.0;
pub const MAX_LONGITUDE: f64 = 180.0;
pub const MIN_LATITUDE: f64 = -90.0;
pub const MAX_LATITUDE: f64 = 90.0;

/// Geodesic distance on the WGS-84 ellipsoid between two (lon, lat) points.
/// Returns distance in meters
pub fn geodesic_distance(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    Geodesic::distance(Point::new(lon1, lat1), Point::new(lon2, lat2))
}

pub fn is_valid_longitude(lon: f64) -> bool {
    lon.is_finite() && (MIN_LONGITUDE..=MAX_LONGITUDE).contains(&lon)
}

pub fn is_valid_latitude(lat: f64) -> bool {
    lat.is_finite() && (MIN_LATITUDE..=MAX_LATITUDE).contains(&lat)
}

/// Position of (lon, lat) on the unit sphere.
///
/// Straight-line distance between two such vectors grows monotonically with
/// the great-circle angle between them, which lets a plain Cartesian R-tree
/// answer nearest-neighbor queries without any seam at the antimeridian or
/// singularity at the poles.
pub fn unit_vector(lon: f64, lat: f64) -> [f64; 3] {
    let (lon, lat) = (lon.to_radians(), lat.to_radians());
    [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
}

/// Lower bound, in meters, for the geodesic distance between two points whose
/// unit vectors are `chord_2.sqrt()` apart.
pub fn geodesic_lower_bound(chord_2: f64) -> f64 {
    let half_chord = (chord_2.max(0.0).sqrt() / 2.0).min(1.0);
    let central_angle = 2.0 * half_chord.asin();
    LOWER_BOUND_RADIUS_M * central_angle
}
