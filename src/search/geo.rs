use crate::core::types::GeoPoint;

/// Earth radius in meters used for all distance math
pub const EARTH_RADIUS_METERS: f64 = 6_378_100.0;

/// Slack added to bounding boxes so points exactly on the radius survive
/// floating point error in the cover computation
const BOX_PADDING_DEGREES: f64 = 1e-9;

/// Great-circle distance in meters
pub fn haversine_distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().min(1.0).asin()
}

/// Inclusive longitude/latitude rectangle in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lng: f64,
    pub max_lng: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn contains(&self, point: &GeoPoint) -> bool {
        point.lng >= self.min_lng && point.lng <= self.max_lng
            && point.lat >= self.min_lat && point.lat <= self.max_lat
    }
}

/// Rectangles that together contain every point within `radius` meters of
/// `center`. Crossing the antimeridian yields two boxes; reaching a pole
/// widens longitude to the full circle.
pub fn bounding_boxes(center: &GeoPoint, radius: f64) -> Vec<BoundingBox> {
    let angular = radius / EARTH_RADIUS_METERS;
    let delta_lat = angular.to_degrees();

    let min_lat = (center.lat - delta_lat - BOX_PADDING_DEGREES).max(-90.0);
    let max_lat = (center.lat + delta_lat + BOX_PADDING_DEGREES).min(90.0);

    let full_circle = |min_lat, max_lat| vec![BoundingBox { min_lng: -180.0, max_lng: 180.0, min_lat, max_lat }];

    if angular >= std::f64::consts::PI || min_lat <= -90.0 || max_lat >= 90.0 {
        return full_circle(min_lat, max_lat);
    }

    let ratio = angular.sin() / center.lat.to_radians().cos();
    if !ratio.is_finite() || ratio >= 1.0 {
        return full_circle(min_lat, max_lat);
    }
    let delta_lng = ratio.asin().to_degrees() + BOX_PADDING_DEGREES;

    let min_lng = center.lng - delta_lng;
    let max_lng = center.lng + delta_lng;

    if min_lng < -180.0 {
        vec![
            BoundingBox { min_lng: min_lng + 360.0, max_lng: 180.0, min_lat, max_lat },
            BoundingBox { min_lng: -180.0, max_lng, min_lat, max_lat },
        ]
    } else if max_lng > 180.0 {
        vec![
            BoundingBox { min_lng, max_lng: 180.0, min_lat, max_lat },
            BoundingBox { min_lng: -180.0, max_lng: max_lng - 360.0, min_lat, max_lat },
        ]
    } else {
        vec![BoundingBox { min_lng, max_lng, min_lat, max_lat }]
    }
}
