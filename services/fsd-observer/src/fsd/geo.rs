//! Great-circle helpers

/// Initial bearing from one position to another, rounded to whole degrees.
///
/// `None` when either position is not finite or both are the same point.
pub fn initial_bearing_deg(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Option<u16> {
    if ![lat1, lon1, lat2, lon2].iter().all(|v| v.is_finite()) {
        return None;
    }

    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let y = delta_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();
    if x == 0.0 && y == 0.0 {
        return None;
    }

    let bearing = (y.atan2(x).to_degrees() + 360.0) % 360.0;
    Some((bearing.round() as u16) % 360)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cardinal_bearings() {
        assert_eq!(initial_bearing_deg(50.0, 8.0, 51.0, 8.0), Some(0));
        assert_eq!(initial_bearing_deg(50.0, 8.0, 50.0, 9.0), Some(90));
        assert_eq!(initial_bearing_deg(50.0, 8.0, 49.0, 8.0), Some(180));
        assert_eq!(initial_bearing_deg(0.0, 8.0, 0.0, 7.0), Some(270));
    }

    #[test]
    fn test_same_point() {
        assert_eq!(initial_bearing_deg(50.0, 8.0, 50.0, 8.0), None);
    }

    #[test]
    fn test_non_finite() {
        assert_eq!(initial_bearing_deg(f64::NAN, 8.0, 50.0, 8.0), None);
    }
}
