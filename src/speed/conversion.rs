/// Centimeters in a kilometer
const CM_PER_KM: f64 = 100_000.0;

/// Convert a pixel displacement observed over `time_interval_secs` into km/s.
///
/// `ground_sample_distance_cm` is the ground distance covered by one pixel.
/// The caller guarantees a positive interval.
pub fn to_speed(pixel_distance: f64, ground_sample_distance_cm: f64, time_interval_secs: f64) -> f64 {
    let distance_km = pixel_distance * ground_sample_distance_cm / CM_PER_KM;
    distance_km / time_interval_secs
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn converts_centimeters_per_pixel() {
        // 100 px at 1000 cm/px = 1 km, over 2 s
        assert_relative_eq!(to_speed(100.0, 1000.0, 2.0), 0.5);
    }

    #[test]
    fn zero_displacement_is_zero_speed() {
        assert_eq!(to_speed(0.0, 12648.0, 2.0), 0.0);
    }
}
