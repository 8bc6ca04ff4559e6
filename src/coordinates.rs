//! Materialises lat/lng coordinate arrays from a grid template 0 record and
//! applies longitude normalisation.

use crate::sections::GridTemplate0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LongitudeFormat {
    /// No transform; values may exceed 360 or be negative by design of the source grid.
    Preserve,
    /// Normalise into `[0, 360)`.
    ZeroTo360,
    /// Normalise into `(-180, 180]`.
    NegOneEightyToOneEighty,
}

impl Default for LongitudeFormat {
    fn default() -> Self {
        LongitudeFormat::Preserve
    }
}

#[derive(Debug, Clone)]
pub struct GridInfo {
    pub ni: u32,
    pub nj: u32,
    pub lat: Vec<f32>,
    pub lng: Vec<f32>,
    pub lat_first: f64,
    pub lon_first: f64,
    pub lat_inc: f64,
    pub lng_inc: f64,
    pub lat_min: f32,
    pub lat_max: f32,
    pub lng_min: f32,
    pub lng_max: f32,
}

fn normalize_lng(mut v: f64, fmt: LongitudeFormat) -> f64 {
    match fmt {
        LongitudeFormat::Preserve => v,
        LongitudeFormat::ZeroTo360 => {
            while v < 0.0 {
                v += 360.0;
            }
            while v >= 360.0 {
                v -= 360.0;
            }
            v
        }
        LongitudeFormat::NegOneEightyToOneEighty => {
            while v <= -180.0 {
                v += 360.0;
            }
            while v > 180.0 {
                v -= 360.0;
            }
            v
        }
    }
}

/// Builds row-major (outer axis `j`) lat/lng arrays of length `ni*nj` from a
/// grid template 0 record, then computes the post-normalisation bounding box.
pub fn build_coordinates(t0: &GridTemplate0, fmt: LongitudeFormat) -> GridInfo {
    let ni = t0.ni as usize;
    let nj = t0.nj as usize;
    let i_sign = t0.i_sign();
    let j_sign = t0.j_sign();

    let mut lat = Vec::with_capacity(ni * nj);
    let mut lng = Vec::with_capacity(ni * nj);

    for j in 0..nj {
        let lat_v = t0.lat_first + j as f64 * t0.j_increment * j_sign;
        for i in 0..ni {
            let lng_v = normalize_lng(t0.lon_first + i as f64 * t0.i_increment * i_sign, fmt);
            lat.push(lat_v as f32);
            lng.push(lng_v as f32);
        }
    }

    let (lat_min, lat_max) = min_max(&lat);
    let (lng_min, lng_max) = min_max(&lng);

    GridInfo {
        ni: t0.ni,
        nj: t0.nj,
        lat,
        lng,
        lat_first: t0.lat_first,
        lon_first: t0.lon_first,
        lat_inc: t0.j_increment,
        lng_inc: t0.i_increment,
        lat_min,
        lat_max,
        lng_min,
        lng_max,
    }
}

fn min_max(values: &[f32]) -> (f32, f32) {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &v in values {
        if v < min {
            min = v;
        }
        if v > max {
            max = v;
        }
    }
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0(scanning_mode: u8) -> GridTemplate0 {
        GridTemplate0 {
            ni: 3,
            nj: 3,
            lat_first: 10.0,
            lon_first: 20.0,
            i_increment: 1.0,
            j_increment: 1.0,
            resolution_and_component_flags: 0,
            scanning_mode,
            lat_last_recorded: 0.0,
            lon_last_recorded: 0.0,
            lat_last: 12.0,
            lon_last: 22.0,
        }
    }

    #[test]
    fn row_major_with_j_outer() {
        let grid = build_coordinates(&t0(0x40), LongitudeFormat::Preserve);
        assert_eq!(grid.lat.len(), 9);
        assert_eq!(grid.lng.len(), 9);
        assert!((grid.lat[0] - 10.0).abs() < 1e-5);
        assert!((grid.lng[0] - 20.0).abs() < 1e-5);
        // j=1 row starts at index ni=3
        assert!((grid.lat[3] - 11.0).abs() < 1e-5);
        assert!((grid.lng[3] - 20.0).abs() < 1e-5);
    }

    #[test]
    fn scanning_mode_flips_j_axis() {
        let north_to_south = build_coordinates(&t0(0x00), LongitudeFormat::Preserve);
        let south_to_north = build_coordinates(&t0(0x40), LongitudeFormat::Preserve);
        // first/last j-row lat swap between the two scanning modes
        assert_eq!(north_to_south.lat[0], south_to_north.lat[0]);
        assert!(north_to_south.lat[6] < north_to_south.lat[0]);
        assert!(south_to_north.lat[6] > south_to_north.lat[0]);
    }

    #[test]
    fn antimeridian_crossing_bounding_box() {
        let mut t = t0(0x40);
        t.ni = 86;
        t.lon_first = 351.75;
        t.i_increment = 0.25;

        let preserve = build_coordinates(&t, LongitudeFormat::Preserve);
        assert!(preserve.lng_max > 360.0);

        let signed = build_coordinates(&t, LongitudeFormat::NegOneEightyToOneEighty);
        assert!(signed.lng_min > -9.0 && signed.lng_min < -7.0);
        assert!(signed.lng_max > 12.0 && signed.lng_max < 14.0);
    }

    #[test]
    fn normalisation_ranges_hold() {
        let t = t0(0x40);
        let zero_360 = build_coordinates(&t, LongitudeFormat::ZeroTo360);
        assert!(zero_360.lng.iter().all(|&v| (0.0..360.0).contains(&v)));

        let signed = build_coordinates(&t, LongitudeFormat::NegOneEightyToOneEighty);
        assert!(signed.lng.iter().all(|&v| v > -180.0 && v <= 180.0));
    }
}
