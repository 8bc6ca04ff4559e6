//! Bilinear interpolation at a point, and bilinear regridding onto a new
//! regular lat/lng grid.

use crate::coordinates::GridInfo;
use crate::query::{DataView, PointRecord};

#[derive(Debug, Clone, Copy)]
pub struct RegridSpec {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lng_min: f64,
    pub lng_max: f64,
    pub lat_step: f64,
    pub lng_step: f64,
}

/// Bilinearly interpolates every named parameter at `(target_lat, target_lng)`.
/// Returns `None` if the target falls outside the grid's bounding box or the
/// grid has fewer than two rows/columns.
pub fn bilinear_point(
    grid: &GridInfo,
    data: &DataView,
    target_lat: f64,
    target_lng: f64,
) -> Option<PointRecord> {
    let ni = grid.ni as usize;
    let nj = grid.nj as usize;
    if ni < 2 || nj < 2 {
        return None;
    }

    let (lat_min, lat_max) = (grid.lat_min as f64, grid.lat_max as f64);
    let (lng_min, lng_max) = (grid.lng_min as f64, grid.lng_max as f64);
    if target_lat < lat_min || target_lat > lat_max || target_lng < lng_min || target_lng > lng_max {
        return None;
    }

    let j_float = (target_lat - lat_min) / grid.lat_inc;
    let i_float = (target_lng - lng_min) / grid.lng_inc;

    // Clamp the upper corner to the last row/column instead of rejecting,
    // so a target exactly on the grid's top/right edge still resolves.
    let j0 = (j_float.floor() as usize).min(nj - 2);
    let i0 = (i_float.floor() as usize).min(ni - 2);

    let tj = (j_float - j0 as f64).clamp(0.0, 1.0);
    let ti = (i_float - i0 as f64).clamp(0.0, 1.0);

    let idx = |i: usize, j: usize| j * ni + i;
    let (i00, i10, i01, i11) = (idx(i0, j0), idx(i0 + 1, j0), idx(i0, j0 + 1), idx(i0 + 1, j0 + 1));

    let mut values = std::collections::BTreeMap::new();
    for (name, arr) in &data.parameters {
        if arr.len() < idx(ni - 1, nj - 1) + 1 {
            continue;
        }
        let top = arr[i00] as f64 * (1.0 - ti) + arr[i10] as f64 * ti;
        let bottom = arr[i01] as f64 * (1.0 - ti) + arr[i11] as f64 * ti;
        let value = top * (1.0 - tj) + bottom * tj;
        values.insert(name.clone(), value as f32);
    }

    Some(PointRecord { lat: target_lat as f32, lng: target_lng as f32, values })
}

/// Resamples `data` onto a new regular grid described by `spec`, bilinearly
/// interpolating each named parameter at every target point.
pub fn regrid_bilinear(grid: &GridInfo, data: &DataView, spec: &RegridSpec) -> (GridInfo, DataView) {
    let nj = ((spec.lat_max - spec.lat_min) / spec.lat_step).round() as usize + 1;
    let ni = ((spec.lng_max - spec.lng_min) / spec.lng_step).round() as usize + 1;

    let mut lat = Vec::with_capacity(ni * nj);
    let mut lng = Vec::with_capacity(ni * nj);
    let mut parameters: std::collections::BTreeMap<String, Vec<f32>> =
        data.parameters.keys().map(|k| (k.clone(), Vec::with_capacity(ni * nj))).collect();

    for j in 0..nj {
        let target_lat = spec.lat_min + j as f64 * spec.lat_step;
        for i in 0..ni {
            let target_lng = spec.lng_min + i as f64 * spec.lng_step;
            lat.push(target_lat as f32);
            lng.push(target_lng as f32);

            match bilinear_point(grid, data, target_lat, target_lng) {
                Some(point) => {
                    for (name, values) in parameters.iter_mut() {
                        values.push(point.values.get(name).copied().unwrap_or(f32::NAN));
                    }
                }
                None => {
                    for values in parameters.values_mut() {
                        values.push(f32::NAN);
                    }
                }
            }
        }
    }

    let (lat_min, lat_max) = (spec.lat_min as f32, spec.lat_max as f32);
    let (lng_min, lng_max) = (spec.lng_min as f32, spec.lng_max as f32);

    let new_grid = GridInfo {
        ni: ni as u32,
        nj: nj as u32,
        lat,
        lng,
        lat_first: spec.lat_min,
        lon_first: spec.lng_min,
        lat_inc: spec.lat_step,
        lng_inc: spec.lng_step,
        lat_min,
        lat_max,
        lng_min,
        lng_max,
    };
    let new_data = DataView { lat: new_grid.lat.clone(), lng: new_grid.lng.clone(), parameters };

    (new_grid, new_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn flat_grid(ni: u32, nj: u32, value: f32) -> (GridInfo, DataView) {
        let mut parameters = BTreeMap::new();
        parameters.insert("TMP".to_string(), vec![value; (ni * nj) as usize]);
        let grid = GridInfo {
            ni,
            nj,
            lat: vec![0.0; (ni * nj) as usize],
            lng: vec![0.0; (ni * nj) as usize],
            lat_first: 0.0,
            lon_first: 0.0,
            lat_inc: 1.0,
            lng_inc: 1.0,
            lat_min: 0.0,
            lat_max: (nj - 1) as f32,
            lng_min: 0.0,
            lng_max: (ni - 1) as f32,
        };
        let data = DataView { lat: grid.lat.clone(), lng: grid.lng.clone(), parameters };
        (grid, data)
    }

    #[test]
    fn constant_field_interpolates_to_the_same_constant() {
        let (grid, data) = flat_grid(4, 4, 42.0);
        let point = bilinear_point(&grid, &data, 1.5, 2.25).unwrap();
        assert!((point.values["TMP"] - 42.0).abs() < 1e-5);
    }

    #[test]
    fn linear_ramp_interpolates_linearly() {
        let ni = 4u32;
        let nj = 4u32;
        let mut parameters = BTreeMap::new();
        let mut ramp = Vec::new();
        for j in 0..nj {
            for i in 0..ni {
                ramp.push((i + j * ni) as f32);
            }
        }
        parameters.insert("RAMP".to_string(), ramp);
        let grid = GridInfo {
            ni,
            nj,
            lat: vec![0.0; (ni * nj) as usize],
            lng: vec![0.0; (ni * nj) as usize],
            lat_first: 0.0,
            lon_first: 0.0,
            lat_inc: 1.0,
            lng_inc: 1.0,
            lat_min: 0.0,
            lat_max: 3.0,
            lng_min: 0.0,
            lng_max: 3.0,
        };
        let data = DataView { lat: grid.lat.clone(), lng: grid.lng.clone(), parameters };

        let point = bilinear_point(&grid, &data, 1.0, 1.5).unwrap();
        assert!((point.values["RAMP"] - 5.5).abs() < 1e-4);
    }

    #[test]
    fn out_of_bounds_target_returns_none() {
        let (grid, data) = flat_grid(3, 3, 1.0);
        assert!(bilinear_point(&grid, &data, -5.0, 0.0).is_none());
        assert!(bilinear_point(&grid, &data, 0.0, 50.0).is_none());
    }

    #[test]
    fn top_right_edge_node_resolves_instead_of_clamping_to_none() {
        let (grid, data) = flat_grid(4, 4, 3.0);
        let point = bilinear_point(&grid, &data, grid.lat_max as f64, grid.lng_max as f64).unwrap();
        assert!((point.values["TMP"] - 3.0).abs() < 1e-5);
    }

    #[test]
    fn north_to_south_scanning_mode_interpolates_inside_the_domain() {
        use crate::coordinates::{build_coordinates, LongitudeFormat};
        use crate::sections::GridTemplate0;

        // scanning_mode 0x00: i W->E, j N->S, so lat_first (10) is the grid's
        // maximum latitude and lat_min is recomputed from the last row.
        let t0 = GridTemplate0 {
            ni: 3,
            nj: 3,
            lat_first: 10.0,
            lon_first: 20.0,
            i_increment: 1.0,
            j_increment: 1.0,
            resolution_and_component_flags: 0,
            scanning_mode: 0x00,
            lat_last_recorded: 0.0,
            lon_last_recorded: 0.0,
            lat_last: 8.0,
            lon_last: 22.0,
        };
        let grid = build_coordinates(&t0, LongitudeFormat::Preserve);
        assert!((grid.lat_min - 8.0).abs() < 1e-5);

        let mut parameters = BTreeMap::new();
        parameters.insert("TMP".to_string(), vec![5.0f32; 9]);
        let data = DataView { lat: grid.lat.clone(), lng: grid.lng.clone(), parameters };

        // lat=9 sits strictly inside [8, 10]; before the fix this produced a
        // negative fractional index and spuriously returned None.
        assert!(bilinear_point(&grid, &data, 9.0, 21.0).is_some());
    }

    #[test]
    fn regrid_preserves_constant_field() {
        let (grid, data) = flat_grid(4, 4, 7.0);
        let spec = RegridSpec { lat_min: 0.5, lat_max: 2.5, lng_min: 0.5, lng_max: 2.5, lat_step: 1.0, lng_step: 1.0 };
        let (new_grid, new_data) = regrid_bilinear(&grid, &data, &spec);
        assert_eq!(new_grid.ni, 3);
        assert_eq!(new_grid.nj, 3);
        for v in &new_data.parameters["TMP"] {
            assert!((v - 7.0).abs() < 1e-4);
        }
    }
}
