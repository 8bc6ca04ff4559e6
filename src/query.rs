//! `get_data` — selection (regex match, parameter/level filters), derived
//! fields (wind speed/direction, earth-relative rotation), and output shape.

use std::collections::BTreeMap;

use regex::Regex;

use crate::coordinates::{self, GridInfo, LongitudeFormat};
use crate::error::Grib2Error;
use crate::inventory;
use crate::sections::Section7;
use crate::tables;
use crate::walker::Message;

#[derive(Debug, Clone)]
pub struct QueryOptions<'a> {
    pub message_index: usize,
    pub match_pattern: Option<&'a str>,
    pub parameters: Option<&'a [&'a str]>,
    pub level_type: Option<u8>,
    pub level_value: Option<i32>,
    pub first_parameter_only: bool,
    pub multi_level: bool,
    pub longitude_format: LongitudeFormat,
    pub calculate_wind_speed: bool,
    pub calculate_wind_direction: bool,
    pub earth_relative_winds: bool,
    pub as_objects: bool,
}

impl<'a> Default for QueryOptions<'a> {
    fn default() -> Self {
        Self {
            message_index: 0,
            match_pattern: None,
            parameters: None,
            level_type: None,
            level_value: None,
            first_parameter_only: true,
            multi_level: false,
            longitude_format: LongitudeFormat::Preserve,
            calculate_wind_speed: false,
            calculate_wind_direction: false,
            earth_relative_winds: false,
            as_objects: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DataView {
    pub lat: Vec<f32>,
    pub lng: Vec<f32>,
    pub parameters: BTreeMap<String, Vec<f32>>,
}

#[derive(Debug, Clone)]
pub struct LevelView {
    pub level_type: u8,
    pub level_value: i32,
    pub forecast_time: u32,
    pub data: DataView,
}

#[derive(Debug, Clone)]
pub struct PointRecord {
    pub lat: f32,
    pub lng: f32,
    pub values: BTreeMap<String, f32>,
}

#[derive(Debug, Clone)]
pub enum QueryResult {
    Merged(DataView),
    MultiLevel(Vec<LevelView>),
    Objects(Vec<PointRecord>),
}

/// Computes per-point wind speed from parallel u/v component arrays.
pub fn wind_speed(u: &[f32], v: &[f32]) -> Vec<f32> {
    u.iter().zip(v.iter()).map(|(&ui, &vi)| (ui * ui + vi * vi).sqrt()).collect()
}

/// Computes per-point wind direction (degrees the wind comes FROM), normalised to `[0, 360)`.
pub fn wind_direction(u: &[f32], v: &[f32]) -> Vec<f32> {
    u.iter()
        .zip(v.iter())
        .map(|(&ui, &vi)| {
            if ui == 0.0 && vi == 0.0 {
                return 0.0;
            }
            let deg = (-ui).atan2(-vi).to_degrees();
            if deg < 0.0 {
                deg + 360.0
            } else {
                deg
            }
        })
        .collect()
}

struct SelectedMessage<'m> {
    index: usize,
    message: &'m Message,
    short_name: String,
}

pub fn get_data(messages: &[Message], opts: &QueryOptions) -> Result<QueryResult, Grib2Error> {
    let coord_message = messages.get(opts.message_index).ok_or(Grib2Error::OutOfRange("message_index"))?;
    let t0 = coord_message
        .section3
        .template0
        .as_ref()
        .ok_or(Grib2Error::UnsupportedTemplate { kind: "grid", template: coord_message.section3.template_number })?;
    let grid = coordinates::build_coordinates(t0, opts.longitude_format);

    let inventory = inventory::build_inventory(messages);
    let regex = match opts.match_pattern {
        Some(pattern) => Some(Regex::new(pattern)?),
        None => None,
    };

    let mut matched_any = false;
    let mut selected = Vec::new();
    for (i, msg) in messages.iter().enumerate() {
        if let Some(re) = &regex {
            if !re.is_match(&inventory[i].line) {
                continue;
            }
        }
        matched_any = true;

        let short_name = tables::short_name(msg.discipline, msg.section4.parameter_category, msg.section4.parameter_number);

        if let Some(wanted) = opts.parameters {
            if !wanted.iter().any(|p| *p == short_name) {
                continue;
            }
        }

        if let Some(fields) = msg.section4.template0_fields() {
            if let Some(lt) = opts.level_type {
                if fields.level_type != lt {
                    continue;
                }
            }
            if let Some(lv) = opts.level_value {
                if fields.level_scaled_value != lv {
                    continue;
                }
            }
        } else if opts.level_type.is_some() || opts.level_value.is_some() {
            continue;
        }

        // Only decoded fields participate in data queries; unsupported
        // templates are retained on Message but absent here, per spec.
        if matches!(msg.section7, Section7::Decoded(_)) {
            selected.push(SelectedMessage { index: i, message: msg, short_name });
        }
    }

    // NoMatch is tied to the `match` step alone (spec.md §4.7): a regex that
    // matched messages which the parameter/level filters then excluded is
    // not a match failure, just an empty result.
    if regex.is_some() && !matched_any {
        return Err(Grib2Error::NoMatch);
    }

    if opts.earth_relative_winds && t0.grid_relative_winds() {
        tracing::debug!("earth-relative wind rotation requested; template 0 rotation is identity");
    }

    if opts.multi_level {
        let mut levels = Vec::with_capacity(selected.len());
        for sel in &selected {
            let mut params = BTreeMap::new();
            if let Section7::Decoded(values) = &sel.message.section7 {
                params.insert(sel.short_name.clone(), values.clone());
            }
            apply_derived_fields(&mut params, opts);

            let fields = sel.message.section4.template0_fields();
            levels.push(LevelView {
                level_type: fields.map(|f| f.level_type).unwrap_or(0),
                level_value: fields.map(|f| f.level_scaled_value).unwrap_or(0),
                forecast_time: fields.map(|f| f.forecast_time).unwrap_or(0),
                data: DataView { lat: grid.lat.clone(), lng: grid.lng.clone(), parameters: params },
            });
        }
        return Ok(QueryResult::MultiLevel(levels));
    }

    let mut parameters: BTreeMap<String, Vec<f32>> = BTreeMap::new();
    for sel in &selected {
        if let Section7::Decoded(values) = &sel.message.section7 {
            if opts.first_parameter_only && parameters.contains_key(&sel.short_name) {
                continue;
            }
            parameters.insert(sel.short_name.clone(), values.clone());
        }
    }
    apply_derived_fields(&mut parameters, opts);

    if opts.as_objects {
        Ok(QueryResult::Objects(to_point_records(&grid, &parameters)))
    } else {
        Ok(QueryResult::Merged(DataView { lat: grid.lat.clone(), lng: grid.lng.clone(), parameters }))
    }
}

fn apply_derived_fields(parameters: &mut BTreeMap<String, Vec<f32>>, opts: &QueryOptions) {
    let (u, v) = (parameters.get("UGRD").cloned(), parameters.get("VGRD").cloned());
    if let (Some(u), Some(v)) = (&u, &v) {
        if opts.calculate_wind_speed {
            parameters.insert("wind_speed".to_string(), wind_speed(u, v));
        }
        if opts.calculate_wind_direction {
            parameters.insert("wind_dir".to_string(), wind_direction(u, v));
        }
    }
}

fn to_point_records(grid: &GridInfo, parameters: &BTreeMap<String, Vec<f32>>) -> Vec<PointRecord> {
    let n = grid.lat.len();
    let mut records = Vec::with_capacity(n);
    for idx in 0..n {
        let mut values = BTreeMap::new();
        for (name, arr) in parameters {
            if let Some(v) = arr.get(idx) {
                values.insert(name.clone(), *v);
            }
        }
        records.push(PointRecord { lat: grid.lat[idx], lng: grid.lng[idx], values });
    }
    records
}
