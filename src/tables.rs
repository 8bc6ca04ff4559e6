//! Minimal parameter/level/time-unit lookups needed to produce an inventory
//! line. Full WMO code tables are out of scope for this crate (spec.md §1);
//! this covers only the handful of codes the inventory and worked examples
//! need, falling back to the numeric forms for anything else.

/// Short parameter name from (discipline, category, number), Code Table 4.2.
pub fn short_name(discipline: u8, category: u8, number: u8) -> String {
    match (discipline, category, number) {
        (0, 2, 2) => "UGRD".to_string(),
        (0, 2, 3) => "VGRD".to_string(),
        (0, 0, 0) => "TMP".to_string(),
        (0, 0, 6) => "DPT".to_string(),
        (0, 1, 1) => "RH".to_string(),
        (0, 1, 8) => "APCP".to_string(),
        (0, 3, 0) => "PRES".to_string(),
        (0, 3, 1) => "PRMSL".to_string(),
        (0, 3, 5) => "HGT".to_string(),
        (0, 6, 1) => "TCDC".to_string(),
        _ => format!("PARAM_{category}_{number}"),
    }
}

/// Level string from Code Table 4.5's type plus the template's scale/scaled value.
pub fn level_string(level_type: u8, scale: u8, scaled_value: i32) -> String {
    let actual = scaled_value as f64 / 10f64.powi(scale as i32);
    match level_type {
        1 => "surface".to_string(),
        2 => "cloud base".to_string(),
        3 => "cloud top".to_string(),
        100 => format!("{} mb", trim_trailing_zeros(actual / 100.0)),
        103 => format!("{} m above ground", trim_trailing_zeros(actual)),
        104 => format!("{} sigma level", trim_trailing_zeros(actual)),
        other => format!("level type {other} value {}", trim_trailing_zeros(actual)),
    }
}

/// Forecast-time string from Code Table 4.4's unit code plus the template's raw value.
pub fn forecast_time_string(unit: u8, value: u32) -> String {
    match unit {
        0 => format!("{value} min fcst"),
        1 => format!("{value} hour fcst"),
        2 => format!("{value} day fcst"),
        10 => format!("{} hour fcst", value * 3),
        11 => format!("{} hour fcst", value * 6),
        12 => format!("{} hour fcst", value * 12),
        13 => format!("{value} sec fcst"),
        other => format!("{value} unit{other} fcst"),
    }
}

/// Formats a float, stripping trailing fractional zeros (and a bare trailing dot).
pub fn trim_trailing_zeros(v: f64) -> String {
    let mut s = format!("{v:.6}");
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    s
}
