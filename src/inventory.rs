//! Produces the synthetic per-message inventory line used by pattern matching.

use crate::tables;
use crate::walker::Message;

#[derive(Debug, Clone)]
pub struct InventoryEntry {
    pub message_number: usize,
    pub byte_offset: u64,
    pub line: String,
}

pub fn build_inventory(messages: &[Message]) -> Vec<InventoryEntry> {
    let mut offset = 0u64;
    let mut out = Vec::with_capacity(messages.len());
    for (i, msg) in messages.iter().enumerate() {
        let line = format_inventory_line(i + 1, offset, msg);
        out.push(InventoryEntry { message_number: i + 1, byte_offset: offset, line });
        offset += msg.total_length;
    }
    out
}

fn format_inventory_line(message_number: usize, byte_offset: u64, msg: &Message) -> String {
    let date = format!(
        "{:04}{:02}{:02}{:02}",
        msg.section1.year, msg.section1.month, msg.section1.day, msg.section1.hour
    );
    let param = tables::short_name(msg.discipline, msg.section4.parameter_category, msg.section4.parameter_number);

    let (level, forecast) = match msg.section4.template0_fields() {
        Some(f) => (
            tables::level_string(f.level_type, f.level_scale, f.level_scaled_value),
            tables::forecast_time_string(f.time_unit, f.forecast_time),
        ),
        None => (String::new(), String::new()),
    };

    format!("{message_number}:{byte_offset}:d={date}:{param}:{level}:{forecast}:")
}
