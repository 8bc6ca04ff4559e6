//! Expands section 7's byte payload into a floating point field, under data
//! representation templates 5.0 (simple packing), 5.2 (complex packing) and
//! 5.3 (complex packing with spatial differencing).

use crate::bitreader::BitReader;
use crate::sections::{ComplexPacking, SimplePacking, SpatialDiffParams};

/// Decodes a simple-packed (template 5.0) payload of `n` points.
pub fn decode_simple(sp: &SimplePacking, body: &[u8], n: usize) -> Vec<f32> {
    let scale_d = 10f64.powi(-(sp.d as i32));

    if sp.bits == 0 {
        let value = (sp.r as f64 * scale_d) as f32;
        return vec![value; n];
    }

    let factor = 2f64.powi(sp.e as i32);
    let mut reader = BitReader::new(body);
    let mut out = Vec::with_capacity(n);

    for _ in 0..n {
        match reader.read_bits(sp.bits as u32) {
            Ok(x) => out.push(((sp.r as f64 + x as f64 * factor) * scale_d) as f32),
            Err(_) => {
                tracing::warn!(produced = out.len(), expected = n, "simple packing payload truncated");
                out.resize(n, 0.0);
                break;
            }
        }
    }
    out
}

/// Decodes a complex-packed (template 5.2/5.3) payload of `n` points.
/// `spatial` is `Some` only for template 5.3.
pub fn decode_complex(cp: &ComplexPacking, spatial: Option<&SpatialDiffParams>, body: &[u8], n: usize) -> Vec<f32> {
    if n == 0 {
        return Vec::new();
    }

    let mut reader = BitReader::new(body);
    let g = cp.group_count as usize;

    // Spatial-differencing header: not byte-realigned afterwards.
    let (h1, h2, g_min) = match spatial {
        Some(sdp) if sdp.order == 1 || sdp.order == 2 => {
            let nbitsd = sdp.extra_descriptor_octets as u32 * 8;
            let h1 = reader.read_bits(nbitsd).unwrap_or(0) as i64;
            let h2 = if sdp.order == 2 { reader.read_bits(nbitsd).unwrap_or(0) as i64 } else { 0 };
            let sign = reader.read_bits(1).unwrap_or(0);
            let magnitude = reader.read_bits(nbitsd.saturating_sub(1)).unwrap_or(0) as i64;
            let g_min = if sign == 1 { -magnitude } else { magnitude };
            (h1, h2, g_min)
        }
        _ => (0, 0, 0),
    };

    // Group references: G values of `bits` width, byte-aligned after.
    let mut refs = Vec::with_capacity(g);
    for _ in 0..g {
        refs.push(reader.read_bits(cp.bits as u32).unwrap_or(0));
    }
    reader.align_to_byte();

    // Group widths: G values of `group_width_bits` width, plus the reference, byte-aligned after.
    let mut widths = Vec::with_capacity(g);
    for _ in 0..g {
        let raw = reader.read_bits(cp.group_width_bits as u32).unwrap_or(0);
        widths.push(raw as u32 + cp.group_width_reference as u32);
    }
    reader.align_to_byte();

    // Group lengths: G values, scaled by length_increment + reference; last overridden.
    let mut lengths = Vec::with_capacity(g);
    for _ in 0..g {
        let raw = reader.read_bits(cp.scaled_group_length_bits as u32).unwrap_or(0);
        lengths.push(raw as u32 * cp.length_increment as u32 + cp.group_length_reference);
    }
    if let Some(last) = lengths.last_mut() {
        *last = cp.last_group_true_length;
    }
    reader.align_to_byte();

    // Unpack the integer field.
    let mut integers: Vec<i64> = Vec::with_capacity(n);
    let mut truncated = false;
    'groups: for j in 0..g {
        let reference = refs[j] as i64;
        let width = widths[j];
        let len = lengths[j] as usize;
        for _ in 0..len {
            if integers.len() >= n {
                break 'groups;
            }
            if width > 0 {
                match reader.read_bits(width) {
                    Ok(v) => integers.push(reference + v as i64),
                    Err(_) => {
                        truncated = true;
                        break 'groups;
                    }
                }
            } else {
                integers.push(reference);
            }
        }
    }
    if truncated || integers.len() < n {
        tracing::warn!(produced = integers.len(), expected = n, "complex packing payload truncated");
        integers.resize(n, 0);
    }

    // Reverse spatial differencing.
    if let Some(sdp) = spatial {
        match sdp.order {
            1 if n >= 1 => {
                integers[0] = h1;
                for i in 1..n {
                    integers[i] += g_min + integers[i - 1];
                }
            }
            2 if n >= 2 => {
                integers[0] = h1;
                integers[1] = h2;
                for i in 2..n {
                    integers[i] += g_min + 2 * integers[i - 1] - integers[i - 2];
                }
            }
            _ => {}
        }
    }

    let factor = 2f64.powi(cp.e as i32);
    let scale_d = 10f64.powi(-(cp.d as i32));
    integers
        .into_iter()
        .map(|i| ((cp.r as f64 + i as f64 * factor) * scale_d) as f32)
        .collect()
}
