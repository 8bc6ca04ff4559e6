//! Decoders for the eight GRIB2 sections.
//!
//! Every section 3-7 shares a common header: `length: u32` (big-endian) then
//! `section_number: u8`. All offsets below are given relative to the start
//! of that header (i.e. the position of the `length` field), matching the
//! WMO GRIB2 manual's octet numbering.

use crate::bitreader::{read_f32, read_i16, read_i32, read_u16, read_u32};
use crate::error::Grib2Error;

pub const SECTION0_SIZE: usize = 16;
pub const SECTION8_MAGIC: &[u8; 4] = b"7777";

#[derive(Debug, Clone, Copy)]
pub struct SectionHeader {
    pub length: u32,
    pub number: u8,
}

pub fn read_section_header(buf: &[u8], offset: usize) -> Result<SectionHeader, Grib2Error> {
    let length = read_u32(buf, offset)?;
    if offset + 4 >= buf.len() {
        return Err(Grib2Error::OutOfBounds { bit_offset: (offset + 4) * 8, n: 8, buffer_bits: buf.len() * 8 });
    }
    Ok(SectionHeader { length, number: buf[offset + 4] })
}

/// Section 0 (Indicator), 16 fixed octets.
pub struct Section0 {
    pub discipline: u8,
    pub edition: u8,
    pub total_length: u64,
}

pub fn parse_section0(buf: &[u8], offset: usize) -> Result<Section0, Grib2Error> {
    if offset + SECTION0_SIZE > buf.len() {
        return Err(Grib2Error::OutOfBounds {
            bit_offset: offset * 8,
            n: (SECTION0_SIZE * 8) as u32,
            buffer_bits: buf.len() * 8,
        });
    }
    if &buf[offset..offset + 4] != b"GRIB" {
        return Err(Grib2Error::InvalidSignature);
    }
    let discipline = buf[offset + 6];
    let edition = buf[offset + 7];
    if edition != 2 {
        return Err(Grib2Error::UnsupportedEdition(edition));
    }
    let total_length = crate::bitreader::read_u64(buf, offset + 8)?;
    Ok(Section0 { discipline, edition, total_length })
}

#[derive(Debug, Clone)]
/// Identification section
pub struct Section1 {
    pub centre: u16,
    pub sub_centre: u16,
    pub master_table_version: u8,
    pub local_table_version: u8,
    pub ref_time_significance: u8,
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub production_status: u8,
    pub data_type: u8,
}

pub fn parse_section1(buf: &[u8], offset: usize) -> Result<Section1, Grib2Error> {
    let base = offset + 5;
    Ok(Section1 {
        centre: read_u16(buf, base)?,
        sub_centre: read_u16(buf, base + 2)?,
        master_table_version: byte(buf, base + 4)?,
        local_table_version: byte(buf, base + 5)?,
        ref_time_significance: byte(buf, base + 6)?,
        year: read_u16(buf, base + 7)?,
        month: byte(buf, base + 9)?,
        day: byte(buf, base + 10)?,
        hour: byte(buf, base + 11)?,
        minute: byte(buf, base + 12)?,
        second: byte(buf, base + 13)?,
        production_status: byte(buf, base + 14)?,
        data_type: byte(buf, base + 15)?,
    })
}

#[derive(Debug, Clone, Copy, Default)]
/// Grid template 0 (regular latitude/longitude) fields
pub struct GridTemplate0 {
    pub ni: u32,
    pub nj: u32,
    pub lat_first: f64,
    pub lon_first: f64,
    pub i_increment: f64,
    pub j_increment: f64,
    pub resolution_and_component_flags: u8,
    pub scanning_mode: u8,
    /// Recorded on-disk last point, kept for debugging; see `lat_last`/`lon_last`
    /// for the canonical recomputed values.
    pub lat_last_recorded: f64,
    pub lon_last_recorded: f64,
    pub lat_last: f64,
    pub lon_last: f64,
}

impl GridTemplate0 {
    pub fn i_sign(&self) -> f64 {
        if self.scanning_mode & 0x80 == 0 { 1.0 } else { -1.0 }
    }

    pub fn j_sign(&self) -> f64 {
        if self.scanning_mode & 0x40 != 0 { 1.0 } else { -1.0 }
    }

    /// Grid-relative vector components, per resolution-flag bit 0x08
    pub fn grid_relative_winds(&self) -> bool {
        self.resolution_and_component_flags & 0x08 != 0
    }
}

#[derive(Debug, Clone)]
/// Grid definition section
pub struct Section3 {
    pub source: u8,
    pub number_of_data_points: u32,
    pub template_number: u16,
    pub template0: Option<GridTemplate0>,
    /// Raw template bytes, kept for templates other than 0 which this crate
    /// treats as opaque per its scope.
    pub raw_template: Vec<u8>,
}

const LONLAT_SCALE: f64 = 1e-6;

pub fn parse_section3(buf: &[u8], offset: usize, header: &SectionHeader) -> Result<Section3, Grib2Error> {
    let source = byte(buf, offset + 5)?;
    let number_of_data_points = read_u32(buf, offset + 6)?;
    let template_number = read_u16(buf, offset + 12)?;

    let template_start = offset + 14;
    let template_end = offset + header.length as usize;
    let raw_template = if template_end > buf.len() || template_start > template_end {
        Vec::new()
    } else {
        buf[template_start..template_end].to_vec()
    };

    let template0 = if template_number == 0 {
        let ni = read_u32(buf, offset + 30)?;
        let nj = read_u32(buf, offset + 34)?;
        let lat_first = read_i32(buf, offset + 46)? as f64 * LONLAT_SCALE;
        let lon_first = read_i32(buf, offset + 50)? as f64 * LONLAT_SCALE;
        let resolution_and_component_flags = byte(buf, offset + 54)?;
        let lat_last_recorded = read_i32(buf, offset + 55)? as f64 * LONLAT_SCALE;
        let lon_last_recorded = read_i32(buf, offset + 59)? as f64 * LONLAT_SCALE;
        let i_increment = read_u32(buf, offset + 63)? as f64 * LONLAT_SCALE;
        let j_increment = read_u32(buf, offset + 67)? as f64 * LONLAT_SCALE;
        let scanning_mode = byte(buf, offset + 71)?;

        let i_sign = if scanning_mode & 0x80 == 0 { 1.0 } else { -1.0 };
        let j_sign = if scanning_mode & 0x40 != 0 { 1.0 } else { -1.0 };
        let lon_last = lon_first + (ni.max(1) - 1) as f64 * i_increment * i_sign;
        let lat_last = lat_first + (nj.max(1) - 1) as f64 * j_increment * j_sign;

        Some(GridTemplate0 {
            ni,
            nj,
            lat_first,
            lon_first,
            i_increment,
            j_increment,
            resolution_and_component_flags,
            scanning_mode,
            lat_last_recorded,
            lon_last_recorded,
            lat_last,
            lon_last,
        })
    } else {
        None
    };

    Ok(Section3 { source, number_of_data_points, template_number, template0, raw_template })
}

#[derive(Debug, Clone, Copy)]
/// Fixed-offset fields of product definition template 4.0, read from
/// [`Section4::template_bytes`] (template-relative offsets, matching the WMO manual)
pub struct ProductTemplate0Fields {
    pub parameter_category: u8,
    pub parameter_number: u8,
    pub time_unit: u8,
    pub forecast_time: u32,
    pub level_type: u8,
    pub level_scale: u8,
    pub level_scaled_value: i32,
}

#[derive(Debug, Clone)]
/// Product definition section
pub struct Section4 {
    pub number_of_coordinate_values: u16,
    pub template_number: u16,
    pub template_bytes: Vec<u8>,
    pub parameter_category: u8,
    pub parameter_number: u8,
}

pub fn parse_section4(buf: &[u8], offset: usize, header: &SectionHeader) -> Result<Section4, Grib2Error> {
    let number_of_coordinate_values = read_u16(buf, offset + 5)?;
    let template_number = read_u16(buf, offset + 7)?;
    let template_start = offset + 9;
    let template_end = offset + header.length as usize;
    let template_bytes = if template_end > buf.len() || template_start > template_end {
        Vec::new()
    } else {
        buf[template_start..template_end].to_vec()
    };
    let parameter_category = template_bytes.first().copied().unwrap_or(0);
    let parameter_number = template_bytes.get(1).copied().unwrap_or(0);

    Ok(Section4 {
        number_of_coordinate_values,
        template_number,
        template_bytes,
        parameter_category,
        parameter_number,
    })
}

impl Section4 {
    /// Reads the level/forecast-time fields of product definition template 4.0.
    /// Returns `None` for any other template, or if the template is truncated.
    pub fn template0_fields(&self) -> Option<ProductTemplate0Fields> {
        if self.template_number != 0 || self.template_bytes.len() < 19 {
            return None;
        }
        let tb = &self.template_bytes;
        Some(ProductTemplate0Fields {
            parameter_category: tb[0],
            parameter_number: tb[1],
            time_unit: tb[8],
            forecast_time: u32::from_be_bytes(tb[9..13].try_into().unwrap()),
            level_type: tb[13],
            level_scale: tb[14],
            level_scaled_value: i32::from_be_bytes(tb[15..19].try_into().unwrap()),
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SimplePacking {
    pub r: f32,
    pub e: i16,
    pub d: i16,
    pub bits: u8,
    pub original_field_type: u8,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ComplexPacking {
    pub r: f32,
    pub e: i16,
    pub d: i16,
    pub bits: u8,
    pub original_field_type: u8,
    pub group_splitting_method: u8,
    pub missing_value_management: u8,
    pub primary_missing: f32,
    pub secondary_missing: f32,
    pub group_count: u32,
    pub group_width_reference: u8,
    pub group_width_bits: u8,
    pub group_length_reference: u32,
    pub length_increment: u8,
    pub last_group_true_length: u32,
    pub scaled_group_length_bits: u8,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SpatialDiffParams {
    pub order: u8,
    pub extra_descriptor_octets: u8,
}

#[derive(Debug, Clone)]
pub enum DataRepresentation {
    Simple(SimplePacking),
    Complex(ComplexPacking),
    ComplexSpatialDiff(ComplexPacking, SpatialDiffParams),
    Unsupported(Vec<u8>),
}

#[derive(Debug, Clone)]
/// Data representation section
pub struct Section5 {
    pub number_of_data_points: u32,
    pub template_number: u16,
    pub record: DataRepresentation,
}

fn parse_simple_packing(buf: &[u8], base: usize) -> Result<SimplePacking, Grib2Error> {
    Ok(SimplePacking {
        r: read_f32(buf, base)?,
        e: read_i16(buf, base + 4)?,
        d: read_i16(buf, base + 6)?,
        bits: byte(buf, base + 8)?,
        original_field_type: byte(buf, base + 9)?,
    })
}

fn parse_complex_packing(buf: &[u8], base: usize) -> Result<ComplexPacking, Grib2Error> {
    Ok(ComplexPacking {
        r: read_f32(buf, base)?,
        e: read_i16(buf, base + 4)?,
        d: read_i16(buf, base + 6)?,
        bits: byte(buf, base + 8)?,
        original_field_type: byte(buf, base + 9)?,
        group_splitting_method: byte(buf, base + 10)?,
        missing_value_management: byte(buf, base + 11)?,
        primary_missing: read_f32(buf, base + 12)?,
        secondary_missing: read_f32(buf, base + 16)?,
        group_count: read_u32(buf, base + 20)?,
        group_width_reference: byte(buf, base + 24)?,
        group_width_bits: byte(buf, base + 25)?,
        group_length_reference: read_u32(buf, base + 26)?,
        length_increment: byte(buf, base + 30)?,
        last_group_true_length: read_u32(buf, base + 31)?,
        scaled_group_length_bits: byte(buf, base + 35)?,
    })
}

pub fn parse_section5(buf: &[u8], offset: usize, header: &SectionHeader) -> Result<Section5, Grib2Error> {
    let number_of_data_points = read_u32(buf, offset + 5)?;
    let template_number = read_u16(buf, offset + 9)?;
    let base = offset + 11;
    let section_end = offset + header.length as usize;

    let record = match template_number {
        0 => DataRepresentation::Simple(parse_simple_packing(buf, base)?),
        2 => DataRepresentation::Complex(parse_complex_packing(buf, base)?),
        3 => {
            let cp = parse_complex_packing(buf, base)?;
            let sdp = SpatialDiffParams {
                order: byte(buf, base + 36)?,
                extra_descriptor_octets: byte(buf, base + 37)?,
            };
            DataRepresentation::ComplexSpatialDiff(cp, sdp)
        }
        _ => {
            let raw = if section_end > buf.len() || base > section_end {
                Vec::new()
            } else {
                buf[base..section_end].to_vec()
            };
            DataRepresentation::Unsupported(raw)
        }
    };

    Ok(Section5 { number_of_data_points, template_number, record })
}

#[derive(Debug, Clone)]
/// Bit-map section
pub struct Section6 {
    pub bitmap_indicator: u8,
    pub bitmap: Option<Vec<u8>>,
}

pub fn parse_section6(buf: &[u8], offset: usize, header: &SectionHeader) -> Result<Section6, Grib2Error> {
    let bitmap_indicator = byte(buf, offset + 5)?;
    let body_start = offset + 6;
    let body_end = offset + header.length as usize;
    let bitmap = if bitmap_indicator == 0 && body_end > body_start && body_end <= buf.len() {
        Some(buf[body_start..body_end].to_vec())
    } else {
        None
    };
    Ok(Section6 { bitmap_indicator, bitmap })
}

#[derive(Debug, Clone)]
/// Data section: either the decoded field, or raw bytes for an unsupported template
pub enum Section7 {
    Decoded(Vec<f32>),
    Raw(Vec<u8>),
}

fn byte(buf: &[u8], offset: usize) -> Result<u8, Grib2Error> {
    buf.get(offset).copied().ok_or(Grib2Error::OutOfBounds {
        bit_offset: offset * 8,
        n: 8,
        buffer_bits: buf.len() * 8,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_section0(total_length: u64) -> Vec<u8> {
        let mut buf = vec![0u8; 16];
        buf[0..4].copy_from_slice(b"GRIB");
        buf[6] = 0; // discipline
        buf[7] = 2; // edition
        buf[8..16].copy_from_slice(&total_length.to_be_bytes());
        buf
    }

    #[test]
    fn parses_section0() {
        let buf = build_section0(1234);
        let s0 = parse_section0(&buf, 0).unwrap();
        assert_eq!(s0.discipline, 0);
        assert_eq!(s0.edition, 2);
        assert_eq!(s0.total_length, 1234);
    }

    #[test]
    fn rejects_bad_signature() {
        let mut buf = build_section0(16);
        buf[0] = b'X';
        assert!(matches!(parse_section0(&buf, 0), Err(Grib2Error::InvalidSignature)));
    }

    #[test]
    fn rejects_bad_edition() {
        let mut buf = build_section0(16);
        buf[7] = 1;
        assert!(matches!(parse_section0(&buf, 0), Err(Grib2Error::UnsupportedEdition(1))));
    }

    #[test]
    fn grid_template0_recomputes_last_point() {
        let mut buf = vec![0u8; 72];
        buf[0..4].copy_from_slice(&72u32.to_be_bytes());
        buf[4] = 3;
        buf[5] = 0; // source
        buf[6..10].copy_from_slice(&9u32.to_be_bytes()); // number_of_data_points
        buf[12..14].copy_from_slice(&0u16.to_be_bytes()); // template number 0
        buf[30..34].copy_from_slice(&3u32.to_be_bytes()); // ni
        buf[34..38].copy_from_slice(&3u32.to_be_bytes()); // nj
        buf[46..50].copy_from_slice(&(10_000_000i32).to_be_bytes()); // lat_first = 10
        buf[50..54].copy_from_slice(&(20_000_000i32).to_be_bytes()); // lon_first = 20
        buf[54] = 0x00; // resolution flags
        buf[63..67].copy_from_slice(&1_000_000u32.to_be_bytes()); // i_increment = 1
        buf[67..71].copy_from_slice(&1_000_000u32.to_be_bytes()); // j_increment = 1
        buf[71] = 0x40; // S->N, W->E

        let header = SectionHeader { length: 72, number: 3 };
        let s3 = parse_section3(&buf, 0, &header).unwrap();
        let t0 = s3.template0.unwrap();
        assert_eq!(t0.ni, 3);
        assert_eq!(t0.nj, 3);
        assert!((t0.lat_first - 10.0).abs() < 1e-9);
        assert!((t0.lon_first - 20.0).abs() < 1e-9);
        assert!((t0.lat_last - 12.0).abs() < 1e-9);
        assert!((t0.lon_last - 22.0).abs() < 1e-9);
    }
}
