//! Read a GRIB2 buffer and search for data based on parameter, level, and a
//! match pattern evaluated against the synthetic inventory line, decoding
//! grid-template-0 / product-template-0 / data-template 0, 2, and 3 messages.
//! Any other template is retained on the parsed message with its raw bytes
//! rather than treated as fatal.

pub mod bitreader;
pub mod coordinates;
pub mod decoder;
pub mod error;
pub mod interpolate;
pub mod inventory;
pub mod query;
pub mod sections;
pub mod tables;
pub mod walker;

pub use coordinates::{GridInfo, LongitudeFormat};
pub use error::Grib2Error;
pub use interpolate::RegridSpec;
pub use inventory::InventoryEntry;
pub use query::{DataView, LevelView, PointRecord, QueryOptions, QueryResult};
pub use sections::{Section0, Section1, Section3, Section4, Section5, Section6, Section7};
pub use walker::Message;

/// Reader of an in-memory GRIB2 buffer.
///
/// The reader never touches the filesystem: the caller supplies the whole
/// buffer (read from a file, a network response, or wherever) and parsing,
/// inventory, and query operations all run against it synchronously.
pub struct Grib2Reader<'a> {
    buffer: &'a [u8],
    messages: Vec<Message>,
}

impl<'a> Grib2Reader<'a> {
    /// Creates a reader over `buffer`. Call [`Grib2Reader::parse`] before
    /// using any of the other methods.
    pub fn new(buffer: &'a [u8]) -> Self {
        Grib2Reader { buffer, messages: Vec::new() }
    }

    /// Scans `buffer` for GRIB2 messages, decoding each one found. A
    /// malformed message is logged and skipped rather than aborting the scan.
    pub fn parse(&mut self) -> &[Message] {
        self.messages = walker::parse_messages(self.buffer);
        &self.messages
    }

    /// The messages found by the last call to [`Grib2Reader::parse`].
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Materialises the lat/lng grid for the message at `message_index`.
    pub fn get_grid(&self, message_index: usize) -> Result<GridInfo, Grib2Error> {
        self.get_grid_with_format(message_index, LongitudeFormat::Preserve)
    }

    /// As [`Grib2Reader::get_grid`], with an explicit longitude normalisation.
    pub fn get_grid_with_format(&self, message_index: usize, format: LongitudeFormat) -> Result<GridInfo, Grib2Error> {
        let message = self.messages.get(message_index).ok_or(Grib2Error::OutOfRange("message_index"))?;
        let t0 = message
            .section3
            .template0
            .as_ref()
            .ok_or(Grib2Error::UnsupportedTemplate { kind: "grid", template: message.section3.template_number })?;
        Ok(coordinates::build_coordinates(t0, format))
    }

    /// The synthetic inventory line for every parsed message, in file order.
    pub fn get_inventory(&self) -> Vec<InventoryEntry> {
        inventory::build_inventory(&self.messages)
    }

    /// Selects and decodes data across the parsed messages per `options`.
    pub fn get_data(&self, options: &QueryOptions) -> Result<QueryResult, Grib2Error> {
        query::get_data(&self.messages, options)
    }

    /// Bilinearly interpolates every parameter in `view` at a single point.
    pub fn bilinear_interpolate(&self, grid: &GridInfo, view: &DataView, lat: f64, lng: f64) -> Option<PointRecord> {
        interpolate::bilinear_point(grid, view, lat, lng)
    }

    /// Resamples `view` onto a new regular grid described by `spec`.
    pub fn regrid_bilinear(&self, grid: &GridInfo, view: &DataView, spec: &RegridSpec) -> (GridInfo, DataView) {
        interpolate::regrid_bilinear(grid, view, spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_minimal_message(num_points: u32, values: &[u8]) -> Vec<u8> {
        let sect1_len = 21u32;
        let sect3_len = 72u32;
        let sect4_len: u32 = 5 + 19;
        let sect5_len: u32 = 11 + 10;
        let sect7_len: u32 = 5 + values.len() as u32;
        let total = 16 + sect1_len + sect3_len + sect4_len + sect5_len + sect7_len + 4;

        let mut buf = Vec::new();
        buf.extend_from_slice(b"GRIB");
        buf.extend_from_slice(&[0, 0]);
        buf.push(0); // discipline
        buf.push(2); // edition
        buf.extend_from_slice(&(total as u64).to_be_bytes());

        buf.extend_from_slice(&sect1_len.to_be_bytes());
        buf.push(1);
        let mut s1 = vec![0u8; sect1_len as usize - 5];
        s1[2..4].copy_from_slice(&2024u16.to_be_bytes());
        s1[4] = 1;
        s1[5] = 15;
        s1[6] = 12;
        buf.extend_from_slice(&s1);

        buf.extend_from_slice(&sect3_len.to_be_bytes());
        buf.push(3);
        let mut s3 = vec![0u8; sect3_len as usize - 5];
        s3[1..5].copy_from_slice(&num_points.to_be_bytes());
        s3[7..9].copy_from_slice(&0u16.to_be_bytes());
        s3[25..29].copy_from_slice(&num_points.to_be_bytes());
        s3[29..33].copy_from_slice(&1u32.to_be_bytes());
        buf.extend_from_slice(&s3);

        buf.extend_from_slice(&sect4_len.to_be_bytes());
        buf.push(4);
        let mut s4 = vec![0u8; sect4_len as usize - 5];
        s4[0] = 0;
        s4[1] = 2;
        s4[8] = 1;
        s4[9..13].copy_from_slice(&6u32.to_be_bytes());
        s4[13] = 103;
        s4[15..19].copy_from_slice(&10i32.to_be_bytes());
        buf.extend_from_slice(&s4);

        buf.extend_from_slice(&sect5_len.to_be_bytes());
        buf.push(5);
        let mut s5 = vec![0u8; sect5_len as usize - 5];
        s5[0..4].copy_from_slice(&num_points.to_be_bytes());
        s5[4..6].copy_from_slice(&0u16.to_be_bytes());
        s5[14] = 8;
        buf.extend_from_slice(&s5);

        buf.extend_from_slice(&sect7_len.to_be_bytes());
        buf.push(7);
        buf.extend_from_slice(values);

        buf.extend_from_slice(b"7777");
        buf
    }

    #[test]
    fn end_to_end_parse_inventory_and_query() {
        let buf = build_minimal_message(3, &[10, 20, 30]);
        let mut reader = Grib2Reader::new(&buf);
        let messages = reader.parse();
        assert_eq!(messages.len(), 1);

        let entries = reader.get_inventory();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].line.contains("UGRD"));

        let grid = reader.get_grid(0).unwrap();
        assert_eq!(grid.lat.len(), 3);

        let result = reader.get_data(&QueryOptions::default()).unwrap();
        match result {
            QueryResult::Merged(view) => {
                assert_eq!(view.parameters["UGRD"], vec![10.0, 20.0, 30.0]);
            }
            _ => panic!("expected a merged view"),
        }
    }

    #[test]
    fn out_of_range_message_index_is_reported() {
        let buf = build_minimal_message(3, &[1, 2, 3]);
        let mut reader = Grib2Reader::new(&buf);
        reader.parse();
        assert!(matches!(reader.get_grid(5), Err(Grib2Error::OutOfRange(_))));
    }
}
