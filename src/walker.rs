//! Drives the section state machine for one message and iterates messages
//! across the whole buffer.

use crate::decoder;
use crate::error::Grib2Error;
use crate::sections::{
    self, DataRepresentation, Section0, Section1, Section3, Section4, Section5, Section6, Section7,
    SectionHeader, SECTION0_SIZE, SECTION8_MAGIC,
};

#[derive(Debug, Clone)]
pub struct Message {
    pub discipline: u8,
    pub edition: u8,
    pub total_length: u64,
    pub section1: Section1,
    pub section2: Option<Vec<u8>>,
    pub section3: Section3,
    pub section4: Section4,
    pub section5: Section5,
    pub section6: Option<Section6>,
    pub section7: Section7,
}

/// Iterates messages in `buf` until the buffer is exhausted or a GRIB
/// signature is no longer found. A malformed message is logged and skipped;
/// the walker then resumes at the next candidate "GRIB" signature.
pub fn parse_messages(buf: &[u8]) -> Vec<Message> {
    let mut messages = Vec::new();
    let mut offset = 0usize;

    while offset + SECTION0_SIZE <= buf.len() {
        match parse_one_message(buf, offset) {
            Ok(msg) => {
                let advance = msg.total_length as usize;
                messages.push(msg);
                if advance == 0 {
                    break;
                }
                offset += advance;
            }
            Err(err) => {
                tracing::warn!(%err, offset, "failed to parse GRIB2 message");
                match find_next_signature(buf, offset + 1) {
                    Some(next) => offset = next,
                    None => break,
                }
            }
        }
    }

    messages
}

fn find_next_signature(buf: &[u8], from: usize) -> Option<usize> {
    buf.windows(4).enumerate().skip(from).find(|(_, w)| *w == b"GRIB").map(|(i, _)| i)
}

fn parse_one_message(buf: &[u8], offset: usize) -> Result<Message, Grib2Error> {
    let Section0 { discipline, edition, total_length } = sections::parse_section0(buf, offset)?;

    let message_end = offset + total_length as usize;
    let mut pos = offset + SECTION0_SIZE;

    let mut section1 = None;
    let mut section2 = None;
    let mut section3 = None;
    let mut section4 = None;
    let mut section5 = None;
    let mut section6 = None;
    let mut section7 = None;
    let mut last_section_number = 0u8;

    loop {
        if pos + 4 <= buf.len() && &buf[pos..pos + 4] == SECTION8_MAGIC {
            pos += 4;
            break;
        }
        if pos + 5 > buf.len() || pos >= message_end {
            return Err(Grib2Error::OutOfBounds { bit_offset: pos * 8, n: 40, buffer_bits: buf.len() * 8 });
        }

        let header: SectionHeader = sections::read_section_header(buf, pos)?;
        if header.number <= last_section_number {
            return Err(Grib2Error::UnexpectedSection {
                expected: last_section_number + 1,
                found: header.number,
                offset: pos,
            });
        }

        match header.number {
            1 => section1 = Some(sections::parse_section1(buf, pos)?),
            2 => {
                let start = pos + 5;
                let end = pos + header.length as usize;
                section2 = Some(if end <= buf.len() && start <= end { buf[start..end].to_vec() } else { Vec::new() });
            }
            3 => section3 = Some(sections::parse_section3(buf, pos, &header)?),
            4 => section4 = Some(sections::parse_section4(buf, pos, &header)?),
            5 => section5 = Some(sections::parse_section5(buf, pos, &header)?),
            6 => section6 = Some(sections::parse_section6(buf, pos, &header)?),
            7 => {
                let s3 = section3.as_ref().ok_or(Grib2Error::UnexpectedSection { expected: 3, found: 7, offset: pos })?;
                let s5 = section5.as_ref().ok_or(Grib2Error::UnexpectedSection { expected: 5, found: 7, offset: pos })?;
                let start = pos + 5;
                let end = pos + header.length as usize;
                let body = if end <= buf.len() && start <= end { &buf[start..end] } else { &[][..] };
                section7 = Some(decode_section7(s5, s3.number_of_data_points as usize, body));
            }
            n => return Err(Grib2Error::UnexpectedSection { expected: last_section_number + 1, found: n, offset: pos }),
        }

        last_section_number = header.number;
        pos += header.length as usize;
    }

    if pos != message_end {
        tracing::warn!(
            computed = pos,
            expected = message_end,
            "GRIB2 message length disagrees with the sum of its sections"
        );
    }

    let section1 = section1.ok_or(Grib2Error::UnexpectedSection { expected: 1, found: 0, offset })?;
    let section3 = section3.ok_or(Grib2Error::UnexpectedSection { expected: 3, found: 0, offset })?;
    let section4 = section4.ok_or(Grib2Error::UnexpectedSection { expected: 4, found: 0, offset })?;
    let section5 = section5.ok_or(Grib2Error::UnexpectedSection { expected: 5, found: 0, offset })?;
    let section7 = section7.ok_or(Grib2Error::UnexpectedSection { expected: 7, found: 0, offset })?;

    Ok(Message {
        discipline,
        edition,
        total_length,
        section1,
        section2,
        section3,
        section4,
        section5,
        section6,
        section7,
    })
}

fn decode_section7(section5: &Section5, number_of_data_points: usize, body: &[u8]) -> Section7 {
    match &section5.record {
        DataRepresentation::Simple(sp) => Section7::Decoded(decoder::decode_simple(sp, body, number_of_data_points)),
        DataRepresentation::Complex(cp) => {
            Section7::Decoded(decoder::decode_complex(cp, None, body, number_of_data_points))
        }
        DataRepresentation::ComplexSpatialDiff(cp, sdp) => {
            Section7::Decoded(decoder::decode_complex(cp, Some(sdp), body, number_of_data_points))
        }
        DataRepresentation::Unsupported(_) => {
            tracing::warn!(template = section5.template_number, "unsupported data representation template, keeping raw bytes");
            Section7::Raw(body.to_vec())
        }
    }
}
