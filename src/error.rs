use thiserror::Error;

#[derive(Error, Debug)]
/// List of errors the library can return when reading a GRIB2 buffer
pub enum Grib2Error {
    #[error("section 0 does not start with the GRIB signature, or section 8 is not 7777")]
    /// Section 0's magic bytes weren't "GRIB", or section 8's weren't "7777"
    InvalidSignature,

    #[error("unsupported GRIB edition {0}, only edition 2 is supported")]
    /// The edition byte in section 0 wasn't 2
    UnsupportedEdition(u8),

    #[error("expected section {expected}, found section {found} at byte offset {offset}")]
    /// A section number byte didn't match the parser's expected state
    UnexpectedSection { expected: u8, found: u8, offset: usize },

    #[error("unsupported {kind} template {template}")]
    /// Section 3 wasn't grid template 0, or section 5 wasn't data template 0/2/3.
    /// The caller's message is retained with raw bytes in place of the field.
    UnsupportedTemplate { kind: &'static str, template: u16 },

    #[error("read of {n} bits at bit offset {bit_offset} exceeds buffer of {buffer_bits} bits")]
    /// A bit or byte read ran past the end of the buffer
    OutOfBounds { bit_offset: usize, n: u32, buffer_bits: usize },

    #[error("data payload exhausted after {produced} of {expected} values")]
    /// Section 7 ran out of bits before producing every expected value.
    /// The remaining values are zeroed rather than treated as fatal.
    TruncatedPayload { produced: usize, expected: usize },

    #[error("no inventory line matched the supplied pattern")]
    /// A `match` query matched zero messages
    NoMatch,

    #[error("regex pattern failed to compile: {0}")]
    /// The caller-supplied `match` pattern isn't a valid regex
    InvalidPattern(#[from] regex::Error),

    #[error("{0} is out of range")]
    /// A message index or interpolation target fell outside the valid domain
    OutOfRange(&'static str),
}
