#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PduParseErr {
    /// Block CRC did not match.
    Crc { calculated: u16, expected: u16 },
    /// FEC decode failed beyond repair.
    Fec,
    /// Opcode not known for this manufacturer/direction. The de-FEC'd block
    /// payload is retained for logging.
    UnknownLco { mfid: u8, lco: u8, raw: [u8; 8] },
    /// Ran out of bits mid-field.
    BufferEnded { field: Option<&'static str> },
    /// A field held a value outside its allowed range.
    InvalidValue { field: &'static str, value: u64 },
    /// Input shorter than the frame or block this codec expects.
    Truncated { needed: usize, got: usize },
}

/// Reads a fixed-width field into a local of the same name:
/// `let_field!(buf, src_id, 24);`
#[macro_export]
macro_rules! let_field {
    ($buf:expr, $ident:ident, $bits:expr) => {
        let $ident = $buf.read_field($bits, stringify!($ident))?;
    };
}
