//! Field-level codecs for P25 trunking signaling: TSBK and TDULC messages,
//! plus the error detection and correction primitives they ride on.

pub mod edac;
pub mod iden_table;
pub mod tdulc;
pub mod tsbk;

pub use iden_table::IdenTableEntry;
pub use tdulc::{Tdulc, TdulcLco};
pub use tsbk::{decode_tsbk, decode_tsbk_block, encode_tsbk, Tsbk, TsbkPayload};
