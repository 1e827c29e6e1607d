//! Grammar-specific box decoders, one module per box type.

mod avcc;
mod co64;
mod ftyp;
mod hdlr;
mod mdhd;
mod media_header;
mod mvhd;
mod stco;
mod stsc;
mod stsd;
mod stss;
mod stsz;
mod stts;
mod tkhd;
mod tref;

pub use avcc::AvcConfiguration;
pub use co64::Co64;
pub use ftyp::Ftyp;
pub use hdlr::Hdlr;
pub use mdhd::Mdhd;
pub use media_header::{Hmhd, Nmhd, Smhd, Vmhd};
pub use mvhd::Mvhd;
pub use stco::Stco;
pub use stsc::{SampleToChunkEntry, Stsc};
pub use stsd::{AudioDescription, MetadataDescription, Stsd, StsdEntry, VideoDescription};
pub use stss::Stss;
pub use stsz::Stsz;
pub use stts::{Stts, TimeToSampleEntry};
pub use tkhd::Tkhd;
pub use tref::Tref;
