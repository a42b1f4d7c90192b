//! Fixed-width header parsing modules.

pub mod blockette;
pub mod fixed_header;
pub mod pack_header;

pub use blockette::{find_blockette_1000, Blockette1000, ChainScan};
pub use fixed_header::{is_data_indicator, ByteOrder, FixedHeader, FixedHeaderParser};
pub use pack_header::{PackHeader, PackHeaderParser, PackKind};
