#![no_main]
use libfuzzer_sys::fuzz_target;
use mseed_stream::parsing::{FixedHeaderParser, PackHeaderParser};
use mseed_stream::{MiniSeed2, MiniSeed2Decoder, RecordDecoder, RecordFormat};

fuzz_target!(|data: &[u8]| {
    let _ = FixedHeaderParser::parse(data);
    let _ = PackHeaderParser::parse(data);
    let _ = MiniSeed2.probe_length(data);
    let _ = MiniSeed2Decoder.decode(data, true);
});
