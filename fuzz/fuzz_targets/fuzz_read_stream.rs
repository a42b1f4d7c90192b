#![no_main]
use libfuzzer_sys::fuzz_target;
use mseed_stream::{LengthMode, MiniSeed2Decoder, ReadOptions, RecordReader};
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    let Some((&flags, data)) = data.split_first() else {
        return;
    };

    let length = if flags & 1 == 0 {
        LengthMode::Detect
    } else {
        LengthMode::DetectEach
    };
    let options = ReadOptions::new(length)
        .skip_non_data(flags & 2 != 0)
        .unpack_data(flags & 4 != 0);

    let mut reader = RecordReader::new(Cursor::new(data), options);
    for record in reader.records(MiniSeed2Decoder) {
        if record.is_err() {
            break;
        }
    }
});
