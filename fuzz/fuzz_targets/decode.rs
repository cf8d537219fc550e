// cargo fuzz run decode corpus/decode -- -timeout=30

#![no_main]

use libfuzzer_sys::fuzz_target;

use gifanim::Decoder;

fuzz_target!(|data: &[u8]| {
    let decoder = Decoder::new(data).max_image_sz(Some(1 << 16));
    let frames = match decoder.into_frames() {
        Ok(frames) => frames,
        Err(_) => return,
    };
    for frame in frames {
        if frame.is_err() {
            return;
        }
    }
});
