#![no_main]

use libfuzzer_sys::fuzz_target;
use icy_qoi::qoi_decode;

fuzz_target!(|data: &[u8]| {
    // The decoder should never panic, regardless of input
    let _ = qoi_decode(data);
});
