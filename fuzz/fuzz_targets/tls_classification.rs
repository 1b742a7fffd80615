#![no_main]

use libfuzzer_sys::fuzz_target;
use tlsgate_classify::{classify, is_tls_related};

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let cause = classify(&text);
    let _ = cause.code();
    let _ = is_tls_related(&text);
});
