#![no_main]

use libfuzzer_sys::fuzz_target;
use wirebind::ReadStream;

fuzz_target!(|data: &[u8]| {
    // First byte picks the read sequence, the rest is the stream body
    let Some((&selector, body)) = data.split_first() else {
        return;
    };
    let mut stream = ReadStream::from_slice(body);

    for step in 0..8u8 {
        let before = stream.position();
        let ok = match selector.rotate_left(u32::from(step)) % 5 {
            0 => stream.read::<u8>().is_ok(),
            1 => stream.read::<u32>().is_ok(),
            2 => stream.read::<bool>().is_ok(),
            3 => stream.read_string().is_ok(),
            _ => stream.read_bytes().is_ok(),
        };
        assert!(stream.position() <= body.len());
        if !ok {
            assert_eq!(stream.position(), before);
        }
    }
});
