#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use wirebind::{Packet, PacketRegistry, ProcessOutcome, ReadStream, Result, WriteStream};

#[derive(Debug, Default)]
struct Chat {
    channel: u16,
    flagged: bool,
    text: String,
    attachment: Vec<u8>,
}

impl Packet for Chat {
    fn serialize(&self, stream: &mut WriteStream) -> Result<()> {
        stream.write(self.channel);
        stream.write(self.flagged);
        stream.write_string(&self.text);
        stream.write_bytes(&self.attachment);
        Ok(())
    }

    fn deserialize(&mut self, stream: &mut ReadStream) -> Result<()> {
        self.channel = stream.read()?;
        self.flagged = stream.read()?;
        self.text = stream.read_string()?;
        self.attachment = stream.read_bytes()?;
        Ok(())
    }

    fn process(&mut self) -> ProcessOutcome {
        ProcessOutcome::Success
    }
}

fuzz_target!(|data: &[u8]| {
    // Registry decode must never panic on arbitrary payloads
    let mut registry = PacketRegistry::new();
    let _ = registry.register::<Chat>(0x01);
    let _ = registry.handle(Bytes::copy_from_slice(data));
});
