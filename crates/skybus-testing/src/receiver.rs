//! Scripted packet source for dispatcher tests.

use std::sync::Arc;

use parking_lot::Mutex;

use skybus_core::dispatch::PacketReceiver;
use skybus_core::time::Duration;

use crate::channel::PacketChannel;

/// [`PacketReceiver`] fed from a [`PacketChannel`].
///
/// Each `receive` call consumes one finished packet and honours the
/// received-size contract: the return value is the full packet length even
/// when the destination buffer was smaller and the copy got truncated.
pub struct ScriptedReceiver {
    channel: Arc<Mutex<PacketChannel>>,
}

impl ScriptedReceiver {
    pub fn new() -> Self {
        Self {
            channel: Arc::new(Mutex::new(PacketChannel::new())),
        }
    }

    /// Handle for the test to script packets through.
    pub fn channel(&self) -> Arc<Mutex<PacketChannel>> {
        Arc::clone(&self.channel)
    }

    /// Script one complete packet.
    pub fn push_packet(&self, data: &[u8]) {
        let mut channel = self.channel.lock();
        channel.append(data);
        channel.finish_packet();
    }
}

impl Default for ScriptedReceiver {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketReceiver for ScriptedReceiver {
    fn receive(&mut self, buffer: &mut [u8], _timeout: Duration) -> u32 {
        let Some(packet) = self.channel.lock().next_packet() else {
            return 0;
        };
        let copied = packet.len().min(buffer.len());
        buffer[..copied].copy_from_slice(&packet[..copied]);
        packet.len() as u32
    }
}
