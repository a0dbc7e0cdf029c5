//! Batch-salvage stream parser (§4.3).
//!
//! Maintains a sliding window of at least `2 * FRAME_MAX_LEN - 1` bytes and
//! tries every byte offset not yet ruled out as a candidate frame start.
//! Recovers frames embedded in noise (a run of garbage before a valid
//! frame, or two frames separated by a corrupted gap) at the cost of rare
//! false positives from CRC-8 collisions.

use std::time::{Duration, Instant};

use crate::constants::{FRAME_MAX_LEN, FRAME_MIN_LEN};
use crate::packet::Packet;
use crate::parser::{clamp_max_length, strip_leading_break};
use crate::util::IoBuffer;

/// Once the buffer grows past this with no offset left untested, the window
/// is dropped and scanning restarts clean.
const WINDOW_LIMIT: usize = 2 * FRAME_MAX_LEN - 1;

pub struct SalvageParser {
    buffer: IoBuffer,
    tested: Vec<bool>,
    last_activity: Option<Instant>,
    timeout: Duration,
    filter_max_length: bool,
    filter_breaks: bool,
}

impl SalvageParser {
    pub fn new(packet_timeout_ms: u64) -> Self {
        Self::with_config(packet_timeout_ms, true, true)
    }

    pub fn with_config(packet_timeout_ms: u64, filter_max_length: bool, filter_breaks: bool) -> Self {
        SalvageParser {
            buffer: IoBuffer::new(),
            tested: Vec::new(),
            last_activity: None,
            timeout: Duration::from_millis(packet_timeout_ms),
            filter_max_length,
            filter_breaks,
        }
    }

    pub fn write(&mut self, data: &[u8]) -> Vec<Packet> {
        self.reset_on_inactivity();
        self.last_activity = Some(Instant::now());

        let data = clamp_max_length(data, self.filter_max_length);
        let data = strip_leading_break(data, self.filter_breaks, self.buffer.is_empty());
        if data.is_empty() {
            return Vec::new();
        }

        self.buffer
            .write(data)
            .expect("unlimited-capacity buffer never rejects a write");
        self.tested.resize(self.buffer.len(), false);

        let packets = self.scan();
        self.drop_window_if_exhausted();
        packets
    }

    fn reset_on_inactivity(&mut self) {
        if let Some(last) = self.last_activity {
            if last.elapsed() >= self.timeout {
                self.buffer.clear();
                self.tested.clear();
            }
        }
    }

    fn scan(&mut self) -> Vec<Packet> {
        let mut packets = Vec::new();

        loop {
            let mut hit = None;

            for offset in 0..self.buffer.len() {
                if self.tested[offset] {
                    continue;
                }
                let remaining = self.buffer.len() - offset;
                if remaining < FRAME_MIN_LEN {
                    // Not enough bytes yet to even read the length nibble's
                    // frame; leave untested until more data arrives.
                    continue;
                }

                let header = self.buffer.peek_range(offset, 2);
                let declared_len = (header[1] & 0x0F) as usize;
                let total = 3 + declared_len;
                if remaining < total {
                    // Could still become valid once more bytes arrive.
                    continue;
                }

                let candidate = self.buffer.peek_range(offset, total);
                match Packet::from_bytes(&candidate, true) {
                    Ok(packet) => {
                        hit = Some((offset, total, packet));
                        break;
                    }
                    Err(_) => self.tested[offset] = true,
                }
            }

            match hit {
                Some((offset, total, packet)) => {
                    let consumed = offset + total;
                    self.buffer.consume(consumed);
                    self.tested.drain(0..consumed.min(self.tested.len()));
                    packets.push(packet);
                }
                None => break,
            }
        }

        packets
    }

    /// `scan` already extracts every packet it can find; if the window still
    /// exceeds the limit afterwards, nothing left in it can ever resolve
    /// (every remaining offset either failed CRC or can't reach a full
    /// frame within the window), so drop it and start clean.
    fn drop_window_if_exhausted(&mut self) {
        if self.buffer.len() >= WINDOW_LIMIT {
            self.buffer.clear();
            self.tested.clear();
        }
    }
}
