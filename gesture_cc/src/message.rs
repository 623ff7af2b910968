//! The 3-byte Control Change message handed to the MIDI sink.

/// Status nibble for Control Change.
const CONTROL_CHANGE: u8 = 0xB0;

/// A single MIDI Control Change.
///
/// `channel` is 1–16 as configured; [`CcMessage::to_bytes`] produces the
/// 0-based wire nibble.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CcMessage {
    pub channel:   u8,
    pub cc_number: u8,
    pub value:     u8,
}

impl CcMessage {
    pub fn new(channel: u8, cc_number: u8, value: u8) -> Self {
        CcMessage { channel, cc_number, value }
    }

    /// `[0xB0 | (channel-1), cc_number, value]`.
    ///
    /// Out-of-range inputs are masked rather than trusted, so the output is
    /// always a well-formed message.
    pub fn to_bytes(&self) -> [u8; 3] {
        let ch = self.channel.saturating_sub(1) & 0x0F;
        [CONTROL_CHANGE | ch, self.cc_number & 0x7F, self.value & 0x7F]
    }
}
