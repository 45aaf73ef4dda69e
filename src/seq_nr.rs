/// RTP sequence number.
#[derive(PartialEq, Eq, Clone, Copy, Default, Hash)]
pub struct SeqNr(pub u16);

impl SeqNr {
    /// How many packets after `base` this one is, counting across the u16 wrap.
    pub fn distance_from(self, base: SeqNr) -> u16 {
        self.0.wrapping_sub(base.0)
    }
}

impl From<u16> for SeqNr {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for SeqNr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::fmt::Debug for SeqNr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
