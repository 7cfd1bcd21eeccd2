/// TimestampExtender widens the coarse trigger time tag of one channel to 64 bits.
///
/// Digitizers only keep a `tag_bits` wide counter, which rolls over every
/// `2^tag_bits` samples. Tags of one channel arrive in order, so a tag smaller than the
/// previous one means the counter wrapped, and the extension grows by one period.
/// The widened counter is then converted to time units with the sample period, and the
/// channel's delay line is added. The result saturates at `u64::MAX`.
#[derive(Debug, Clone)]
pub struct TimestampExtender {
    tag_mask: u64,
    sample_period: u64,
    delay_line: u64,
    previous_tag: u64,
    extension: u64,
}

impl TimestampExtender {
    /// Create an extender for tags `tag_bits` wide (1..=63)
    pub fn new(tag_bits: u32, sample_period: u64, delay_line: u64) -> Self {
        TimestampExtender {
            tag_mask: (1u64 << tag_bits) - 1,
            sample_period,
            delay_line,
            previous_tag: 0,
            extension: 0,
        }
    }

    /// Extend the next coarse tag of this channel. Bits above the tag width are ignored.
    pub fn extend(&mut self, coarse_tag: u64) -> u64 {
        let tag = coarse_tag & self.tag_mask;
        if tag < self.previous_tag {
            self.extension = self.extension.saturating_add(self.tag_mask + 1);
        }
        self.previous_tag = tag;
        self.extension
            .saturating_add(tag)
            .saturating_mul(self.sample_period)
            .saturating_add(self.delay_line)
    }

    /// Number of rollovers seen so far
    pub fn rollovers(&self) -> u64 {
        self.extension / (self.tag_mask + 1)
    }

    /// Forget all history, used at the start of a run
    pub fn reset(&mut self) {
        self.previous_tag = 0;
        self.extension = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_rollover() {
        let mut ext = TimestampExtender::new(31, 1, 0);
        assert_eq!(ext.extend(10), 10);
        assert_eq!(ext.extend(10), 10);
        assert_eq!(ext.extend(500), 500);
        assert_eq!(ext.rollovers(), 0);
    }

    #[test]
    fn test_rollover_is_monotonic() {
        let mut ext = TimestampExtender::new(8, 1, 0);
        assert_eq!(ext.extend(250), 250);
        assert_eq!(ext.extend(3), 256 + 3);
        assert_eq!(ext.extend(200), 256 + 200);
        assert_eq!(ext.extend(1), 512 + 1);
        assert_eq!(ext.rollovers(), 2);
    }

    #[test]
    fn test_period_and_delay() {
        let mut ext = TimestampExtender::new(31, 4, 30);
        assert_eq!(ext.extend(100), 430);
    }

    #[test]
    fn test_huge_period_saturates() {
        let mut ext = TimestampExtender::new(31, u64::MAX / 2, 0);
        assert_eq!(ext.extend(1), u64::MAX / 2);
        assert_eq!(ext.extend(3), u64::MAX);
        let mut ext = TimestampExtender::new(31, 1, u64::MAX);
        assert_eq!(ext.extend(5), u64::MAX);
    }

    #[test]
    fn test_high_bits_ignored() {
        let mut ext = TimestampExtender::new(31, 1, 0);
        assert_eq!(ext.extend(0x8000_0005), 5);
    }

    #[test]
    fn test_reset() {
        let mut ext = TimestampExtender::new(8, 1, 0);
        ext.extend(255);
        ext.extend(0);
        ext.reset();
        assert_eq!(ext.extend(7), 7);
        assert_eq!(ext.rollovers(), 0);
    }
}
