use std::marker::PhantomData;

use super::fragment::Fragment;

/// Anything carrying a coarse timestamp the selector can order by
pub trait Timestamped {
    fn timestamp(&self) -> u64;
}

impl Timestamped for Fragment {
    fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

impl Timestamped for u64 {
    fn timestamp(&self) -> u64 {
        *self
    }
}

impl Timestamped for u32 {
    fn timestamp(&self) -> u64 {
        *self as u64
    }
}

/// Find the channel whose next unconsumed item has the smallest timestamp.
///
/// `buffers[ch]` holds the decoded items of channel `ch` and `cursors[ch]` is the index of
/// its next unconsumed item; a channel with `cursors[ch] >= buffers[ch].len()` is
/// exhausted. Returns `None` once every channel is exhausted.
///
/// Ties go to the lowest channel index. Timestamps are compared as plain unsigned
/// magnitudes: raw coarse tags that have wrapped on one channel but not another will be
/// misordered. Widen tags with a
/// [TimestampExtender](crate::timestamp::TimestampExtender) before selecting on them.
///
/// `cursors` must have one entry per buffer.
pub fn find_earliest_channel<T, B>(buffers: &[B], cursors: &[usize]) -> Option<usize>
where
    T: Timestamped,
    B: AsRef<[T]>,
{
    let mut earliest: Option<(usize, u64)> = None;
    for (channel, buffer) in buffers.iter().enumerate() {
        let Some(item) = buffer.as_ref().get(cursors[channel]) else {
            continue;
        };
        let time = item.timestamp();
        match earliest {
            Some((_, min)) if time >= min => (),
            _ => earliest = Some((channel, time)),
        }
    }
    earliest.map(|(channel, _)| channel)
}

/// TimeOrderedMerge walks a set of per-channel buffers in timestamp order.
///
/// Each step picks the earliest channel with [find_earliest_channel], yields
/// `(channel, item)`, and advances that channel's cursor. Each buffer must itself be in
/// time order for the output to be.
#[derive(Debug)]
pub struct TimeOrderedMerge<'a, T, B> {
    buffers: &'a [B],
    cursors: Vec<usize>,
    _item: PhantomData<&'a T>,
}

impl<'a, T, B> TimeOrderedMerge<'a, T, B>
where
    T: Timestamped,
    B: AsRef<[T]>,
{
    pub fn new(buffers: &'a [B]) -> Self {
        TimeOrderedMerge {
            buffers,
            cursors: vec![0; buffers.len()],
            _item: PhantomData,
        }
    }

    /// Current cursor of every channel
    pub fn cursors(&self) -> &[usize] {
        &self.cursors
    }
}

impl<'a, T, B> Iterator for TimeOrderedMerge<'a, T, B>
where
    T: Timestamped + 'a,
    B: AsRef<[T]>,
{
    type Item = (usize, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let channel = find_earliest_channel(self.buffers, &self.cursors)?;
        let buffers: &'a [B] = self.buffers;
        let buffer: &'a [T] = buffers[channel].as_ref();
        let item = &buffer[self.cursors[channel]];
        self.cursors[channel] += 1;
        Some((channel, item))
    }
}
