use std::collections::VecDeque;

use super::fragment::Fragment;
use super::hardware_id::{ChannelId, ChannelLayout};

/// A bounded FIFO of decoded fragments for a single digitizer input.
///
/// The capacity is fixed when the queue is made; the queue never grows past it. When the
/// queue is full, pushed fragments are handed back to the caller, who is responsible for
/// counting them as lost.
#[derive(Debug, Clone)]
pub struct ChannelQueue {
    fragments: VecDeque<Fragment>,
    capacity: usize,
}

impl ChannelQueue {
    pub fn new(capacity: usize) -> Self {
        ChannelQueue {
            fragments: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a fragment to the back of the queue.
    ///
    /// Returns `Err(fragment)` if the queue is full.
    pub fn push(&mut self, fragment: Fragment) -> Result<(), Fragment> {
        if self.is_full() {
            return Err(fragment);
        }
        self.fragments.push_back(fragment);
        Ok(())
    }

    /// Remove the oldest fragment
    pub fn pop(&mut self) -> Option<Fragment> {
        self.fragments.pop_front()
    }

    /// Look at the oldest fragment without removing it
    pub fn peek(&self) -> Option<&Fragment> {
        self.fragments.front()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.fragments.len() >= self.capacity
    }

    pub fn is_almost_full(&self, level: usize) -> bool {
        self.fragments.len() > level
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop everything in the queue, returning how many fragments were dropped
    pub fn clear(&mut self) -> usize {
        let n = self.fragments.len();
        self.fragments.clear();
        n
    }
}

/// QueueSet holds one [ChannelQueue] per input of a [ChannelLayout].
///
/// Queues are stored flat, board-major. Indexing with a ChannelId outside of the layout
/// panics.
#[derive(Debug, Clone)]
pub struct QueueSet {
    layout: ChannelLayout,
    queues: Vec<ChannelQueue>,
    almost_full_level: usize,
}

impl QueueSet {
    pub fn new(layout: ChannelLayout, capacity: usize, almost_full_level: usize) -> Self {
        let queues = vec![ChannelQueue::new(capacity); layout.size()];
        QueueSet {
            layout,
            queues,
            almost_full_level,
        }
    }

    pub fn layout(&self) -> &ChannelLayout {
        &self.layout
    }

    pub fn queue(&self, id: &ChannelId) -> &ChannelQueue {
        &self.queues[self.layout.index(id)]
    }

    pub fn queue_mut(&mut self, id: &ChannelId) -> &mut ChannelQueue {
        let index = self.layout.index(id);
        &mut self.queues[index]
    }

    /// Push a fragment into the queue of its own channel
    pub fn push(&mut self, fragment: Fragment) -> Result<(), Fragment> {
        let id = fragment.id;
        self.queue_mut(&id).push(fragment)
    }

    pub fn pop(&mut self, id: &ChannelId) -> Option<Fragment> {
        self.queue_mut(id).pop()
    }

    pub fn peek(&self, id: &ChannelId) -> Option<&Fragment> {
        self.queue(id).peek()
    }

    /// Is any enabled queue above the almost-full level
    pub fn any_almost_full(&self) -> bool {
        self.layout
            .iter_enabled()
            .any(|id| self.queue(&id).is_almost_full(self.almost_full_level))
    }

    /// Does every enabled input have at least one fragment waiting
    pub fn all_enabled_ready(&self) -> bool {
        self.layout
            .iter_enabled()
            .all(|id| !self.queue(&id).is_empty())
    }

    /// Are all queues of a board empty
    pub fn is_board_empty(&self, board: usize) -> bool {
        let n_channels = self.layout.n_channels();
        self.queues[board * n_channels..(board + 1) * n_channels]
            .iter()
            .all(|q| q.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.queues.iter().all(|q| q.is_empty())
    }

    /// Total number of queued fragments
    pub fn len(&self) -> usize {
        self.queues.iter().map(|q| q.len()).sum()
    }

    /// Drop every queued fragment, returning the total dropped
    pub fn clear_all(&mut self) -> usize {
        self.drain_all().into_iter().sum()
    }

    /// Drop every queued fragment, returning the number dropped per input (flat index)
    pub fn drain_all(&mut self) -> Vec<usize> {
        self.queues.iter_mut().map(|q| q.clear()).collect()
    }
}
