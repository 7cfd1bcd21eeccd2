use super::fragment::Fragment;
use super::hardware_id::{ChannelId, ChannelLayout};

/// ReadyTable is the per-input ready state shared by the readout and the event builder.
///
/// Every input of the layout owns one slot. A slot holding a fragment is "ready"; an
/// empty slot is not. Because the flag and the fragment are the same `Option`, a slot can
/// never be ready without its fragment being fully written.
///
/// The table is allocated once from the layout and never resized. Indexing with a
/// ChannelId outside of the layout panics.
#[derive(Debug, Clone)]
pub struct ReadyTable {
    n_channels: usize,
    slots: Vec<Option<Fragment>>,
}

impl ReadyTable {
    pub fn new(layout: &ChannelLayout) -> Self {
        ReadyTable {
            n_channels: layout.n_channels(),
            slots: vec![None; layout.size()],
        }
    }

    /// Mark the fragment's channel as ready, holding the fragment.
    ///
    /// If the channel already held an unharvested fragment it is replaced and returned.
    pub fn mark_ready(&mut self, fragment: Fragment) -> Option<Fragment> {
        let index = fragment.id.flat_index(self.n_channels);
        self.slots[index].replace(fragment)
    }

    pub fn is_ready(&self, id: &ChannelId) -> bool {
        self.slots[id.flat_index(self.n_channels)].is_some()
    }

    pub fn get(&self, id: &ChannelId) -> Option<&Fragment> {
        self.slots[id.flat_index(self.n_channels)].as_ref()
    }

    /// Harvest the fragment of a channel, leaving it not ready
    pub fn take(&mut self, id: &ChannelId) -> Option<Fragment> {
        self.slots[id.flat_index(self.n_channels)].take()
    }

    pub fn clear(&mut self, id: &ChannelId) {
        self.slots[id.flat_index(self.n_channels)] = None;
    }

    pub fn clear_all(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }

    pub fn ready_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Number of slots, ready or not
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    pub fn n_channels(&self) -> usize {
        self.n_channels
    }

    /// Ready fragments in board-major, channel-minor order
    pub fn iter_ready(&self) -> impl Iterator<Item = &Fragment> {
        self.slots.iter().filter_map(|slot| slot.as_ref())
    }

    /// Mutable access to the raw slots, board-major
    pub(crate) fn slots_mut(&mut self) -> &mut [Option<Fragment>] {
        &mut self.slots
    }
}
