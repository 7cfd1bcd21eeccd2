use super::fragment::Fragment;
use super::hardware_id::{ChannelId, ChannelLayout};
use super::ready_table::ReadyTable;

/// BuiltEvent is the set of fragments harvested in one build cycle.
///
/// Each fragment carries its own board and channel. If the trigger channel was ready its
/// fragment is first; the rest follow in board-major, channel-minor order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuiltEvent {
    fragments: Vec<Fragment>,
    has_trigger: bool,
}

impl BuiltEvent {
    /// Create an empty event with room for every input of a layout
    pub fn with_capacity(capacity: usize) -> Self {
        BuiltEvent {
            fragments: Vec::with_capacity(capacity),
            has_trigger: false,
        }
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Fragment> {
        self.fragments.iter()
    }

    /// The trigger fragment, if the trigger channel was ready when this event was built
    pub fn trigger(&self) -> Option<&Fragment> {
        if self.has_trigger {
            self.fragments.first()
        } else {
            None
        }
    }

    /// Timestamp of the trigger fragment, or of the first fragment if there is no trigger
    pub fn timestamp(&self) -> Option<u64> {
        self.fragments.first().map(|f| f.timestamp)
    }

    /// Empty the event, keeping its allocation
    pub fn clear(&mut self) {
        self.fragments.clear();
        self.has_trigger = false;
    }

    fn push(&mut self, fragment: Fragment) {
        self.fragments.push(fragment);
    }
}

impl<'a> IntoIterator for &'a BuiltEvent {
    type Item = &'a Fragment;
    type IntoIter = std::slice::Iter<'a, Fragment>;

    fn into_iter(self) -> Self::IntoIter {
        self.fragments.iter()
    }
}

/// EventBuilder harvests the ready table into BuiltEvents.
///
/// The builder is anchored to one trigger channel. On each build the trigger fragment (if
/// ready) goes first, then every other ready channel is appended in board-major,
/// channel-minor order. Timestamps are never looked at here: whatever is ready gets built,
/// so any coincidence window has to be applied before channels are marked ready (see
/// [Correlator](crate::correlator::Correlator)).
///
/// Harvesting takes the fragment out of its slot, so every harvested channel is left not
/// ready. Building twice without new data gives an empty event the second time.
#[derive(Debug, Clone)]
pub struct EventBuilder {
    trigger: ChannelId,
    capacity: usize,
}

impl EventBuilder {
    /// Create a new EventBuilder.
    ///
    /// The trigger must be inside the layout; this is checked when the configuration is
    /// validated, not here.
    pub fn new(layout: &ChannelLayout, trigger: ChannelId) -> Self {
        EventBuilder {
            trigger,
            capacity: layout.size(),
        }
    }

    pub fn trigger(&self) -> &ChannelId {
        &self.trigger
    }

    /// Make an empty event sized for this builder, to be reused with
    /// [EventBuilder::build_into]
    pub fn new_event(&self) -> BuiltEvent {
        BuiltEvent::with_capacity(self.capacity)
    }

    /// Build into an existing event, reusing its allocation.
    ///
    /// Returns the number of fragments in the event. Zero means nothing was ready, which is
    /// not an error.
    pub fn build_into(&self, table: &mut ReadyTable, event: &mut BuiltEvent) -> usize {
        event.clear();
        let trigger_index = self.trigger.flat_index(table.n_channels());
        let slots = table.slots_mut();

        if let Some(fragment) = slots[trigger_index].take() {
            event.push(fragment);
            event.has_trigger = true;
        }

        for (index, slot) in slots.iter_mut().enumerate() {
            if index == trigger_index {
                continue;
            }
            if let Some(fragment) = slot.take() {
                event.push(fragment);
            }
        }

        event.len()
    }

    /// Build a freshly allocated event
    pub fn build_event(&self, table: &mut ReadyTable) -> BuiltEvent {
        let mut event = self.new_event();
        self.build_into(table, &mut event);
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::DppPayload;

    fn frag(board: usize, channel: usize, ts: u64) -> Fragment {
        Fragment::new(ChannelId::new(board, channel), ts, DppPayload::default())
    }

    fn ids(event: &BuiltEvent) -> Vec<(usize, usize)> {
        event.iter().map(|f| (f.board(), f.channel())).collect()
    }

    #[test]
    fn test_trigger_first_then_board_major() {
        let layout = ChannelLayout::new(2, 4);
        let builder = EventBuilder::new(&layout, ChannelId::new(1, 2));
        let mut table = ReadyTable::new(&layout);
        table.mark_ready(frag(1, 3, 10));
        table.mark_ready(frag(0, 1, 900));
        table.mark_ready(frag(1, 2, 500));
        table.mark_ready(frag(0, 0, 20));
        table.mark_ready(frag(1, 0, 5));

        let event = builder.build_event(&mut table);
        assert_eq!(event.len(), 5);
        assert_eq!(ids(&event), vec![(1, 2), (0, 0), (0, 1), (1, 0), (1, 3)]);
        assert_eq!(event.trigger().map(|f| f.timestamp), Some(500));
        assert_eq!(event.timestamp(), Some(500));
    }

    #[test]
    fn test_order_ignores_timestamps() {
        let layout = ChannelLayout::new(1, 4);
        let builder = EventBuilder::new(&layout, ChannelId::new(0, 0));
        let mut table = ReadyTable::new(&layout);
        table.mark_ready(frag(0, 1, 300));
        table.mark_ready(frag(0, 2, 200));
        table.mark_ready(frag(0, 3, 100));
        let event = builder.build_event(&mut table);
        let stamps: Vec<u64> = event.iter().map(|f| f.timestamp).collect();
        assert_eq!(stamps, vec![300, 200, 100]);
        assert!(event.trigger().is_none());
    }

    #[test]
    fn test_nothing_ready_is_empty() {
        let layout = ChannelLayout::new(2, 2);
        let builder = EventBuilder::new(&layout, ChannelId::new(0, 0));
        let mut table = ReadyTable::new(&layout);
        let mut event = builder.new_event();
        assert_eq!(builder.build_into(&mut table, &mut event), 0);
        assert!(event.is_empty());
        assert!(event.trigger().is_none());
        assert!(event.timestamp().is_none());
    }

    #[test]
    fn test_no_duplicates() {
        let layout = ChannelLayout::new(3, 3);
        let builder = EventBuilder::new(&layout, ChannelId::new(2, 1));
        let mut table = ReadyTable::new(&layout);
        for id in layout.iter() {
            table.mark_ready(Fragment::new(id, 0, DppPayload::default()));
        }
        let event = builder.build_event(&mut table);
        assert_eq!(event.len(), 9);
        let mut seen = ids(&event);
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 9);
        assert_eq!(ids(&event)[0], (2, 1));
    }

    #[test]
    fn test_harvest_clears_ready_state() {
        let layout = ChannelLayout::new(2, 2);
        let builder = EventBuilder::new(&layout, ChannelId::new(0, 0));
        let mut table = ReadyTable::new(&layout);
        table.mark_ready(frag(0, 0, 1));
        table.mark_ready(frag(1, 1, 2));
        let mut event = builder.new_event();
        assert_eq!(builder.build_into(&mut table, &mut event), 2);
        assert_eq!(table.ready_count(), 0);
        assert_eq!(builder.build_into(&mut table, &mut event), 0);
        assert!(event.is_empty());
    }
}
