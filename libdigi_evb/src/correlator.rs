use super::channel_queue::QueueSet;
use super::hardware_id::ChannelId;
use super::ready_table::ReadyTable;
use super::stats::ReadoutStats;

/// Correlator moves coincident fragments from the channel queues into the ready table.
///
/// A cycle is anchored on the oldest fragment of the trigger channel. Every other enabled
/// channel is walked in board-major order:
///
/// - fragments older than the trigger are stale and discarded
/// - a head fragment with `trigger <= ts < trigger + window` is a partner and marked ready
/// - anything later is left queued for a later trigger
///
/// At most one partner is taken per channel. The trigger is marked ready alongside its
/// partners. When `require_partner` is set a trigger without partners is dropped and
/// nothing is marked ready.
#[derive(Debug, Clone)]
pub struct Correlator {
    trigger: ChannelId,
    window: u64,
    require_partner: bool,
}

impl Correlator {
    pub fn new(trigger: ChannelId, window: u64, require_partner: bool) -> Self {
        Correlator {
            trigger,
            window,
            require_partner,
        }
    }

    pub fn trigger(&self) -> &ChannelId {
        &self.trigger
    }

    pub fn window(&self) -> u64 {
        self.window
    }

    /// Run one correlation cycle.
    ///
    /// Returns the number of fragments marked ready; zero if the trigger queue was empty or
    /// the trigger was dropped for lack of partners.
    pub fn correlate(
        &self,
        queues: &mut QueueSet,
        table: &mut ReadyTable,
        stats: &mut ReadoutStats,
    ) -> usize {
        let trigger = match queues.pop(&self.trigger) {
            Some(fragment) => fragment,
            None => return 0,
        };
        stats.channel_mut(&self.trigger).popped += 1;
        let start = trigger.timestamp;
        let stop = start.saturating_add(self.window);

        let partners: Vec<ChannelId> = queues
            .layout()
            .iter_enabled()
            .filter(|id| *id != self.trigger)
            .collect();

        let mut n_partners = 0;
        for id in partners {
            while let Some(ts) = queues.peek(&id).map(|f| f.timestamp) {
                if ts < start {
                    queues.pop(&id);
                    let channel = stats.channel_mut(&id);
                    channel.popped += 1;
                    channel.discarded += 1;
                    continue;
                }
                if ts < stop {
                    if let Some(partner) = queues.pop(&id) {
                        stats.channel_mut(&id).popped += 1;
                        table.mark_ready(partner);
                        n_partners += 1;
                    }
                }
                break;
            }
        }

        if n_partners == 0 && self.require_partner {
            stats.channel_mut(&self.trigger).discarded += 1;
            return 0;
        }
        table.mark_ready(trigger);
        n_partners + 1
    }

    /// Uncorrelated gathering: take the head of every enabled queue, whatever its time.
    ///
    /// Returns the number of fragments marked ready.
    pub fn take_heads(
        queues: &mut QueueSet,
        table: &mut ReadyTable,
        stats: &mut ReadoutStats,
    ) -> usize {
        let enabled: Vec<ChannelId> = queues.layout().iter_enabled().collect();
        let mut n_ready = 0;
        for id in enabled {
            if let Some(fragment) = queues.pop(&id) {
                stats.channel_mut(&id).popped += 1;
                table.mark_ready(fragment);
                n_ready += 1;
            }
        }
        n_ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::{DppPayload, Fragment};
    use crate::hardware_id::ChannelLayout;

    fn frag(board: usize, channel: usize, ts: u64) -> Fragment {
        Fragment::new(ChannelId::new(board, channel), ts, DppPayload::default())
    }

    fn setup(layout: ChannelLayout) -> (QueueSet, ReadyTable, ReadoutStats) {
        let table = ReadyTable::new(&layout);
        let stats = ReadoutStats::new(&layout);
        (QueueSet::new(layout, 16, 14), table, stats)
    }

    #[test]
    fn test_window() {
        let (mut queues, mut table, mut stats) = setup(ChannelLayout::new(1, 4));
        let corr = Correlator::new(ChannelId::new(0, 0), 100, false);
        queues.push(frag(0, 0, 1000)).unwrap();
        queues.push(frag(0, 1, 950)).unwrap(); // stale
        queues.push(frag(0, 1, 1050)).unwrap(); // partner
        queues.push(frag(0, 2, 1100)).unwrap(); // just outside
        queues.push(frag(0, 3, 1099)).unwrap(); // just inside

        assert_eq!(corr.correlate(&mut queues, &mut table, &mut stats), 3);
        assert!(table.is_ready(&ChannelId::new(0, 0)));
        assert_eq!(table.get(&ChannelId::new(0, 1)).map(|f| f.timestamp), Some(1050));
        assert!(!table.is_ready(&ChannelId::new(0, 2)));
        assert!(table.is_ready(&ChannelId::new(0, 3)));
        assert_eq!(queues.queue(&ChannelId::new(0, 2)).len(), 1);
        assert_eq!(stats.channel(&ChannelId::new(0, 1)).discarded, 1);
        assert_eq!(stats.channel(&ChannelId::new(0, 1)).popped, 2);
    }

    #[test]
    fn test_one_partner_per_channel() {
        let (mut queues, mut table, mut stats) = setup(ChannelLayout::new(1, 2));
        let corr = Correlator::new(ChannelId::new(0, 0), 100, false);
        queues.push(frag(0, 0, 0)).unwrap();
        queues.push(frag(0, 1, 10)).unwrap();
        queues.push(frag(0, 1, 20)).unwrap();
        assert_eq!(corr.correlate(&mut queues, &mut table, &mut stats), 2);
        assert_eq!(queues.queue(&ChannelId::new(0, 1)).len(), 1);
    }

    #[test]
    fn test_require_partner() {
        let (mut queues, mut table, mut stats) = setup(ChannelLayout::new(1, 2));
        let corr = Correlator::new(ChannelId::new(0, 0), 10, true);
        queues.push(frag(0, 0, 0)).unwrap();
        queues.push(frag(0, 1, 500)).unwrap();
        assert_eq!(corr.correlate(&mut queues, &mut table, &mut stats), 0);
        assert_eq!(table.ready_count(), 0);
        assert!(queues.queue(&ChannelId::new(0, 0)).is_empty());
        assert_eq!(stats.channel(&ChannelId::new(0, 0)).discarded, 1);

        let singles = Correlator::new(ChannelId::new(0, 0), 10, false);
        queues.push(frag(0, 0, 600)).unwrap();
        assert_eq!(singles.correlate(&mut queues, &mut table, &mut stats), 1);
        assert!(table.is_ready(&ChannelId::new(0, 0)));
    }

    #[test]
    fn test_empty_trigger_queue() {
        let (mut queues, mut table, mut stats) = setup(ChannelLayout::new(1, 2));
        let corr = Correlator::new(ChannelId::new(0, 0), 10, false);
        queues.push(frag(0, 1, 5)).unwrap();
        assert_eq!(corr.correlate(&mut queues, &mut table, &mut stats), 0);
        assert_eq!(queues.len(), 1);
    }

    #[test]
    fn test_disabled_inputs_ignored() {
        let layout =
            ChannelLayout::with_enabled(1, 3, &[ChannelId::new(0, 0), ChannelId::new(0, 2)]);
        let (mut queues, mut table, mut stats) = setup(layout);
        let corr = Correlator::new(ChannelId::new(0, 0), 10, false);
        queues.push(frag(0, 0, 5)).unwrap();
        queues.push(frag(0, 1, 5)).unwrap();
        queues.push(frag(0, 2, 6)).unwrap();
        assert_eq!(corr.correlate(&mut queues, &mut table, &mut stats), 2);
        assert!(!table.is_ready(&ChannelId::new(0, 1)));
    }

    #[test]
    fn test_take_heads() {
        let (mut queues, mut table, mut stats) = setup(ChannelLayout::new(2, 2));
        queues.push(frag(0, 1, 5)).unwrap();
        queues.push(frag(0, 1, 6)).unwrap();
        queues.push(frag(1, 0, 900)).unwrap();
        assert_eq!(Correlator::take_heads(&mut queues, &mut table, &mut stats), 2);
        assert_eq!(table.get(&ChannelId::new(0, 1)).map(|f| f.timestamp), Some(5));
        assert_eq!(queues.len(), 1);
    }
}
