use std::sync::mpsc::Sender;

use super::channel_queue::QueueSet;
use super::config::Config;
use super::correlator::Correlator;
use super::error::{ConfigError, ReadoutError};
use super::event_builder::{BuiltEvent, EventBuilder};
use super::fragment::{DppPayload, Fragment};
use super::hardware_id::{ChannelId, ChannelLayout};
use super::ready_table::ReadyTable;
use super::replay::{ReplayFile, ReplayRecord};
use super::sink::EventSink;
use super::stats::ReadoutStats;
use super::status::ReadoutStatus;
use super::timestamp::TimestampExtender;

/// Readout is the cooperative readout loop around the event builder.
///
/// The decoder side calls [Readout::ingest] for every decoded trigger. The fragment gets
/// its coarse tag widened to 64 bits and is queued on its channel. [Readout::poll] then
/// runs one build cycle: fragments are moved from the queues into the ready table (by the
/// correlator, or one per channel when correlation is off), the table is built into an
/// event, and the event is handed to the sink.
///
/// Everything is single threaded and every table is sized once from the configuration.
#[derive(Debug)]
pub struct Readout {
    correlate: bool,
    queues: QueueSet,
    extenders: Vec<TimestampExtender>,
    table: ReadyTable,
    builder: EventBuilder,
    correlator: Correlator,
    event: BuiltEvent,
    stats: ReadoutStats,
}

impl Readout {
    /// Create a new Readout from a configuration. The configuration is validated first.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let layout = config.get_layout();
        let trigger = config.get_trigger();
        let extenders = layout
            .iter()
            .map(|id| {
                TimestampExtender::new(
                    config.tag_bits,
                    config.sample_period,
                    config.get_delay_line(&id),
                )
            })
            .collect();
        let builder = EventBuilder::new(&layout, trigger);

        Ok(Readout {
            correlate: config.correlate,
            table: ReadyTable::new(&layout),
            event: builder.new_event(),
            stats: ReadoutStats::new(&layout),
            correlator: Correlator::new(trigger, config.coincidence_window, config.require_partner),
            builder,
            extenders,
            queues: QueueSet::new(layout, config.queue_size, config.get_almost_full_level()),
        })
    }

    pub fn layout(&self) -> &ChannelLayout {
        self.queues.layout()
    }

    pub fn queues(&self) -> &QueueSet {
        &self.queues
    }

    pub fn stats(&self) -> &ReadoutStats {
        &self.stats
    }

    pub fn trigger(&self) -> &ChannelId {
        self.builder.trigger()
    }

    /// Hand a decoded trigger to the readout.
    ///
    /// Returns `Ok(false)` if the fragment was dropped, either because its input is disabled
    /// or because its queue is full. Addresses outside of the layout are an error.
    pub fn ingest(
        &mut self,
        board: usize,
        channel: usize,
        coarse_tag: u64,
        payload: DppPayload,
    ) -> Result<bool, ReadoutError> {
        let id = ChannelId::new(board, channel);
        if !self.layout().contains(&id) {
            return Err(ReadoutError::UnknownChannel(board, channel));
        }

        let index = self.layout().index(&id);
        let timestamp = self.extenders[index].extend(coarse_tag);
        let enabled = self.layout().is_enabled(&id);
        let stats = self.stats.channel_mut(&id);
        stats.received += 1;
        if !enabled {
            stats.discarded += 1;
            return Ok(false);
        }

        match self.queues.push(Fragment::new(id, timestamp, payload)) {
            Ok(()) => Ok(true),
            Err(_) => {
                stats.lost += 1;
                if stats.lost == 1 {
                    log::warn!("Queue of {id} is full; fragments are being lost");
                }
                Ok(false)
            }
        }
    }

    /// Hand a replayed list-mode record to the readout
    pub fn ingest_record(&mut self, record: ReplayRecord) -> Result<bool, ReadoutError> {
        self.ingest(
            record.board,
            record.channel,
            record.coarse_tag,
            record.payload,
        )
    }

    /// Run one build cycle.
    ///
    /// With correlation on, nothing happens until either some queue is almost full or every
    /// enabled input has data. If at that point the trigger queue is empty, the queued data
    /// can never be matched and is thrown away.
    ///
    /// Returns the number of fragments in the built event. Empty events are counted but not
    /// handed to the sink.
    pub fn poll<S: EventSink>(&mut self, sink: &mut S) -> Result<usize, ReadoutError> {
        if self.correlate {
            if !(self.queues.any_almost_full() || self.queues.all_enabled_ready()) {
                return Ok(0);
            }
            if self.queues.queue(self.correlator.trigger()).is_empty() {
                self.discard_queued();
                return Ok(0);
            }
            self.correlator
                .correlate(&mut self.queues, &mut self.table, &mut self.stats);
        } else {
            Correlator::take_heads(&mut self.queues, &mut self.table, &mut self.stats);
        }
        self.build_and_deliver(sink)
    }

    /// Build everything still buildable at the end of a run, then drop what is left
    pub fn flush<S: EventSink>(&mut self, sink: &mut S) -> Result<(), ReadoutError> {
        log::info!("Flushing {} queued fragments...", self.queues.len());
        if self.correlate {
            while !self.queues.queue(self.correlator.trigger()).is_empty() {
                self.correlator
                    .correlate(&mut self.queues, &mut self.table, &mut self.stats);
                self.build_and_deliver(sink)?;
            }
        } else {
            while !self.queues.is_empty() {
                Correlator::take_heads(&mut self.queues, &mut self.table, &mut self.stats);
                self.build_and_deliver(sink)?;
            }
        }
        let left = self.discard_queued();
        if left > 0 {
            log::info!("Discarded {left} fragments without a trigger at end of run");
        }
        Ok(())
    }

    fn build_and_deliver<S: EventSink>(&mut self, sink: &mut S) -> Result<usize, ReadoutError> {
        let n_fragments = self.builder.build_into(&mut self.table, &mut self.event);
        self.stats.record_build(n_fragments);
        if n_fragments == 0 {
            return Ok(0);
        }
        for fragment in self.event.iter() {
            self.stats.channel_mut(&fragment.id).matched += 1;
        }
        sink.accept(&self.event)?;
        Ok(n_fragments)
    }

    fn discard_queued(&mut self) -> usize {
        let n_channels = self.layout().n_channels();
        let mut total = 0;
        for (index, n) in self.queues.drain_all().into_iter().enumerate() {
            if n == 0 {
                continue;
            }
            let stats = self
                .stats
                .channel_mut(&ChannelId::from_flat_index(index, n_channels));
            stats.popped += n as u64;
            stats.discarded += n as u64;
            total += n;
        }
        if total > 0 {
            log::debug!("Trigger queue empty; discarded {total} queued fragments");
        }
        total
    }
}

/// The main loop of offline event building.
///
/// This takes in a config (and progress monitor), replays the list-mode data through a
/// Readout, and hands every built event to the sink. Returns the final statistics.
pub fn process<S: EventSink>(
    config: &Config,
    mut replay: ReplayFile,
    sink: &mut S,
    tx: &Sender<ReadoutStatus>,
) -> Result<ReadoutStats, ReadoutError> {
    let mut readout = Readout::new(config)?;
    log::info!(
        "Building events for {} boards x {} channels, trigger on {}",
        readout.layout().n_boards(),
        readout.layout().n_channels(),
        readout.trigger()
    );

    let flush_frac: f32 = 0.01;
    let mut progress: f32 = 0.0;
    tx.send(ReadoutStatus::new(0.0, 0, 0))?;

    while let Some(record) = replay.get_next_record()? {
        readout.ingest_record(record)?;
        readout.poll(sink)?;

        if replay.get_progress() - progress > flush_frac {
            progress = replay.get_progress();
            tx.send(ReadoutStatus::new(
                progress,
                readout.stats().built_events,
                readout.stats().total_lost(),
            ))?;
        }
    }

    readout.flush(sink)?;
    tx.send(ReadoutStatus::new(
        1.0,
        readout.stats().built_events,
        readout.stats().total_lost(),
    ))?;
    log::info!("Done building events.");

    Ok(readout.stats)
}
