use std::io::Cursor;
use std::sync::mpsc;

use libdigi_evb::config::Config;
use libdigi_evb::event_builder::EventBuilder;
use libdigi_evb::fragment::{DppPayload, Fragment};
use libdigi_evb::hardware_id::{ChannelId, ChannelLayout};
use libdigi_evb::readout::process;
use libdigi_evb::ready_table::ReadyTable;
use libdigi_evb::replay::ReplayFile;
use libdigi_evb::selector::TimeOrderedMerge;
use libdigi_evb::sink::{CollectingSink, CountingSink};
use libdigi_evb::status::ReadoutStatus;

const TWO_BOARD_RUN: &str = "\
# board channel coarse_tag energy [energy_short]
0 0 1000 500 300
0 1 1010 400
1 0 1020 300
1 1 1100 200 # outside of the first window
0 0 2000 500
0 1 2005 100
1 0 2030 100
1 1 2040 100
";

fn replay(text: &str) -> ReplayFile {
    ReplayFile::from_reader(Cursor::new(text.as_bytes().to_vec()))
}

fn two_board_config() -> Config {
    Config {
        n_boards: 2,
        n_channels: 2,
        coincidence_window: 50,
        queue_size: 16,
        ..Default::default()
    }
}

#[test]
fn replay_correlates_and_builds() {
    let config = two_board_config();
    let (tx, rx) = mpsc::channel::<ReadoutStatus>();
    let mut sink = CollectingSink::new();

    let stats = process(&config, replay(TWO_BOARD_RUN), &mut sink, &tx).unwrap();

    assert_eq!(sink.len(), 2);
    for event in &sink.events {
        assert_eq!(event.len(), 3);
        assert_eq!(event.trigger().map(|f| f.id), Some(ChannelId::new(0, 0)));
        let ids: Vec<ChannelId> = event.iter().map(|f| f.id).collect();
        assert_eq!(
            ids,
            vec![
                ChannelId::new(0, 0),
                ChannelId::new(0, 1),
                ChannelId::new(1, 0)
            ]
        );
    }
    assert_eq!(sink.events[0].timestamp(), Some(1000));
    assert_eq!(sink.events[1].timestamp(), Some(2000));

    // Charges come through untouched; the short gate produces a PSD
    let trigger = &sink.events[0].fragments()[0];
    assert_eq!(trigger.payload.energy, 500);
    assert!((trigger.payload.psd - 0.4).abs() < 1e-6);

    // The stale (1,1)@1100 still counts as data waiting, so trigger 2000 is correlated
    // when (1,0)@2030 arrives, before (1,1)@2040. That in-window fragment is discarded at
    // the flush.
    let late = stats.channel(&ChannelId::new(1, 1));
    assert_eq!(late.received, 2);
    assert_eq!(late.matched, 0);
    assert_eq!(late.discarded, 2);
    assert_eq!(stats.built_events, 2);
    assert_eq!(stats.built_fragments, 6);
    assert_eq!(stats.total_received(), 8);
    assert_eq!(stats.total_lost(), 0);

    let updates: Vec<ReadoutStatus> = rx.try_iter().collect();
    assert!(updates.len() >= 2);
    let last = updates.last().unwrap();
    assert_eq!(last.progress, 1.0);
    assert_eq!(last.built_events, 2);
}

#[test]
fn replay_widens_wrapped_tags() {
    let text = "\
0 0 1000 10
0 1 1010 10
0 0 5 10
0 1 12 10
";
    let config = Config {
        n_boards: 1,
        n_channels: 2,
        coincidence_window: 20,
        tag_bits: 10,
        queue_size: 8,
        ..Default::default()
    };
    let (tx, _rx) = mpsc::channel();
    let mut sink = CollectingSink::new();
    process(&config, replay(text), &mut sink, &tx).unwrap();

    assert_eq!(sink.len(), 2);
    let stamps: Vec<u64> = sink.events[1].iter().map(|f| f.timestamp).collect();
    assert_eq!(stamps, vec![1029, 1036]);

    // Built events come out in time order once the tags are widened
    let buffers: Vec<Vec<Fragment>> = sink
        .events
        .iter()
        .map(|e| e.fragments().to_vec())
        .collect();
    let merged: Vec<u64> = TimeOrderedMerge::new(&buffers)
        .map(|(_, f)| f.timestamp)
        .collect();
    assert_eq!(merged, vec![1000, 1010, 1029, 1036]);
}

#[test]
fn replay_scales_and_delays() {
    let text = "\
0 0 100 10
0 1 98 10
";
    let config = Config {
        n_boards: 1,
        n_channels: 2,
        coincidence_window: 16,
        sample_period: 2,
        delay_lines: Some(vec![vec![0, 10]]),
        queue_size: 8,
        ..Default::default()
    };
    let (tx, _rx) = mpsc::channel();
    let mut sink = CollectingSink::new();
    process(&config, replay(text), &mut sink, &tx).unwrap();

    assert_eq!(sink.len(), 1);
    let stamps: Vec<u64> = sink.events[0].iter().map(|f| f.timestamp).collect();
    assert_eq!(stamps, vec![200, 206]);
}

#[test]
fn replay_requires_partner() {
    let text = "\
0 0 100 10
0 1 500 10
0 0 490 10
";
    let config = Config {
        n_boards: 1,
        n_channels: 2,
        coincidence_window: 20,
        require_partner: true,
        queue_size: 8,
        ..Default::default()
    };
    let (tx, _rx) = mpsc::channel();
    let mut sink = CountingSink::default();
    let stats = process(&config, replay(text), &mut sink, &tx).unwrap();

    assert_eq!(sink.events, 1);
    assert_eq!(sink.fragments, 2);
    assert_eq!(sink.max_multiplicity, 2);
    assert_eq!(stats.channel(&ChannelId::new(0, 0)).discarded, 1);
}

#[test]
fn replay_from_file() {
    let path = std::env::temp_dir().join("digi_evb_replay_from_file.txt");
    std::fs::write(&path, TWO_BOARD_RUN).unwrap();
    let file = ReplayFile::open(&path).unwrap();
    assert_eq!(file.get_total_data_size(), TWO_BOARD_RUN.len() as u64);

    let (tx, rx) = mpsc::channel();
    let mut sink = CountingSink::default();
    process(&two_board_config(), file, &mut sink, &tx).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(sink.events, 2);
    let progress: Vec<f32> = rx.try_iter().map(|s| s.progress).collect();
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(progress.last().copied(), Some(1.0));
}

#[test]
fn build_twice_is_empty() {
    let layout = ChannelLayout::new(2, 4);
    let mut table = ReadyTable::new(&layout);
    let builder = EventBuilder::new(&layout, ChannelId::new(1, 2));
    for id in [ChannelId::new(0, 3), ChannelId::new(1, 2), ChannelId::new(1, 0)] {
        table.mark_ready(Fragment::new(id, 0, DppPayload::default()));
    }

    let event = builder.build_event(&mut table);
    let ids: Vec<ChannelId> = event.iter().map(|f| f.id).collect();
    assert_eq!(
        ids,
        vec![
            ChannelId::new(1, 2),
            ChannelId::new(0, 3),
            ChannelId::new(1, 0)
        ]
    );
    assert_eq!(table.ready_count(), 0);
    assert!(builder.build_event(&mut table).is_empty());
}
