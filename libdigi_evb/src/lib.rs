//! # digi_evb
//!
//! digi_evb is an event builder for multi-board, multi-channel waveform digitizers, written
//! in Rust. Every digitizer input produces a stream of triggers (fragments). Each fragment
//! carries a coarse hardware time tag and a DPP payload. digi_evb gathers coincident
//! fragments from all inputs into events anchored on a designated trigger channel.
//!
//! ## Installation
//!
//! The only method of install is from source. To build and install the CLI use
//! `cargo install --path ./digi_evb_cli` from the top level repository.
//!
//! ## Structure
//!
//! The library is built from small pieces which can also be used on their own:
//!
//! - [bitfield]: read and write bit ranges of hardware registers
//! - [channel_queue]: bounded per-input FIFOs of fragments
//! - [correlator]: select coincident fragments around a trigger
//! - [ready_table]: the fixed board x channel table of fragments ready for building
//! - [event_builder]: harvest the ready table into an event, trigger first
//! - [selector]: find the input holding the earliest pending fragment
//! - [readout]: the loop tying it all together, plus offline [readout::process]
//!
//! ## Configuration
//!
//! Configurations are YAML files. Use `digi_evb_cli --path config.yml new` to write a
//! template. An example:
//!
//! ```yaml
//! n_boards: 2
//! n_channels: 16
//! trigger_board: 0
//! trigger_channel: 0
//! coincidence_window: 100
//! correlate: true
//! require_partner: false
//! queue_size: 1024
//! almost_full_level: null
//! tag_bits: 31
//! sample_period: 2
//! delay_lines: null
//! enabled_inputs: null
//! replay_path: /path/to/run_0001.txt
//! ```
//!
//! - `coincidence_window` is in the same units as the widened timestamps, i.e. tag ticks
//! times `sample_period` (typically ns)
//! - `correlate: false` builds events from the head of every queue, whatever its time
//! - `require_partner` drops triggers that found no partner in the window
//! - `almost_full_level` defaults to 7/8 of `queue_size`
//! - `delay_lines` and `enabled_inputs` are per board tables of per channel values
//!
//! ## Replay files
//!
//! Offline building reads plain text list-mode files, one record per line:
//!
//! ```text
//! # board channel coarse_tag energy [energy_short]
//! 0 0 1000 1520 1200
//! 1 3 1012 880
//! ```
pub mod bitfield;
pub mod channel_queue;
pub mod config;
pub mod constants;
pub mod correlator;
pub mod error;
pub mod event_builder;
pub mod fragment;
pub mod hardware_id;
pub mod readout;
pub mod ready_table;
pub mod replay;
pub mod selector;
pub mod sink;
pub mod stats;
pub mod status;
pub mod timestamp;
