use clap::{Arg, Command};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use std::path::PathBuf;
use std::sync::mpsc;

use libdigi_evb::config::Config;
use libdigi_evb::readout::process;
use libdigi_evb::replay::ReplayFile;
use libdigi_evb::sink::CountingSink;
use libdigi_evb::status::ReadoutStatus;

fn main() {
    // Create a cli
    let matches = Command::new("digi_evb_cli")
        .arg_required_else_help(true)
        .subcommand(Command::new("new").about("Make a template configuration yaml file"))
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .required(true)
                .help("Path to the configuration file"),
        )
        .get_matches();

    // Initialize feedback
    let logger = simplelog::TermLogger::new(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );

    let pb_manager = MultiProgress::new();

    LogWrapper::new(pb_manager.clone(), logger)
        .try_init()
        .expect("Could not create logging/progress!");

    // Parse the cli
    let config_path = PathBuf::from(matches.get_one::<String>("path").expect("We require args"));

    if let Some(("new", _)) = matches.subcommand() {
        log::info!(
            "Making a template config at {}...",
            config_path.to_string_lossy()
        );
        match Config::default().write_config_file(&config_path) {
            Ok(()) => log::info!("Done."),
            Err(e) => log::error!("Could not write template config: {e}"),
        }
        return;
    }

    // Load our config
    log::info!("Loading config from {}...", config_path.to_string_lossy());
    let config = match Config::read_config_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e}");
            return;
        }
    };
    log::info!("Config successfully loaded.");
    log::info!(
        "Boards: {} Channels per board: {}",
        config.n_boards,
        config.n_channels
    );
    log::info!("Trigger: {}", config.get_trigger());
    log::info!(
        "Correlate: {} Window: {} Require partner: {}",
        config.correlate,
        config.coincidence_window,
        config.require_partner
    );
    log::info!(
        "Queue size: {} Almost full level: {}",
        config.queue_size,
        config.get_almost_full_level()
    );
    log::info!(
        "Tag bits: {} Sample period: {}",
        config.tag_bits,
        config.sample_period
    );

    let replay_path = match &config.replay_path {
        Some(path) => path.clone(),
        None => {
            log::error!("Config has no replay_path; nothing to build.");
            return;
        }
    };
    log::info!("Replay Path: {}", replay_path.to_string_lossy());
    let replay = match ReplayFile::open(&replay_path) {
        Ok(r) => r,
        Err(e) => {
            log::error!("{e}");
            return;
        }
    };

    // Setup the progress bar
    let pb = pb_manager.add(ProgressBar::new(100));
    if let Ok(style) =
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>3}% {wide_msg}")
    {
        pb.set_style(style);
    }
    let (tx, rx) = mpsc::channel::<ReadoutStatus>();

    // Spawn the task!
    let handle = std::thread::spawn(move || {
        let mut sink = CountingSink::default();
        process(&config, replay, &mut sink, &tx).map(|stats| (stats, sink))
    });

    // The channel closes when the worker is done
    for status in rx.iter() {
        pb.set_position((status.progress * 100.0) as u64);
        pb.set_message(format!(
            "events: {} lost: {}",
            status.built_events, status.lost_fragments
        ));
    }

    match handle.join() {
        Ok(result) => match result {
            Ok((stats, sink)) => {
                log::info!("Successfully built events!");
                log::info!(
                    "Sink saw {} events, {} fragments, largest multiplicity {}",
                    sink.events,
                    sink.fragments,
                    sink.max_multiplicity
                );
                for line in stats.to_string().lines() {
                    log::info!("{line}");
                }
            }
            Err(e) => log::error!("Event building failed with error: {e}"),
        },
        Err(_) => log::error!("Failed to join event building task!"),
    }

    pb.finish();

    log::info!("Done.");
}
