// SPDX-FileCopyrightText: 2025 The vita49-rs Authors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
/*!
Supervisor: wires the configuration store, subscriber registry,
statistics, and front end together, spawns the control and streaming
threads, and prints a stats line every 5 seconds until a stop signal
arrives.
*/

use std::net::UdpSocket;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{error, info};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::flag;

use vrt_streamer::cli::{self, Args};
use vrt_streamer::config::{ConfigStore, RadioParams};
use vrt_streamer::control;
use vrt_streamer::frontend::SimulatedFrontEnd;
use vrt_streamer::stats::Stats;
use vrt_streamer::streaming;
use vrt_streamer::subscribers::SubscriberRegistry;

const STATS_TICK: Duration = Duration::from_secs(5);

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mtu = match cli::parse(&args) {
        Ok(Args::Help) => {
            print!("{}", cli::usage());
            return ExitCode::SUCCESS;
        }
        Ok(Args::Run { mtu }) => mtu,
        Err(e) => {
            eprintln!("{e}");
            eprint!("{}", cli::usage());
            return ExitCode::FAILURE;
        }
    };

    let samples_per_packet = vrt::samples_per_packet(mtu);
    let datagram_size = vrt::datagram_size(samples_per_packet);
    if datagram_size > mtu {
        log::warn!(
            "computed datagram size {datagram_size} exceeds MTU {mtu}; relying on IP fragmentation"
        );
    }
    info!("samples_per_packet={samples_per_packet} for MTU={mtu}");

    let control_socket = match UdpSocket::bind(("0.0.0.0", control::CONTROL_PORT)) {
        Ok(s) => s,
        Err(e) => {
            error!("failed to bind control socket on port {}: {e}", control::CONTROL_PORT);
            return ExitCode::FAILURE;
        }
    };
    let data_socket = match UdpSocket::bind(("0.0.0.0", 0)) {
        Ok(s) => s,
        Err(e) => {
            error!("failed to bind data socket: {e}");
            return ExitCode::FAILURE;
        }
    };

    let initial = RadioParams::default();
    info!(
        "default config: {:.3} MHz, {:.3} MSPS, {:.1} dB, control port {}, subscriber port {}",
        initial.center_freq_hz as f64 / 1e6,
        initial.sample_rate_hz as f64 / 1e6,
        initial.gain_db,
        control::CONTROL_PORT,
        control::SUBSCRIBER_PORT,
    );

    let config = Arc::new(ConfigStore::new(initial));
    let subscribers = Arc::new(SubscriberRegistry::new());
    let stats = Arc::new(Stats::new());
    // signal_hook's flag helper only ever sets a flag to `true` on
    // receipt, so this is a "stop requested" flag rather than a
    // "keep running" one.
    let stop = Arc::new(AtomicBool::new(false));

    if flag::register(SIGINT, Arc::clone(&stop)).is_err() {
        error!("failed to register SIGINT handler");
    }
    if flag::register(SIGTERM, Arc::clone(&stop)).is_err() {
        error!("failed to register SIGTERM handler");
    }

    let control_handle = {
        let config = Arc::clone(&config);
        let subscribers = Arc::clone(&subscribers);
        let stats = Arc::clone(&stats);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            control::run(&control_socket, &config, &subscribers, &stats, &stop);
        })
    };

    let streaming_handle = {
        let config = Arc::clone(&config);
        let subscribers = Arc::clone(&subscribers);
        let stats = Arc::clone(&stats);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let mut front_end = SimulatedFrontEnd::new(config.snapshot());
            streaming::run(
                &data_socket,
                &mut front_end,
                &config,
                &subscribers,
                &stats,
                samples_per_packet,
                &stop,
            );
        })
    };

    while !stop.load(Ordering::Acquire) {
        thread::sleep(STATS_TICK);
        let snap = stats.snapshot();
        info!(
            "packets_sent={} bytes_sent={} contexts_sent={} reconfigurations={} \
             refill_failures={} send_failures={} underflows={} overflows={} \
             timestamp_jumps={} subscriber_table_full={} subscribers={} \
             loop_time_us(min/avg/max)={:?}/{:?}/{:?}",
            snap.packets_sent,
            snap.bytes_sent,
            snap.contexts_sent,
            snap.reconfigurations,
            snap.refill_failures,
            snap.send_failures,
            snap.underflows,
            snap.overflows,
            snap.timestamp_jumps,
            snap.subscriber_table_full,
            subscribers.len(),
            snap.loop_time_min_us,
            snap.loop_time_avg_us,
            snap.loop_time_max_us,
        );
    }

    info!("stop signal received, shutting down");
    let _ = control_handle.join();
    let _ = streaming_handle.join();
    ExitCode::SUCCESS
}
