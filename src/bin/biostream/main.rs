//! Host bench for the acquisition pipeline
//!
//! Runs the complete pipeline against a simulated ADC and publishes payloads
//! over `std::net`. A sampling clock thread stands in for the DMA
//! conversion-done interrupt.
//!
//! Arguments are settings overrides of the form `path=value` where `value`
//! is JSON, e.g.
//!
//! ```text
//! biostream /net/endpoint='"192.168.0.10:5000"' /processing/policy='"Mean"'
//! ```
use std::{
    net::SocketAddr,
    process, thread,
    time::{Duration, Instant as StdInstant},
};

use biostream::{
    hardware::InterruptHandler,
    metadata::ApplicationMetadata,
    net::{HttpClient, Instant, Publisher},
    processing::ProcessingTask,
    settings::Settings,
    telemetry::Counters,
};
use fugit::MillisDurationU32;
use portable_atomic::AtomicBool;
use stream::{split, Notification, PayloadQueue, Target};

mod sim;
mod std_stack;

/// Decimated samples per payload.
const PAYLOAD_SAMPLES: usize = 256;

fn settings() -> Settings {
    let mut settings = Settings::default();
    settings.net.endpoint = Target(SocketAddr::from(([127, 0, 0, 1], 5000)));

    for arg in std::env::args().skip(1) {
        let Some((path, value)) = arg.split_once('=') else {
            log::error!("Expected `path=value`, got `{arg}`");
            process::exit(2);
        };
        if let Err(e) =
            miniconf::json_core::set(&mut settings, path, value.as_bytes())
        {
            log::error!("Failed to set `{path}`: {e:?}");
            process::exit(2);
        }
    }

    if let Err(e) = settings.validate() {
        log::error!("Invalid settings: {e}");
        process::exit(2);
    }
    settings
}

fn report(counters: &Counters) {
    match serde_json_core::to_string::<_, 512>(&counters.snapshot()) {
        Ok(json) => log::info!("Telemetry: {json}"),
        Err(e) => log::warn!("Failed to serialize telemetry: {e:?}"),
    }
}

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .init();

    match serde_json_core::to_string::<_, 512>(&ApplicationMetadata::new()) {
        Ok(json) => log::info!("{json}"),
        Err(e) => log::warn!("Failed to serialize metadata: {e:?}"),
    }

    let settings = settings();
    if !settings.net.ssid.is_empty() {
        log::info!("Network `{}`", settings.net.ssid);
    }
    log::info!(
        "Publishing {PAYLOAD_SAMPLES} samples at {} Hz to http://{}{}",
        settings.output_rate(),
        settings.net.endpoint.0,
        settings.net.path
    );

    let data_ready = Notification::new();
    let payload_ready = Notification::new();
    let counters = Counters::new();
    // There is no link management on the host.
    let link = AtomicBool::new(true);
    let mut queue = PayloadQueue::<PAYLOAD_SAMPLES>::new();
    let (buffer, reader) = split(&mut queue, &payload_ready);

    let adc = sim::SimulatedAdc::new(&settings.adc, 0x5eed);
    let mut processing = ProcessingTask::new(
        adc,
        &data_ready,
        settings.filter_chain(),
        buffer,
        &counters,
        settings.processing_config(),
    );
    if let Err(e) = processing.start() {
        log::error!("Failed to start acquisition: {e}");
        process::exit(1);
    }

    let timeout = Duration::from_millis(settings.net.timeout_ms.into());
    let epoch = StdInstant::now();
    let http = HttpClient::new(
        std_stack::StdStack::new(timeout),
        move || Instant::from_ticks(epoch.elapsed().as_millis() as u32),
        &link,
        settings.net.endpoint,
        settings.net.path.clone(),
        MillisDurationU32::millis(settings.net.timeout_ms),
    );
    let mut publisher = Publisher::new(http, reader, &counters);

    let handler = InterruptHandler::new(&data_ready);
    let frame_period = Duration::from_secs_f64(
        settings.processing.decimation as f64
            / settings.adc.sample_frequency as f64,
    );
    let telemetry_period =
        Duration::from_secs(settings.telemetry_period.max(1).into());

    thread::scope(|s| {
        s.spawn(move || {
            futures::executor::block_on(processing.run());
        });
        s.spawn(move || {
            futures::executor::block_on(publisher.run());
        });
        s.spawn(|| loop {
            thread::sleep(telemetry_period);
            report(&counters);
        });

        // Sampling clock: one conversion-done event per completed frame.
        let mut next = StdInstant::now();
        loop {
            next += frame_period;
            if let Some(wait) = next.checked_duration_since(StdInstant::now()) {
                thread::sleep(wait);
            }
            handler.on_conversion_done();
        }
    })
}
