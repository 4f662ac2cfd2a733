use anyhow::{Context, Result, anyhow};
use clap::Parser;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Receiver;
use std::{
    collections::HashSet,
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use synth_bridge::{
    BridgeConfig, Clock, NoteController, RenderDriver, SynthBridge, SystemClock,
    midi::{MidiMessage, handler::MidiHandler},
};

/// Arpeggio played by --demo
const DEMO_NOTES: [u8; 6] = [60, 64, 67, 72, 67, 64];
const DEMO_STEP: Duration = Duration::from_millis(250);
const DEMO_NOTE_MS: f32 = 200.0;
const DEMO_SECONDS: f64 = 10.0;

/// Polyphonic note-event synthesiser bridge
#[derive(Parser, Debug)]
#[command(name = "synth-bridge")]
#[command(about = "Plays MIDI input or a demo arpeggio through the note-event bridge", long_about = None)]
struct Args {
    /// Configuration file (YAML); built-in defaults when omitted
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// List available devices and exit
    #[arg(short = 'l', long = "list")]
    list_devices: bool,

    /// Stop after this many seconds
    #[arg(short = 's', long = "seconds")]
    seconds: Option<f64>,

    /// Play a demo arpeggio through the note slot pool
    #[arg(short = 'd', long = "demo")]
    demo: bool,

    /// Debug logging (RUST_LOG still takes precedence)
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

/// List available audio output devices
fn list_audio_devices() -> Result<Vec<String>> {
    let host = cpal::default_host();

    let devices: Vec<String> = host
        .output_devices()?
        .filter_map(|device| {
            device
                .description()
                .ok()
                .map(|desc| desc.name().to_string())
        })
        .collect();

    Ok(devices)
}

/// Find a device index by index string or case-insensitive name substring
fn find_device(kind: &str, devices: &[String], search: &str) -> Result<usize> {
    if let Ok(index) = search.parse::<usize>() {
        if index < devices.len() {
            return Ok(index);
        }
        return Err(anyhow!("{} device index {} out of range ({} available)", kind, index, devices.len()));
    }

    let search_lower = search.to_lowercase();
    devices
        .iter()
        .position(|device| device.to_lowercase().contains(&search_lower))
        .ok_or_else(|| anyhow!("{} device '{}' not found", kind, search))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::builder()
        .filter_level(level)
        .parse_default_env()
        .init();

    if args.list_devices {
        println!("Available MIDI Input Devices:");
        for (i, device) in MidiHandler::list_devices()?.iter().enumerate() {
            println!("  {}: {}", i, device);
        }
        println!("\nAvailable Audio Output Devices:");
        for (i, device) in list_audio_devices()?.iter().enumerate() {
            println!("  {}: {}", i, device);
        }
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => BridgeConfig::load(path)?,
        None => BridgeConfig::default(),
    };

    run(&args, &config)
}

fn run(args: &Args, config: &BridgeConfig) -> Result<()> {
    let clock = Arc::new(SystemClock::new());
    let bridge = SynthBridge::with_config(config, clock.clone());
    let (mut controller, renderer) = bridge.split();

    let devices = config.devices.clone().unwrap_or_default();

    // MIDI input is optional; without it the bridge only plays the demo
    let (midi_tx, midi_rx) = crossbeam_channel::bounded(config.queue_capacity);
    let _midi_handler = match &devices.midiin {
        Some(search) => {
            let index = find_device("MIDI", &MidiHandler::list_devices()?, search)?;
            Some(MidiHandler::new_with_device(midi_tx, index)?)
        }
        None => None,
    };

    let host = cpal::default_host();
    let device = match &devices.audioout {
        Some(search) => {
            let index = find_device("Audio", &list_audio_devices()?, search)?;
            host.output_devices()?
                .nth(index)
                .ok_or_else(|| anyhow!("Selected audio device not available"))?
        }
        None => host
            .default_output_device()
            .ok_or_else(|| anyhow!("No audio output devices found"))?,
    };

    let audio_config = device
        .default_output_config()
        .context("Failed to query audio output config")?;
    let num_channels = audio_config.channels() as usize;

    let _stream = match audio_config.sample_format() {
        cpal::SampleFormat::F32 => {
            start_audio_stream::<f32>(&device, &audio_config.into(), renderer, num_channels)?
        }
        cpal::SampleFormat::I16 => {
            start_audio_stream::<i16>(&device, &audio_config.into(), renderer, num_channels)?
        }
        cpal::SampleFormat::U16 => {
            start_audio_stream::<u16>(&device, &audio_config.into(), renderer, num_channels)?
        }
        format => return Err(anyhow!("Unsupported sample format: {:?}", format)),
    };

    let run_for = args
        .seconds
        .or(args.demo.then_some(DEMO_SECONDS))
        .map(Duration::from_secs_f64);

    run_control_loop(&mut controller, clock.as_ref(), &midi_rx, config.tick_interval(), run_for, args.demo);

    controller.all_notes_off();
    // Let the releases ring out before the stream is dropped
    std::thread::sleep(Duration::from_secs_f32(config.synth.release) + config.tick_interval());
    Ok(())
}

/// Open the output stream and move the render half into its callback
fn start_audio_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut renderer: RenderDriver,
    num_channels: usize,
) -> Result<cpal::Stream>
where
    T: cpal::Sample + cpal::SizedSample + cpal::FromSample<f32>,
{
    renderer.prepare_to_play(config.sample_rate as f64);

    // Pre-allocate the mono render buffer
    let mut mono = vec![0.0f32; 4096];

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            renderer.render_interleaved(&mut mono, data, num_channels, |sample| T::from_sample(sample));
        },
        |err| log::error!(target: "bridge", "audio stream error: {err}"),
        None,
    )?;

    stream.play()?;

    Ok(stream)
}

/// Forward MIDI input, drive the demo and tick the slot pool until `run_for`
/// elapses (forever when None)
fn run_control_loop(
    controller: &mut NoteController,
    clock: &dyn Clock,
    midi_rx: &Receiver<MidiMessage>,
    tick: Duration,
    run_for: Option<Duration>,
    demo: bool,
) {
    let started = Instant::now();
    let mut next_demo_step = started;
    let mut demo_index = 0;
    let mut held = HashSet::new();

    loop {
        while let Ok(message) = midi_rx.try_recv() {
            forward_midi(controller, &mut held, message);
        }

        if demo && Instant::now() >= next_demo_step {
            let note = DEMO_NOTES[demo_index % DEMO_NOTES.len()];
            controller.play_note_event(1, note, 0.8, 0.0, DEMO_NOTE_MS);
            demo_index += 1;
            next_demo_step += DEMO_STEP;
        }

        controller.tick(clock.now());

        if run_for.is_some_and(|limit| started.elapsed() >= limit) {
            break;
        }

        std::thread::sleep(tick);
    }
}

/// `held` tracks notes triggered from the device so CC 123 can release them
/// alongside the slot pool
fn forward_midi(
    controller: &mut NoteController,
    held: &mut HashSet<(u8, u8)>,
    message: MidiMessage,
) {
    if message.is_all_notes_off() {
        for (channel, note) in held.drain() {
            controller.trigger_note_off(channel, note, 0.0);
        }
        controller.all_notes_off();
        return;
    }

    let velocity = message.normalized_velocity().unwrap_or(0.0);
    match message {
        MidiMessage::NoteOn { channel, note, .. } => {
            held.insert((channel, note));
            controller.trigger_note_on(channel, note, velocity);
        }
        MidiMessage::NoteOff { channel, note, .. } => {
            held.remove(&(channel, note));
            controller.trigger_note_off(channel, note, velocity);
        }
        _ => {}
    }
}
