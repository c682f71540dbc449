use clap::Parser;
use isomorf_core::{Command, CoreError, Event, KeyboardCore};
use isomorf_domain_layout::LayoutPreset;
use isomorf_infra_audio_cpal::CpalAudioOutputPort;
use isomorf_infra_midi_midir::MidirOutputPort;
use isomorf_infra_synth_rustysynth::RustySynthBackend;
use isomorf_ports::audio::{AudioError, AudioOutputPort, AudioStreamHandle};
use isomorf_ports::backend::{BackendError, SoundBackend};
use isomorf_ports::settings::KeyboardSettings;
use isomorf_ports::types::{AudioConfig, SurfaceSize};
use std::io::{self, BufRead, Write};
use std::sync::Arc;

/// Isomorphic keyboard core speaking newline-delimited JSON on stdin/stdout.
#[derive(Debug, Parser)]
#[command(name = "isomorf-app", version)]
struct Cli {
    /// Play through the first MIDI output whose id or name contains this.
    #[arg(long = "midi-out")]
    midi_out: Option<String>,

    /// SoundFont loaded into the built-in sampler at startup.
    #[arg(long)]
    soundfont: Option<String>,

    /// Layout preset applied at startup.
    #[arg(long, value_parser = parse_preset)]
    preset: Option<LayoutPreset>,

    /// Print the available MIDI outputs and exit.
    #[arg(long = "list-midi-outputs")]
    list_midi_outputs: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn parse_preset(name: &str) -> Result<LayoutPreset, String> {
    LayoutPreset::from_name(name).ok_or_else(|| {
        let known: Vec<&str> = LayoutPreset::ALL.iter().map(|p| p.name()).collect();
        format!("unknown preset {name}; one of {}", known.join(", "))
    })
}

#[derive(thiserror::Error, Debug)]
enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Stderr)
        .init();
}

/// Backend plus whatever must stay alive for it to make sound.
struct Output {
    backend: Arc<dyn SoundBackend>,
    stream: Option<Box<dyn AudioStreamHandle>>,
}

fn open_output(options: &Cli) -> Result<Output, AppError> {
    if let Some(selector) = &options.midi_out {
        let backend = MidirOutputPort::default().connect(selector)?;
        log::info!("sound backend: MIDI output {}", backend.port_name());
        return Ok(Output {
            backend: Arc::new(backend),
            stream: None,
        });
    }

    let config = AudioConfig::default();
    let (backend, renderer) = RustySynthBackend::new(config.sample_rate_hz);
    let audio = CpalAudioOutputPort::new();
    let stream = audio
        .default_output()
        .and_then(|device| audio.open_output(&device, config, Box::new(renderer)));
    let stream = match stream {
        Ok(stream) => Some(stream),
        Err(err @ (AudioError::DeviceNotFound(_) | AudioError::DeviceUnavailable(_))) => {
            log::warn!("no audio output, running silent: {err}");
            None
        }
        Err(err) => {
            log::error!("audio output failed, running silent: {err}");
            None
        }
    };

    Ok(Output {
        backend: Arc::new(backend),
        stream,
    })
}

fn write_events(out: &mut impl Write, events: Vec<Event>) -> Result<(), AppError> {
    for event in events {
        writeln!(out, "{}", event.to_json_line()?)?;
    }
    out.flush()?;
    Ok(())
}

fn run(options: Cli) -> Result<(), AppError> {
    let output = open_output(&options)?;
    let mut core = KeyboardCore::new(
        output.backend.clone(),
        KeyboardSettings::default(),
        SurfaceSize::default(),
    )?;

    if let Some(preset) = options.preset {
        core.handle_command(Command::ApplyPreset { preset })?;
    }
    if let Some(path) = options.soundfont {
        if let Err(err) = core.handle_command(Command::LoadSoundBank { path }) {
            log::error!("{err}");
        }
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_events(&mut out, core.drain_events())?;

    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match Command::from_json_line(&line) {
            Ok(command) => {
                if let Err(err) = core.handle_command(command) {
                    log::warn!("command failed: {err}");
                }
            }
            Err(err) => log::warn!("bad command line: {err}"),
        }
        write_events(&mut out, core.drain_events())?;
    }

    log::info!("input closed, shutting down");
    core.handle_command(Command::AllNotesOff)?;
    if let Some(stream) = output.stream {
        stream.close();
    }
    Ok(())
}

fn list_midi_outputs(out: &mut impl Write) -> Result<(), AppError> {
    for device in MidirOutputPort::default().list_outputs()? {
        writeln!(out, "{}\t{}", device.id, device.name)?;
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = if cli.list_midi_outputs {
        list_midi_outputs(&mut io::stdout().lock())
    } else {
        run(cli)
    };
    if let Err(err) = result {
        eprintln!("isomorf: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_parse_into_options() {
        let cli = Cli::try_parse_from([
            "isomorf-app",
            "--midi-out",
            "fluid",
            "--preset",
            "wicki-hayden",
            "-v",
        ])
        .expect("valid flags");

        assert_eq!(cli.midi_out.as_deref(), Some("fluid"));
        assert_eq!(cli.preset, Some(LayoutPreset::WickiHayden));
        assert_eq!(cli.soundfont, None);
        assert!(cli.verbose);
        assert!(!cli.list_midi_outputs);
    }

    #[test]
    fn unknown_preset_is_rejected() {
        let err = Cli::try_parse_from(["isomorf-app", "--preset", "qwerty"])
            .expect_err("unknown preset");

        assert!(err.to_string().contains("unknown preset qwerty"));
    }

    #[test]
    fn no_flags_means_the_builtin_sampler() {
        let cli = Cli::try_parse_from(["isomorf-app"]).expect("valid flags");

        assert_eq!(cli.midi_out, None);
        assert_eq!(cli.preset, None);
    }
}
