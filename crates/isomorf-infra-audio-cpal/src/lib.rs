mod interleave;

pub use interleave::{write_interleaved, StereoBuffer};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, FromSample, SampleFormat, SampleRate, SizedSample, StreamConfig, SupportedStreamConfigRange};
use isomorf_ports::audio::{AudioError, AudioOutputPort, AudioRenderCallback, AudioStreamHandle};
use isomorf_ports::types::{AudioConfig, AudioOutputDevice, DeviceId, SampleTime};
use std::sync::mpsc;
use std::thread;

const FALLBACK_BUFFER_FRAMES: usize = 8192;

pub struct CpalAudioOutputPort {
    host: cpal::Host,
}

struct SelectedStreamConfig {
    config: StreamConfig,
    sample_format: SampleFormat,
}

impl CpalAudioOutputPort {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }

    fn devices(host: &cpal::Host) -> Result<Vec<(DeviceId, cpal::Device)>, AudioError> {
        let host_id = format!("{:?}", host.id());
        let devices = host
            .output_devices()
            .map_err(|e| AudioError::Backend(e.to_string()))?;

        Ok(devices
            .enumerate()
            .map(|(index, device)| {
                let name = device
                    .name()
                    .unwrap_or_else(|_| "Unknown Output".to_string());
                (DeviceId(format!("cpal:{}:{}:{}", host_id, index, name)), device)
            })
            .collect())
    }

    fn select_stream_config(
        device: &cpal::Device,
        desired: AudioConfig,
    ) -> Result<SelectedStreamConfig, AudioError> {
        let supported = device
            .supported_output_configs()
            .map_err(|e| AudioError::Backend(e.to_string()))?;
        let chosen = best_supported_config(supported, desired)?;

        let sample_format = chosen.sample_format();
        let mut config = chosen.config();
        config.buffer_size = match desired.buffer_size_frames {
            Some(frames) => BufferSize::Fixed(frames),
            None => BufferSize::Default,
        };

        Ok(SelectedStreamConfig {
            config,
            sample_format,
        })
    }
}

impl Default for CpalAudioOutputPort {
    fn default() -> Self {
        Self::new()
    }
}

pub struct CpalAudioStreamHandle {
    stop_tx: mpsc::Sender<()>,
    join_handle: Option<thread::JoinHandle<()>>,
}

impl AudioStreamHandle for CpalAudioStreamHandle {
    fn close(mut self: Box<Self>) {
        let _ = self.stop_tx.send(());
        if let Some(handle) = self.join_handle.take() {
            let _ = handle.join();
        }
    }
}

impl AudioOutputPort for CpalAudioOutputPort {
    fn list_outputs(&self) -> Result<Vec<AudioOutputDevice>, AudioError> {
        let mut results = Vec::new();
        for (id, device) in Self::devices(&self.host)? {
            let Ok(default_config) = device.default_output_config() else {
                continue;
            };
            let name = device
                .name()
                .unwrap_or_else(|_| "Unknown Output".to_string());
            results.push(AudioOutputDevice {
                id,
                name,
                default_config: AudioConfig {
                    sample_rate_hz: default_config.sample_rate().0,
                    channels: default_config.channels(),
                    buffer_size_frames: None,
                },
            });
        }
        Ok(results)
    }

    fn default_output(&self) -> Result<DeviceId, AudioError> {
        let device = self
            .host
            .default_output_device()
            .ok_or_else(|| AudioError::DeviceNotFound("default output".to_string()))?;
        let name = device
            .name()
            .map_err(|e| AudioError::Backend(e.to_string()))?;

        Self::devices(&self.host)?
            .into_iter()
            .find(|(_, candidate)| candidate.name().is_ok_and(|n| n == name))
            .map(|(id, _)| id)
            .ok_or(AudioError::DeviceNotFound(name))
    }

    /// The stream lives on its own thread until the handle is closed.
    fn open_output(
        &self,
        device_id: &DeviceId,
        config: AudioConfig,
        mut cb: Box<dyn AudioRenderCallback>,
    ) -> Result<Box<dyn AudioStreamHandle>, AudioError> {
        let device_id = device_id.clone();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let join_handle = thread::spawn(move || {
            let started = (|| -> Result<cpal::Stream, AudioError> {
                let host = cpal::default_host();
                let device = Self::devices(&host)?
                    .into_iter()
                    .find(|(id, _)| id == &device_id)
                    .map(|(_, device)| device)
                    .ok_or_else(|| AudioError::DeviceNotFound(device_id.to_string()))?;

                let selected = Self::select_stream_config(&device, config)?;
                cb.set_sample_rate(selected.config.sample_rate.0);

                let stream = match selected.sample_format {
                    SampleFormat::F32 => build_stream::<f32>(&device, &selected.config, cb),
                    SampleFormat::I16 => build_stream::<i16>(&device, &selected.config, cb),
                    SampleFormat::U16 => build_stream::<u16>(&device, &selected.config, cb),
                    other => {
                        return Err(AudioError::UnsupportedConfig(format!(
                            "sample format {other:?}"
                        )))
                    }
                }
                .map_err(|e| AudioError::Backend(e.to_string()))?;

                stream
                    .play()
                    .map_err(|e| AudioError::Backend(e.to_string()))?;
                log::info!(
                    target: "isomorf::audio",
                    "audio output {device_id} running at {} Hz",
                    selected.config.sample_rate.0
                );
                Ok(stream)
            })();

            match started {
                Ok(stream) => {
                    let _ = ready_tx.send(Ok(()));
                    let _ = stop_rx.recv();
                    drop(stream);
                }
                Err(err) => {
                    let _ = ready_tx.send(Err(err));
                }
            }
        });

        ready_rx
            .recv()
            .map_err(|e| AudioError::Backend(e.to_string()))??;
        Ok(Box::new(CpalAudioStreamHandle {
            stop_tx,
            join_handle: Some(join_handle),
        }))
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut cb: Box<dyn AudioRenderCallback>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;
    let initial_frames = match config.buffer_size {
        BufferSize::Fixed(frames) => frames as usize,
        BufferSize::Default => FALLBACK_BUFFER_FRAMES,
    };
    let mut buffer = StereoBuffer::new(initial_frames);
    let mut sample_time: SampleTime = 0;

    device.build_output_stream(
        config,
        move |data: &mut [T], _info: &cpal::OutputCallbackInfo| {
            let frames = data.len() / channels.max(1);
            let (left, right) = buffer.frames(frames);
            cb.render(sample_time, left, right);
            write_interleaved(data, channels, left, right);
            sample_time = sample_time.saturating_add(frames as u64);
        },
        |err| log::error!(target: "isomorf::audio", "cpal stream error: {err}"),
        None,
    )
}

/// Prefers float output, then i16, then u16, at the requested rate and channel count.
fn best_supported_config(
    supported: impl Iterator<Item = SupportedStreamConfigRange>,
    desired: AudioConfig,
) -> Result<cpal::SupportedStreamConfig, AudioError> {
    supported
        .filter(|range| range.channels() == desired.channels)
        .filter(|range| {
            (range.min_sample_rate().0..=range.max_sample_rate().0)
                .contains(&desired.sample_rate_hz)
        })
        .filter_map(|range| {
            let score = match range.sample_format() {
                SampleFormat::F32 => 3,
                SampleFormat::I16 => 2,
                SampleFormat::U16 => 1,
                _ => return None,
            };
            Some((score, range))
        })
        .max_by_key(|(score, _)| *score)
        .map(|(_, range)| range.with_sample_rate(SampleRate(desired.sample_rate_hz)))
        .ok_or_else(|| AudioError::UnsupportedConfig("no matching stream config".to_string()))
}
