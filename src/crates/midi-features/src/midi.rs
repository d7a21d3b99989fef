use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use std::path::Path;

use crate::error::{FeatureError, Result};

const MAX_DELTA: u32 = 0x0FFF_FFFF;
const MAX_TEMPO: u32 = 0x00FF_FFFF;

/// A MIDI event normalized at ingestion.
///
/// A note-on with velocity 0 is turned into a [`Event::NoteOff`] with
/// `from_note_on` set, so nothing downstream has to look at the
/// message type and the velocity together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A sounding note-on (velocity > 0)
    NoteOn { channel: u8, key: u8, velocity: u8 },
    /// A note release, explicit or through the note-on/velocity-0 idiom
    NoteOff {
        channel: u8,
        key: u8,
        velocity: u8,
        from_note_on: bool,
    },
    /// Set-tempo meta message in microseconds per quarter note
    Tempo(u32),
    EndOfTrack,
    /// Any other meta message
    Meta,
    /// Any other channel, sysex or escape event
    Other,
}

impl Event {
    /// Note-on on channel 0, normalized to a release when `velocity` is 0.
    pub fn note_on(key: u8, velocity: u8) -> Self {
        Self::channel_note_on(0, key, velocity)
    }

    /// Explicit note-off on channel 0.
    pub fn note_off(key: u8) -> Self {
        Event::NoteOff {
            channel: 0,
            key,
            velocity: 0,
            from_note_on: false,
        }
    }

    pub fn channel_note_on(channel: u8, key: u8, velocity: u8) -> Self {
        if velocity == 0 {
            Event::NoteOff {
                channel,
                key,
                velocity: 0,
                from_note_on: true,
            }
        } else {
            Event::NoteOn {
                channel,
                key,
                velocity,
            }
        }
    }

    pub fn is_note(&self) -> bool {
        matches!(self, Event::NoteOn { .. } | Event::NoteOff { .. })
    }

    pub fn is_meta(&self) -> bool {
        matches!(self, Event::Tempo(_) | Event::EndOfTrack | Event::Meta)
    }

    /// Note number of a note event
    pub fn key(&self) -> Option<u8> {
        match *self {
            Event::NoteOn { key, .. } | Event::NoteOff { key, .. } => Some(key),
            _ => None,
        }
    }

    fn from_midly(kind: TrackEventKind) -> Self {
        match kind {
            TrackEventKind::Midi { channel, message } => match message {
                MidiMessage::NoteOn { key, vel } => {
                    Self::channel_note_on(channel.as_int(), key.as_int(), vel.as_int())
                }
                MidiMessage::NoteOff { key, vel } => Event::NoteOff {
                    channel: channel.as_int(),
                    key: key.as_int(),
                    velocity: vel.as_int(),
                    from_note_on: false,
                },
                _ => Event::Other,
            },
            TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => Event::Tempo(tempo.as_int()),
            TrackEventKind::Meta(MetaMessage::EndOfTrack) => Event::EndOfTrack,
            TrackEventKind::Meta(_) => Event::Meta,
            _ => Event::Other,
        }
    }

    fn to_midly(self) -> Option<TrackEventKind<'static>> {
        let kind = match self {
            Event::NoteOn {
                channel,
                key,
                velocity,
            } => TrackEventKind::Midi {
                channel: u4::new(channel.min(15)),
                message: MidiMessage::NoteOn {
                    key: u7::new(key.min(127)),
                    vel: u7::new(velocity.min(127)),
                },
            },
            Event::NoteOff {
                channel,
                key,
                from_note_on: true,
                ..
            } => TrackEventKind::Midi {
                channel: u4::new(channel.min(15)),
                message: MidiMessage::NoteOn {
                    key: u7::new(key.min(127)),
                    vel: u7::new(0),
                },
            },
            Event::NoteOff {
                channel,
                key,
                velocity,
                from_note_on: false,
            } => TrackEventKind::Midi {
                channel: u4::new(channel.min(15)),
                message: MidiMessage::NoteOff {
                    key: u7::new(key.min(127)),
                    vel: u7::new(velocity.min(127)),
                },
            },
            Event::Tempo(tempo) => {
                TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo.min(MAX_TEMPO))))
            }
            Event::EndOfTrack => TrackEventKind::Meta(MetaMessage::EndOfTrack),
            Event::Meta | Event::Other => return None,
        };
        Some(kind)
    }
}

/// One message of a track: a delta time in ticks plus its event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message {
    pub delta: u32,
    pub event: Event,
}

impl Message {
    pub fn new(delta: u32, event: Event) -> Self {
        Message { delta, event }
    }
}

pub type Track = Vec<Message>;

/// An event placed on the file-wide tick timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedEvent {
    /// Absolute tick from the start of its track
    pub tick: u64,
    pub track: usize,
    pub event: Event,
}

/// In-memory MIDI file: a ticks-per-beat constant and independently
/// timed tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiFile {
    ticks_per_beat: u16,
    tracks: Vec<Track>,
}

impl MidiFile {
    pub fn new(ticks_per_beat: u16, tracks: Vec<Track>) -> Result<Self> {
        if ticks_per_beat == 0 {
            return Err(FeatureError::malformed_timing("ticks_per_beat is zero"));
        }
        Ok(MidiFile {
            ticks_per_beat,
            tracks,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::parse(&data)
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        let smf = Smf::parse(data).map_err(|e| FeatureError::Parse(e.to_string()))?;

        let ticks_per_beat = match smf.header.timing {
            Timing::Metrical(tpb) => tpb.as_int(),
            Timing::Timecode(fps, subframe) => {
                return Err(FeatureError::UnsupportedTiming(format!(
                    "SMPTE timecode ({} fps, {} ticks per frame)",
                    fps.as_f32(),
                    subframe
                )));
            }
        };

        let tracks = smf
            .tracks
            .iter()
            .map(|track| {
                track
                    .iter()
                    .map(|event| Message::new(event.delta.as_int(), Event::from_midly(event.kind)))
                    .collect()
            })
            .collect();

        Self::new(ticks_per_beat, tracks)
    }

    /// Serialize as a standard MIDI file.
    ///
    /// Only note, tempo and end-of-track events are written; the deltas of
    /// anything else are folded into the next written event so timing is kept.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let format = if self.tracks.len() == 1 {
            Format::SingleTrack
        } else {
            Format::Parallel
        };

        let mut tracks = Vec::with_capacity(self.tracks.len());
        for track in &self.tracks {
            let mut events: Vec<TrackEvent<'static>> = Vec::with_capacity(track.len() + 1);
            let mut pending: u32 = 0;
            let mut ended = false;

            for message in track {
                pending = pending.saturating_add(message.delta);
                let Some(kind) = message.event.to_midly() else {
                    continue;
                };
                events.push(TrackEvent {
                    delta: u28::new(pending.min(MAX_DELTA)),
                    kind,
                });
                pending = 0;
                if message.event == Event::EndOfTrack {
                    ended = true;
                    break;
                }
            }

            if !ended {
                events.push(TrackEvent {
                    delta: u28::new(pending.min(MAX_DELTA)),
                    kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
                });
            }
            tracks.push(events);
        }

        let smf = Smf {
            header: Header {
                format,
                timing: Timing::Metrical(u15::new(self.ticks_per_beat.min(0x7FFF))),
            },
            tracks,
        };

        let mut bytes = Vec::new();
        smf.write(&mut bytes)
            .map_err(|e| FeatureError::Write(format!("{:?}", e)))?;
        Ok(bytes)
    }

    /// A file with the same resolution and different tracks
    pub fn with_tracks(&self, tracks: Vec<Track>) -> MidiFile {
        MidiFile {
            ticks_per_beat: self.ticks_per_beat,
            tracks,
        }
    }

    pub fn ticks_per_beat(&self) -> u16 {
        self.ticks_per_beat
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// All messages of every track, in track order.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.tracks.iter().flatten()
    }

    /// Merge every track into one timeline ordered by absolute tick.
    /// Events at the same tick keep their track order.
    pub fn merged(&self) -> Vec<TimedEvent> {
        let mut timeline: Vec<TimedEvent> = self
            .tracks
            .iter()
            .enumerate()
            .flat_map(|(track_idx, track)| {
                let mut tick = 0u64;
                track.iter().map(move |message| {
                    tick += message.delta as u64;
                    TimedEvent {
                        tick,
                        track: track_idx,
                        event: message.event,
                    }
                })
            })
            .collect();

        timeline.sort_by_key(|e| e.tick);
        timeline
    }

    /// Number of sounding note-ons across all tracks
    pub fn note_count(&self) -> usize {
        self.messages()
            .filter(|m| matches!(m.event, Event::NoteOn { .. }))
            .count()
    }

    /// Length of the longest track in ticks
    pub fn duration_ticks(&self) -> u64 {
        self.tracks
            .iter()
            .map(|track| track.iter().map(|m| m.delta as u64).sum::<u64>())
            .max()
            .unwrap_or(0)
    }
}
