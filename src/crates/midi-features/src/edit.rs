//! Derived copies of a file: leading silence removed, or cut to a duration.
//!
//! Both operations take the file by reference and return a new one; the
//! input can be reused for other computations afterwards.

use crate::clock::TickClock;
use crate::error::{FeatureError, Result};
use crate::midi::{Event, MidiFile, Track};

/// Remove the silence before the first note of every track.
///
/// In each track the first sounding note-on gets a zero delta; nothing after
/// it changes. Tracks without notes are copied untouched.
pub fn lstrip(midi: &MidiFile) -> MidiFile {
    let tracks = midi
        .tracks()
        .iter()
        .map(|track| {
            let mut track = track.clone();
            if let Some(first) = track
                .iter_mut()
                .find(|m| matches!(m.event, Event::NoteOn { .. }))
            {
                first.delta = 0;
            }
            track
        })
        .collect();

    midi.with_tracks(tracks)
}

/// Cut every track to `max_secs` seconds at `tempo`.
///
/// Only note events advance the running tick count. Messages are copied
/// while the count stays within the limit, end-of-track markers excluded,
/// then trailing note-ons are dropped so no track ends on a note that
/// never stops. A track left with nothing is an error.
pub fn trim(midi: &MidiFile, tempo: u32, max_secs: f64) -> Result<MidiFile> {
    if !max_secs.is_finite() || max_secs < 0.0 {
        return Err(FeatureError::malformed_timing(format!(
            "trim duration must be a non-negative number of seconds, got {}",
            max_secs
        )));
    }
    let clock = TickClock::new(midi.ticks_per_beat(), tempo)?;
    let max_ticks = clock.seconds_to_ticks(max_secs);

    let mut tracks = Vec::with_capacity(midi.tracks().len());
    for (idx, track) in midi.tracks().iter().enumerate() {
        if track.is_empty() {
            return Err(FeatureError::EmptyTrack { track: idx });
        }

        let mut elapsed = 0u64;
        let mut copied: Track = Vec::new();
        for message in track {
            if message.event.is_note() {
                elapsed += message.delta as u64;
            }
            if elapsed <= max_ticks && message.event != Event::EndOfTrack {
                copied.push(*message);
            }
        }

        while matches!(copied.last(), Some(m) if matches!(m.event, Event::NoteOn { .. })) {
            copied.pop();
        }
        if copied.is_empty() {
            return Err(FeatureError::NothingCopied {
                track: idx,
                max_ticks,
            });
        }
        tracks.push(copied);
    }

    Ok(midi.with_tracks(tracks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::Message;
    use proptest::prelude::*;

    fn file(tracks: Vec<Vec<Message>>) -> MidiFile {
        MidiFile::new(480, tracks).unwrap()
    }

    #[test]
    fn test_lstrip_zeroes_first_note_only() {
        let midi = file(vec![vec![
            Message::new(0, Event::Tempo(500_000)),
            Message::new(480, Event::note_on(60, 100)),
            Message::new(240, Event::note_off(60)),
            Message::new(120, Event::note_on(62, 100)),
        ]]);
        let stripped = lstrip(&midi);
        let deltas: Vec<u32> = stripped.tracks()[0].iter().map(|m| m.delta).collect();
        assert_eq!(deltas, vec![0, 0, 240, 120]);

        // input left as it was
        assert_eq!(midi.tracks()[0][1].delta, 480);
    }

    #[test]
    fn test_lstrip_stops_at_first_note_even_when_already_zero() {
        let midi = file(vec![vec![
            Message::new(0, Event::note_on(60, 100)),
            Message::new(480, Event::note_on(62, 100)),
        ]]);
        assert_eq!(lstrip(&midi), midi);
    }

    #[test]
    fn test_lstrip_leaves_tracks_without_notes() {
        let midi = file(vec![
            vec![Message::new(96, Event::Tempo(400_000))],
            vec![Message::new(96, Event::note_on(60, 100))],
        ]);
        let stripped = lstrip(&midi);
        assert_eq!(stripped.tracks()[0], midi.tracks()[0]);
        assert_eq!(stripped.tracks()[1][0].delta, 0);
    }

    #[test]
    fn test_trim_drops_dangling_note_on() {
        // one second at 120 BPM is 960 ticks
        let midi = file(vec![vec![
            Message::new(0, Event::Tempo(500_000)),
            Message::new(0, Event::note_on(60, 100)),
            Message::new(480, Event::note_off(60)),
            Message::new(0, Event::note_on(62, 100)),
            Message::new(960, Event::note_off(62)),
            Message::new(0, Event::EndOfTrack),
        ]]);
        let trimmed = trim(&midi, 500_000, 1.0).unwrap();
        let track = &trimmed.tracks()[0];

        assert_eq!(track.len(), 3);
        assert_eq!(track.last().unwrap().event, Event::note_off(60));
        assert_eq!(trimmed.ticks_per_beat(), 480);
    }

    #[test]
    fn test_trim_keeps_everything_within_limit() {
        let midi = file(vec![vec![
            Message::new(0, Event::note_on(60, 100)),
            Message::new(480, Event::note_off(60)),
            Message::new(0, Event::EndOfTrack),
        ]]);
        let trimmed = trim(&midi, 500_000, 10.0).unwrap();
        assert_eq!(trimmed.tracks()[0], midi.tracks()[0][..2].to_vec());
    }

    #[test]
    fn test_trim_pops_every_trailing_note_on() {
        let midi = file(vec![vec![
            Message::new(0, Event::note_on(60, 100)),
            Message::new(240, Event::note_off(60)),
            Message::new(0, Event::note_on(64, 100)),
            Message::new(0, Event::note_on(67, 100)),
            Message::new(960, Event::note_off(64)),
        ]]);
        let trimmed = trim(&midi, 500_000, 0.5).unwrap();
        assert_eq!(trimmed.tracks()[0].len(), 2);
    }

    #[test]
    fn test_trim_errors() {
        let empty_track = file(vec![vec![]]);
        assert!(matches!(
            trim(&empty_track, 500_000, 1.0),
            Err(FeatureError::EmptyTrack { track: 0 })
        ));

        let only_end = file(vec![vec![Message::new(0, Event::EndOfTrack)]]);
        assert!(matches!(
            trim(&only_end, 500_000, 1.0),
            Err(FeatureError::NothingCopied { track: 0, .. })
        ));

        let only_onsets = file(vec![vec![
            Message::new(0, Event::note_on(60, 100)),
            Message::new(0, Event::note_on(64, 100)),
            Message::new(960, Event::note_off(60)),
        ]]);
        assert!(matches!(
            trim(&only_onsets, 500_000, 0.5),
            Err(FeatureError::NothingCopied { track: 0, max_ticks: 480 })
        ));

        let late = file(vec![vec![Message::new(0, Event::note_on(60, 100))]]);
        assert!(matches!(
            trim(&late, 0, 1.0),
            Err(FeatureError::MalformedTiming(_))
        ));
        assert!(matches!(
            trim(&late, 500_000, f64::INFINITY),
            Err(FeatureError::MalformedTiming(_))
        ));
    }

    fn track_strategy() -> impl Strategy<Value = Vec<Message>> {
        let event = prop_oneof![
            (0u8..128, 0u8..128).prop_map(|(k, v)| Event::note_on(k, v)),
            (0u8..128).prop_map(Event::note_off),
            Just(Event::Meta),
            (1u32..1_000_000).prop_map(Event::Tempo),
        ];
        prop::collection::vec((0u32..2000, event), 1..40)
            .prop_map(|v| v.into_iter().map(|(d, e)| Message::new(d, e)).collect())
    }

    proptest! {
        #[test]
        fn lstrip_is_idempotent(tracks in prop::collection::vec(track_strategy(), 0..4)) {
            let midi = file(tracks);
            let once = lstrip(&midi);
            prop_assert_eq!(lstrip(&once), once);
        }

        #[test]
        fn trim_never_ends_on_note_on(track in track_strategy(), secs in 0.0f64..5.0) {
            if let Ok(trimmed) = trim(&file(vec![track]), 500_000, secs) {
                for track in trimmed.tracks() {
                    let ends_on_note_on = matches!(
                        track.last().map(|m| m.event),
                        Some(Event::NoteOn { .. })
                    );
                    prop_assert!(!ends_on_note_on);
                    prop_assert!(!track.is_empty());
                }
            }
        }
    }
}
