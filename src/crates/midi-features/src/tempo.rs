use crate::midi::{Event, MidiFile};

/// Default tempo: 120 BPM = 500000 microseconds per beat
pub const DEFAULT_TEMPO: u32 = 500_000;

/// First tempo message of the file, scanning tracks in order.
pub fn find_tempo(midi: &MidiFile) -> Option<u32> {
    midi.messages().find_map(|m| match m.event {
        Event::Tempo(tempo) => Some(tempo),
        _ => None,
    })
}

/// Governing tempo of the file in microseconds per quarter note.
///
/// Only the first tempo message is honored; later tempo changes are not
/// taken into account by any tick-to-time conversion in this crate.
/// Use [`tempo_changes`] to detect files where that matters.
pub fn resolve_tempo(midi: &MidiFile) -> u32 {
    find_tempo(midi).unwrap_or(DEFAULT_TEMPO)
}

/// Every tempo message of the file, in track order.
pub fn tempo_changes(midi: &MidiFile) -> Vec<u32> {
    midi.messages()
        .filter_map(|m| match m.event {
            Event::Tempo(tempo) => Some(tempo),
            _ => None,
        })
        .collect()
}

/// Tempo in beats per minute
pub fn tempo_to_bpm(tempo: u32) -> f64 {
    60_000_000.0 / tempo as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::Message;

    fn file(tracks: Vec<Vec<Message>>) -> MidiFile {
        MidiFile::new(480, tracks).unwrap()
    }

    #[test]
    fn test_missing_tempo_defaults_to_120_bpm() {
        let midi = file(vec![vec![
            Message::new(0, Event::note_on(60, 100)),
            Message::new(480, Event::note_off(60)),
        ]]);
        assert_eq!(resolve_tempo(&midi), 500_000);
        assert_eq!(find_tempo(&midi), None);
        assert!((tempo_to_bpm(resolve_tempo(&midi)) - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_first_tempo_wins() {
        let midi = file(vec![
            vec![
                Message::new(0, Event::Meta),
                Message::new(0, Event::Tempo(600_000)),
                Message::new(960, Event::Tempo(300_000)),
            ],
            vec![Message::new(0, Event::Tempo(250_000))],
        ]);
        assert_eq!(resolve_tempo(&midi), 600_000);
        assert_eq!(tempo_changes(&midi), vec![600_000, 300_000, 250_000]);
    }

    #[test]
    fn test_tempo_in_later_track() {
        let midi = file(vec![
            vec![Message::new(0, Event::note_on(60, 100))],
            vec![Message::new(0, Event::Tempo(400_000))],
        ]);
        assert_eq!(resolve_tempo(&midi), 400_000);
    }
}
