const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Equal-tempered frequency in Hz of a MIDI note number (A4 = 69 = 440 Hz).
///
/// Any integer is accepted; numbers outside 0-127 give mathematically valid
/// but musically meaningless frequencies.
pub fn note_to_frequency(note: i32) -> f64 {
    440.0 * 2f64.powf((note - 69) as f64 / 12.0)
}

/// Scientific pitch name of a MIDI note number (e.g. 60 -> "C4", 69 -> "A4").
pub fn note_to_name(note: i32) -> String {
    let name = NOTE_NAMES[note.rem_euclid(12) as usize];
    let octave = note.div_euclid(12) - 1;

    format!("{}{}", name, octave)
}
