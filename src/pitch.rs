const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Reference tuning, A4
const A4_HZ: f64 = 440.0;
const A4_MIDI: f64 = 69.0;

/// Fractional MIDI note number of a frequency
pub fn frequency_to_midi(freq_hz: f64) -> f64 {
    A4_MIDI + 12.0 * (freq_hz / A4_HZ).log2()
}

/// Nearest equal-tempered note name, e.g. `440.0 -> "A4"`.
/// Non-positive frequencies (DC, silence) get an empty label.
pub fn label_frequency(freq_hz: f64) -> String {
    if freq_hz <= 0.0 || !freq_hz.is_finite() {
        return String::new();
    }

    let midi = frequency_to_midi(freq_hz).round() as i64;
    let name = NOTE_NAMES[midi.rem_euclid(12) as usize];
    let octave = midi.div_euclid(12) - 1;
    format!("{}{}", name, octave)
}
