use midiwire::{MidiError, Note};

#[test]
fn test_from_number_range() {
    assert!(Note::from_number(0).is_ok());
    assert!(Note::from_number(127).is_ok());

    let result = Note::from_number(128);
    assert!(matches!(result, Err(MidiError::Range(_))));
}

#[test]
fn test_octave_and_pitch_class() {
    let note = Note::from_number(60).unwrap();
    assert_eq!(note.number(), 60);
    assert_eq!(note.octave(), 5);
    assert_eq!(note.pitch_class(), 0);

    let note = Note::from_number(127).unwrap();
    assert_eq!(note.octave(), 10);
    assert_eq!(note.pitch_class(), 7);
}

#[test]
fn test_names_are_sharps_only() {
    let names: Vec<&str> = (0..12)
        .map(|n| Note::from_number(n).unwrap().name())
        .collect();
    assert_eq!(
        names,
        vec!["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"]
    );
    assert!(names.iter().all(|name| !name.contains('b')));
}

#[test]
fn test_display_name() {
    assert_eq!(Note::from_number(60).unwrap().display_name(), "C5");
    assert_eq!(Note::from_number(61).unwrap().display_name(), "C#5");
    assert_eq!(Note::from_number(0).unwrap().display_name(), "C0");

    // Display delegates to display_name
    assert_eq!(format!("{}", Note::from_number(70).unwrap()), "A#5");
}

#[test]
fn test_from_pitch_class_octave() {
    let note = Note::from_pitch_class_octave(0, 5).unwrap();
    assert_eq!(note.number(), 60);

    let note = Note::from_pitch_class_octave(11, 0).unwrap();
    assert_eq!(note.number(), 11);

    // Pitch class out of range
    assert!(Note::from_pitch_class_octave(12, 0).is_err());

    // Resulting number out of range: 11 + 10 * 12 = 131
    assert!(Note::from_pitch_class_octave(11, 10).is_err());

    // Highest valid note: 7 + 10 * 12 = 127
    let note = Note::from_pitch_class_octave(7, 10).unwrap();
    assert_eq!(note.number(), 127);
}
