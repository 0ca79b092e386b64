use scenedeck_core::cache::{AudioInput, AudioKind, InputIcon, Scene};
use scenedeck_core::reconcile::{
    mixer_entries, move_item, order_scenes, scene_buttons, write_back, ReorderError,
};

fn scenes(names: &[&str], active: &str) -> Vec<Scene> {
    names
        .iter()
        .map(|n| Scene {
            name: n.to_string(),
            is_active: *n == active,
        })
        .collect()
}

fn names(scenes: &[Scene]) -> Vec<&str> {
    scenes.iter().map(|s| s.name.as_str()).collect()
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[test]
fn saved_names_come_first_and_the_rest_are_appended() {
    let ordered = order_scenes(scenes(&["A", "B", "C"], "B"), &owned(&["C", "A"]));
    assert_eq!(names(&ordered), ["C", "A", "B"]);
    assert!(ordered[2].is_active);
}

#[test]
fn unsaved_scenes_keep_remote_order() {
    let remote = ["N1", "X", "N2", "N3", "Y"];
    let ordered = order_scenes(scenes(&remote, ""), &owned(&["Y", "X"]));
    assert_eq!(names(&ordered), ["Y", "X", "N1", "N2", "N3"]);
}

#[test]
fn dead_saved_names_are_ignored_when_rendering() {
    let ordered = order_scenes(scenes(&["A", "B"], "A"), &owned(&["Gone", "B", "Also Gone"]));
    assert_eq!(names(&ordered), ["B", "A"]);
}

#[test]
fn empty_saved_order_keeps_remote_order() {
    let ordered = order_scenes(scenes(&["C", "B", "A"], "A"), &[]);
    assert_eq!(names(&ordered), ["C", "B", "A"]);
}

#[test]
fn duplicate_saved_names_rank_by_first_position() {
    let ordered = order_scenes(scenes(&["A", "B"], ""), &owned(&["B", "A", "B"]));
    assert_eq!(names(&ordered), ["B", "A"]);
}

#[test]
fn write_back_keeps_dead_names_after_their_anchor() {
    let previous = owned(&["Intro", "Old Scene", "Live", "BRB"]);
    let rendered = owned(&["Live", "Intro", "BRB"]);
    assert_eq!(
        write_back(&rendered, &previous),
        owned(&["Live", "Intro", "Old Scene", "BRB"])
    );
}

#[test]
fn write_back_puts_leading_dead_names_first() {
    let previous = owned(&["Gone", "A", "B"]);
    let rendered = owned(&["B", "A", "New"]);
    assert_eq!(
        write_back(&rendered, &previous),
        owned(&["Gone", "B", "A", "New"])
    );
}

#[test]
fn recreated_scene_regains_its_position() {
    let previous = owned(&["A", "Old", "B"]);
    // "Old" is missing remotely while the user reorders
    let persisted = write_back(&owned(&["B", "A"]), &previous);
    assert_eq!(persisted, owned(&["B", "A", "Old"]));

    let ordered = order_scenes(scenes(&["A", "B", "Old", "Fresh"], ""), &persisted);
    assert_eq!(names(&ordered), ["B", "A", "Old", "Fresh"]);
}

#[test]
fn move_item_shifts_neighbours() {
    let order = owned(&["A", "B", "C", "D"]);
    assert_eq!(move_item(&order, 3, 0).unwrap(), owned(&["D", "A", "B", "C"]));
    assert_eq!(move_item(&order, 0, 2).unwrap(), owned(&["B", "C", "A", "D"]));
    assert_eq!(move_item(&order, 1, 1).unwrap(), order);
}

#[test]
fn move_item_rejects_positions_outside_the_list() {
    let err = move_item(&owned(&["A", "B"]), 0, 2).unwrap_err();
    assert!(matches!(err, ReorderError::OutOfRange { index: 2, len: 2 }));
}

#[test]
fn scene_buttons_mark_only_the_pending_scene() {
    let buttons = scene_buttons(&scenes(&["A", "B"], "A"), Some("B"));
    assert!(buttons[0].active && !buttons[0].pending);
    assert!(!buttons[1].active && buttons[1].pending);
}

#[test]
fn mixer_glyphs_follow_icon_and_mute_flag() {
    let inputs = vec![
        AudioInput::new("Mic/Aux", AudioKind::AlsaInputCapture, true),
        AudioInput::new("Desktop", AudioKind::PulseOutputCapture, true),
        AudioInput::new("Horn", AudioKind::FfmpegSource, true),
        AudioInput::new("Headset mic", AudioKind::PipewireClient, false),
    ];
    let entries = mixer_entries(&inputs);
    let glyphs: Vec<_> = entries.iter().map(|e| e.glyph).collect();
    assert_eq!(glyphs, ["mic_off", "volume_off", "music_note", "mic"]);
    assert_eq!(entries[3].icon, InputIcon::Microphone);
}

#[test]
fn audio_kind_recognition_is_an_inclusion_list() {
    assert_eq!(
        AudioKind::recognize("wasapi_output_capture"),
        Some(AudioKind::WasapiOutputCapture)
    );
    assert_eq!(AudioKind::recognize("vlc_source"), Some(AudioKind::VlcSource));
    assert_eq!(AudioKind::recognize("browser_source"), None);
    assert_eq!(AudioKind::recognize("ffmpeg_source_v2"), None);
}
