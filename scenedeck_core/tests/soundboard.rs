use scenedeck_core::soundboard::{trigger_request, DEFAULT_SOUND_ICON};
use scenedeck_core::{
    ClearConfirmed, CustomSound, PreferenceStore, RemovalConfirmed, Soundboard, SoundboardError,
};
use scenedeck_protocol::{MediaAction, Request};

fn yes(_: &str) -> bool {
    true
}

fn board_with(prefs: &mut PreferenceStore, names: &[&str]) -> Soundboard {
    let mut board = Soundboard::load(prefs);
    for name in names {
        board.add(prefs, name, "").unwrap();
    }
    board
}

#[test]
fn empty_name_is_rejected_and_nothing_is_persisted() {
    let mut prefs = PreferenceStore::in_memory();
    let mut board = board_with(&mut prefs, &["Horn"]);

    let err = board.add(&mut prefs, "   ", "campaign").unwrap_err();
    assert!(matches!(err, SoundboardError::EmptyName));
    assert_eq!(board.entries().len(), 1);
    assert_eq!(prefs.custom_sounds(), board.entries());
}

#[test]
fn add_trims_and_defaults_the_icon() {
    let mut prefs = PreferenceStore::in_memory();
    let mut board = Soundboard::load(&prefs);
    let added = board.add(&mut prefs, "  Airhorn ", "  ").unwrap();
    assert_eq!(added.name, "Airhorn");
    assert_eq!(added.icon, DEFAULT_SOUND_ICON);

    board.add(&mut prefs, "Clap", " celebration ").unwrap();
    assert_eq!(board.entries()[1].icon, "celebration");
}

#[test]
fn sound_list_round_trips_through_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prefs.json");
    let mut prefs = PreferenceStore::open_file(&path).unwrap();
    let board = board_with(&mut prefs, &["Horn", "Boing", "Horn"]);
    let expected = board.entries().to_vec();
    drop(prefs);

    let reopened = PreferenceStore::open_file(&path).unwrap();
    assert_eq!(Soundboard::load(&reopened).entries(), expected.as_slice());
}

#[test]
fn removal_needs_a_yes() {
    let mut prefs = PreferenceStore::in_memory();
    let mut board = board_with(&mut prefs, &["Horn", "Boing"]);

    let mut prompts = Vec::new();
    let mut no = |prompt: &str| {
        prompts.push(prompt.to_string());
        false
    };
    assert!(RemovalConfirmed::ask(&mut no, 1, "Boing").is_none());
    assert_eq!(prompts, ["Delete Boing?"]);

    let confirmed = RemovalConfirmed::ask(&mut yes, 1, "Boing").unwrap();
    let removed = board.remove(&mut prefs, confirmed).unwrap();
    assert_eq!(removed.name, "Boing");
    assert_eq!(prefs.custom_sounds().len(), 1);
}

#[test]
fn removal_of_duplicates_is_by_position() {
    let mut prefs = PreferenceStore::in_memory();
    let mut board = Soundboard::load(&prefs);
    board.add(&mut prefs, "Horn", "first").unwrap();
    board.add(&mut prefs, "Horn", "second").unwrap();

    let confirmed = RemovalConfirmed::ask(&mut yes, 0, "Horn").unwrap();
    board.remove(&mut prefs, confirmed).unwrap();
    assert_eq!(
        board.entries(),
        [CustomSound {
            name: "Horn".to_string(),
            icon: "second".to_string()
        }]
    );
}

#[test]
fn removal_rejects_a_shifted_board() {
    let mut prefs = PreferenceStore::in_memory();
    let mut board = board_with(&mut prefs, &["Horn", "Boing", "Clap"]);

    let late = RemovalConfirmed::ask(&mut yes, 1, "Boing").unwrap();
    let first = RemovalConfirmed::ask(&mut yes, 0, "Horn").unwrap();
    board.remove(&mut prefs, first).unwrap();

    let err = board.remove(&mut prefs, late).unwrap_err();
    assert!(matches!(err, SoundboardError::Stale { index: 1, .. }));

    let gone = RemovalConfirmed::ask(&mut yes, 5, "Horn").unwrap();
    assert!(matches!(
        board.remove(&mut prefs, gone).unwrap_err(),
        SoundboardError::OutOfRange(5)
    ));
    assert_eq!(board.entries().len(), 2);
}

#[test]
fn clear_empties_board_and_store() {
    let mut prefs = PreferenceStore::in_memory();
    let mut board = board_with(&mut prefs, &["Horn", "Boing"]);

    let mut declined = |_: &str| false;
    assert!(ClearConfirmed::ask(&mut declined).is_none());

    let confirmed = ClearConfirmed::ask(&mut yes).unwrap();
    assert_eq!(board.clear(&mut prefs, confirmed).unwrap(), 2);
    assert!(board.entries().is_empty());
    assert!(prefs.custom_sounds().is_empty());
}

#[test]
fn trigger_restarts_the_media_input_of_the_same_name() {
    let sound = CustomSound::new("Horn", "").unwrap();
    assert_eq!(
        trigger_request(&sound),
        Request::TriggerMediaInputAction {
            input_name: "Horn".to_string(),
            media_action: MediaAction::Restart,
        }
    );
}
