use exloop_core::isf::{resolve_isf, save_isf};
use exloop_core::prefs::FilePreferenceStore;
use exloop_core::IsfSource;
use exloop_traits::PreferenceStore;

#[test]
fn missing_file_is_an_empty_store() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FilePreferenceStore::open(dir.path().join("prefs.toml")).expect("open");
    assert_eq!(store.get_string("ISF"), None);
    let isf = resolve_isf(&store, 75.0);
    assert_eq!(isf.source, IsfSource::DefaultMissing);
    assert_eq!(isf.value, 75.0);
}

#[test]
fn saved_isf_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("prefs.toml");
    {
        let store = FilePreferenceStore::open(&path).expect("open");
        save_isf(&store, 50).expect("save");
        assert_eq!(store.get_string("ISF").as_deref(), Some("50"));
    }
    let text = std::fs::read_to_string(&path).expect("read");
    assert!(text.contains("ISF = \"50\""), "{text}");

    let reopened = FilePreferenceStore::open(&path).expect("reopen");
    let isf = resolve_isf(&reopened, 75.0);
    assert_eq!(isf.value, 50.0);
    assert_eq!(isf.source, IsfSource::Preference);
}

#[test]
fn out_of_range_isf_is_not_saved() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("prefs.toml");
    let store = FilePreferenceStore::open(&path).expect("open");
    let err = save_isf(&store, 0).expect_err("zero rejected");
    assert!(format!("{err}").contains("ISF must be in"));
    assert!(save_isf(&store, 5000).is_err());
    assert!(!path.exists());
}

#[test]
fn hand_edited_garbage_falls_back_to_default() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("prefs.toml");
    std::fs::write(&path, "ISF = \"fifty\"\n").expect("write");
    let store = FilePreferenceStore::open(&path).expect("open");
    let isf = resolve_isf(&store, 60.0);
    assert_eq!(isf.source, IsfSource::DefaultInvalid);
    assert_eq!(isf.value, 60.0);
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("prefs.toml");
    std::fs::write(&path, "ISF = [").expect("write");
    let err = FilePreferenceStore::open(&path).expect_err("bad toml");
    assert!(format!("{err}").contains("parsing preferences"));
}
