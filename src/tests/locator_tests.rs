use super::{find_project_root, locate_project_root, missing_markers, LocateError};
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

#[test]
fn returns_only_folder_with_both_markers() {
    let base = temp_dir("only-b");
    let a = folder(&base, "a", &["Guardfile"]);
    let b = folder(&base, "b", &["Guardfile", "Gemfile"]);
    let c = folder(&base, "c", &["Gemfile"]);

    assert_eq!(find_project_root(&[a, b.clone(), c]), Some(b));
}

#[test]
fn returns_none_when_no_folder_qualifies() {
    let base = temp_dir("none");
    let a = folder(&base, "a", &[]);
    let b = folder(&base, "b", &["Gemfile"]);

    assert_eq!(find_project_root(&[a, b]), None);
}

#[test]
fn first_qualifying_folder_in_input_order_wins() {
    let base = temp_dir("first");
    let a = folder(&base, "a", &["Guardfile", "Gemfile"]);
    let b = folder(&base, "b", &["Guardfile", "Gemfile"]);

    assert_eq!(find_project_root(&[b.clone(), a.clone()]), Some(b));
    assert_eq!(find_project_root(&[a.clone(), base.join("b")]), Some(a));
}

#[test]
fn missing_candidate_directories_are_skipped() {
    let base = temp_dir("missing");
    let ghost = base.join("ghost");
    let real = folder(&base, "real", &["Guardfile", "Gemfile"]);

    assert_eq!(find_project_root(&[ghost, real.clone()]), Some(real));
}

#[test]
fn locate_reports_searched_candidates() {
    let base = temp_dir("locate");
    let a = folder(&base, "a", &["Guardfile"]);

    let err = locate_project_root(&[a.clone()]).expect_err("should not locate");
    assert_eq!(
        err,
        LocateError::NotFound {
            candidates: vec![a.clone()]
        }
    );
    assert!(err.to_string().contains("Guardfile and Gemfile"));
    assert_eq!(missing_markers(&a), vec!["Gemfile"]);
}

#[test]
fn empty_candidate_list_is_not_found() {
    let err = locate_project_root::<PathBuf>(&[]).expect_err("nothing to search");
    assert!(err.to_string().contains("no open folders"));
}

fn folder(base: &std::path::Path, name: &str, markers: &[&str]) -> PathBuf {
    let dir = base.join(name);
    fs::create_dir_all(&dir).expect("mkdir folder");
    for marker in markers {
        fs::write(dir.join(marker), "").expect("write marker");
    }
    dir
}

fn temp_dir(name: &str) -> PathBuf {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("guardpost-locator-{name}-{ts}"));
    fs::create_dir_all(&dir).expect("mkdir temp");
    dir
}
