use rspace_core::scanner::{
    humanize_bytes, is_dotfile, scan_files, sum_file_size, sum_file_size_human,
    validate_input_paths, AcceptFilter, ScanError,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

/// Builds `data/` with `a.txt`, `.hidden`, `sub/b.txt`, `.git/config`.
fn data_tree(root: &Path) -> PathBuf {
    let data = root.join("data");
    fs::create_dir_all(data.join("sub")).unwrap();
    fs::create_dir_all(data.join(".git")).unwrap();
    fs::write(data.join("a.txt"), b"aaaa").unwrap();
    fs::write(data.join(".hidden"), b"secret").unwrap();
    fs::write(data.join("sub").join("b.txt"), b"bb").unwrap();
    fs::write(data.join(".git").join("config"), b"[core]").unwrap();
    data
}

fn names(files: &[rspace_core::scanner::ScannedFile]) -> Vec<String> {
    files.iter().map(|f| f.meta.name.clone()).collect()
}

#[test]
fn non_recursive_scan_takes_only_visible_top_level_files() {
    let tmp = tempdir().unwrap();
    let data = data_tree(tmp.path());

    let files = scan_files(&[&data], false, &AcceptFilter::AcceptAll).expect("scan");

    assert_eq!(names(&files), vec!["a.txt"]);
    assert_eq!(files[0].path, data.join("a.txt"));
    assert!(!files[0].is_uploaded());
}

#[test]
fn recursive_scan_descends_but_prunes_dot_folders() {
    let tmp = tempdir().unwrap();
    let data = data_tree(tmp.path());

    let files = scan_files(&[&data], true, &AcceptFilter::AcceptAll).expect("scan");

    let paths: Vec<PathBuf> = files.iter().map(|f| f.path.clone()).collect();
    assert_eq!(paths, vec![data.join("a.txt"), data.join("sub").join("b.txt")]);
    assert!(files.iter().all(|f| !is_dotfile(&f.meta.name)));
}

#[test]
fn word_filter_keeps_only_word_documents() {
    let tmp = tempdir().unwrap();
    for name in ["a.txt", "b.docx", "c.doc", "D.ODT"] {
        fs::write(tmp.path().join(name), b"x").unwrap();
    }
    let inputs: Vec<PathBuf> = ["a.txt", "b.docx", "c.doc"]
        .iter()
        .map(|n| tmp.path().join(n))
        .collect();

    let files = scan_files(&inputs, false, &AcceptFilter::word_documents()).unwrap();
    assert_eq!(names(&files), vec!["b.docx", "c.doc"]);

    // extension match ignores case
    let upper = scan_files(&[tmp.path().join("D.ODT")], false, &AcceptFilter::word_documents()).unwrap();
    assert_eq!(upper.len(), 1);
}

#[test]
fn reject_all_filter_empties_the_scan() {
    let tmp = tempdir().unwrap();
    let data = data_tree(tmp.path());
    let files = scan_files(&[&data], true, &AcceptFilter::RejectAll).unwrap();
    assert!(files.is_empty());
}

#[test]
fn scanning_twice_gives_the_same_list() {
    let tmp = tempdir().unwrap();
    let data = data_tree(tmp.path());

    let first = scan_files(&[&data], true, &AcceptFilter::AcceptAll).unwrap();
    let second = scan_files(&[&data], true, &AcceptFilter::AcceptAll).unwrap();

    let first: Vec<_> = first.iter().map(|f| (f.path.clone(), f.meta.clone())).collect();
    let second: Vec<_> = second.iter().map(|f| (f.path.clone(), f.meta.clone())).collect();
    assert_eq!(first, second);
}

#[test]
fn same_file_twice_is_not_deduplicated() {
    let tmp = tempdir().unwrap();
    let file = tmp.path().join("dup.txt");
    fs::write(&file, b"dup").unwrap();

    let files = scan_files(&[&file, &file], false, &AcceptFilter::AcceptAll).unwrap();
    assert_eq!(files.len(), 2);
}

#[test]
fn sizes_are_summed() {
    let tmp = tempdir().unwrap();
    let data = data_tree(tmp.path());
    let files = scan_files(&[&data], true, &AcceptFilter::AcceptAll).unwrap();

    assert_eq!(sum_file_size(&files), 6);
    assert_eq!(sum_file_size(&[]), 0);
    assert_eq!(sum_file_size_human(&files), "6 B");
}

#[test]
fn humanized_sizes_use_si_units() {
    assert_eq!(humanize_bytes(0), "0 B");
    assert_eq!(humanize_bytes(9), "9 B");
    assert_eq!(humanize_bytes(82), "82 B");
    assert_eq!(humanize_bytes(1000), "1.0 kB");
    assert_eq!(humanize_bytes(4_200_000), "4.2 MB");
    assert_eq!(humanize_bytes(830_000), "830 kB");
    assert_eq!(humanize_bytes(1_500_000_000), "1.5 GB");
}

#[test]
fn validation_fails_on_first_missing_path() {
    let tmp = tempdir().unwrap();
    let good = tmp.path().join("good.txt");
    fs::write(&good, b"ok").unwrap();
    let missing = tmp.path().join("missing.txt");
    let also_missing = tmp.path().join("also-missing.txt");

    let err = validate_input_paths(&[&good, &missing, &also_missing]).unwrap_err();
    match err {
        ScanError::InvalidPath { path, .. } => assert_eq!(path, missing),
        other => panic!("unexpected error: {other}"),
    }

    let ok = validate_input_paths(&[&good]).unwrap();
    assert_eq!(ok, vec![good]);
}

#[test]
fn dotfile_pattern() {
    assert!(is_dotfile(".git"));
    assert!(is_dotfile(".DS_Store"));
    assert!(is_dotfile(".hidden-file"));
    assert!(!is_dotfile("."));
    assert!(!is_dotfile(".."));
    assert!(!is_dotfile("visible.txt"));
}

#[test]
fn extension_filter_normalises_its_input() {
    let tmp = tempdir().unwrap();
    let inputs: Vec<PathBuf> = ["plot.PNG", "raw.csv", "scan.pdf"]
        .iter()
        .map(|n| {
            let p = tmp.path().join(n);
            fs::write(&p, b"x").unwrap();
            p
        })
        .collect();

    let filter = AcceptFilter::extensions([".png", "PDF"]);
    let files = scan_files(&inputs, false, &filter).unwrap();
    assert_eq!(names(&files), vec!["plot.PNG", "scan.pdf"]);
}

#[cfg(unix)]
#[test]
fn dangling_links_are_skipped_not_fatal() {
    let tmp = tempdir().unwrap();
    let data = data_tree(tmp.path());
    std::os::unix::fs::symlink(tmp.path().join("gone.txt"), data.join("broken.txt")).unwrap();
    std::os::unix::fs::symlink(data.join("a.txt"), data.join("linked.txt")).unwrap();

    let flat = scan_files(&[&data], false, &AcceptFilter::AcceptAll).expect("scan survives");
    assert_eq!(names(&flat), vec!["a.txt", "linked.txt"]);
    // links report the size of their target
    assert_eq!(flat[1].meta.size, 4);

    let deep = scan_files(&[&data], true, &AcceptFilter::AcceptAll).expect("scan survives");
    assert_eq!(names(&deep), vec!["a.txt", "linked.txt", "b.txt"]);
}
