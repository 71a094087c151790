//! Directory stream behaviour against real directories.

use compat_config::testing::TestEnvironment;
use compat_dirent::{
    closedir, dirent_hash, opendir, readdir, readdir_r, rewinddir, seekdir, telldir, wopendir,
    DirEntry, DirStream, DirentError, Dirent, DT_DIR, DT_REG, END_OF_STREAM,
};

fn listing(dir: &mut DirStream<u8>) -> Vec<String> {
    let mut names = Vec::new();
    while let Some(entry) = readdir(dir) {
        names.push(entry.name_lossy());
    }
    names
}

fn without_dots(mut names: Vec<String>) -> Vec<String> {
    names.retain(|n| n != "." && n != "..");
    names.sort();
    names
}

#[test]
fn test_lists_same_names_as_host() {
    let env = TestEnvironment::new().unwrap();
    env.create_files(["alpha", "beta.txt", "gamma.rs"]).unwrap();
    env.create_dir("delta").unwrap();

    let mut dir = opendir(&env.root).unwrap();
    let names = listing(&mut dir);
    assert!(names.contains(&".".to_string()));
    assert!(names.contains(&"..".to_string()));
    assert_eq!(without_dots(names), TestEnvironment::host_listing(&env.root).unwrap());
    assert_eq!(closedir(dir), 0);
}

#[test]
fn test_file_types() {
    let env = TestEnvironment::new().unwrap();
    env.create_file("plain", b"data").unwrap();
    env.create_dir("folder").unwrap();

    let mut dir = opendir(&env.root).unwrap();
    while let Some(entry) = readdir(&mut dir) {
        match entry.name() {
            b"plain" => assert_eq!(entry.d_type, DT_REG),
            b"folder" | b"." | b".." => assert_eq!(entry.d_type, DT_DIR),
            other => panic!("unexpected entry {:?}", other),
        }
    }
}

#[cfg(unix)]
#[test]
fn test_symlink_reported_as_link() {
    let env = TestEnvironment::new().unwrap();
    env.create_file("target", b"").unwrap();
    std::os::unix::fs::symlink("target", env.path("shortcut")).unwrap();

    let mut dir = opendir(&env.root).unwrap();
    let mut seen = false;
    while let Some(entry) = readdir(&mut dir) {
        if entry.name() == b"shortcut" {
            assert_eq!(entry.d_type, compat_dirent::DT_LNK);
            seen = true;
        }
    }
    assert!(seen);
}

#[test]
fn test_open_errors() {
    let env = TestEnvironment::new().unwrap();
    let file = env.create_file("not-a-dir", b"").unwrap();

    assert_eq!(
        DirStream::<u8>::open(&file).unwrap_err(),
        DirentError::NotADirectory
    );
    assert_eq!(compat_errno::get_std_errno(), compat_errno::ENOTDIR);

    assert_eq!(
        DirStream::<u8>::open(env.path("missing")).unwrap_err(),
        DirentError::NotFound
    );
    assert_eq!(DirStream::<u8>::open("").unwrap_err(), DirentError::NotFound);
    assert!(opendir("").is_none());
    assert_eq!(compat_errno::get_std_errno(), compat_errno::ENOENT);
}

#[test]
fn test_readdir_r_fills_caller_buffer() {
    let env = TestEnvironment::new().unwrap();
    env.create_file("only", b"").unwrap();

    let mut dir = opendir(&env.root).unwrap();
    let mut names = Vec::new();
    loop {
        let mut entry = Dirent::default();
        let mut result = None;
        assert_eq!(readdir_r(&mut dir, &mut entry, &mut result), 0);
        match result {
            Some(filled) => names.push(filled.name_lossy()),
            None => break,
        }
    }
    assert_eq!(without_dots(names), vec!["only"]);
}

#[test]
fn test_d_off_chain_matches_next_name() {
    let env = TestEnvironment::new().unwrap();
    env.create_files(["one", "two", "three"]).unwrap();

    let mut dir = opendir(&env.root).unwrap();
    let mut previous_off: Option<i64> = None;
    while let Some(entry) = readdir(&mut dir) {
        if let Some(off) = previous_off {
            assert_eq!(off, dirent_hash(entry.name()));
        }
        previous_off = Some(entry.d_off);
    }
    assert_eq!(previous_off, Some(END_OF_STREAM));
}

#[test]
fn test_tell_then_seek_resumes_at_same_entry() {
    let env = TestEnvironment::new().unwrap();
    env.create_files((0..20).map(|i| format!("file{:02}", i))).unwrap();

    let mut dir = opendir(&env.root).unwrap();
    for _ in 0..7 {
        readdir(&mut dir).unwrap();
    }
    let position = telldir(&mut dir);
    let expected: Vec<String> = listing(&mut dir);
    assert!(!expected.is_empty());

    seekdir(&mut dir, position);
    assert!(!dir.is_invalid());
    assert_eq!(listing(&mut dir), expected);
}

#[test]
fn test_seek_to_end_position() {
    let env = TestEnvironment::new().unwrap();
    env.create_file("x", b"").unwrap();

    let mut dir = opendir(&env.root).unwrap();
    listing(&mut dir);
    assert_eq!(telldir(&mut dir), END_OF_STREAM);

    seekdir(&mut dir, END_OF_STREAM);
    assert!(dir.is_invalid());
    assert!(readdir(&mut dir).is_none());
}

#[test]
fn test_seek_to_removed_entry_parks_stream_until_rewind() {
    let env = TestEnvironment::new().unwrap();
    env.create_files(["keep", "remove-me"]).unwrap();

    let mut dir = opendir(&env.root).unwrap();
    let gone = dirent_hash(b"remove-me");
    std::fs::remove_file(env.path("remove-me")).unwrap();

    assert_eq!(dir.seek(gone).unwrap_err(), DirentError::NotFound);
    assert!(readdir(&mut dir).is_none());
    assert!(readdir(&mut dir).is_none());

    rewinddir(&mut dir);
    assert_eq!(without_dots(listing(&mut dir)), vec!["keep"]);
}

#[test]
fn test_seek_with_colliding_names_lands_on_first_match() {
    let env = TestEnvironment::new().unwrap();
    env.create_files(["Ez", "FY"]).unwrap();
    assert_eq!(dirent_hash(b"Ez"), dirent_hash(b"FY"));

    let mut dir = opendir(&env.root).unwrap();
    let order = listing(&mut dir);
    let first_colliding = order
        .iter()
        .find(|n| n.as_str() == "Ez" || n.as_str() == "FY")
        .cloned()
        .unwrap();

    seekdir(&mut dir, dirent_hash(b"FY"));
    let landed = readdir(&mut dir).unwrap().name_lossy();
    assert_eq!(landed, first_colliding);
}

#[test]
fn test_rewind_restarts_enumeration() {
    let env = TestEnvironment::new().unwrap();
    env.create_files(["a", "b"]).unwrap();

    let mut dir = opendir(&env.root).unwrap();
    let first_pass = listing(&mut dir);
    rewinddir(&mut dir);
    let second_pass = listing(&mut dir);
    assert_eq!(first_pass, second_pass);
}

#[test]
fn test_rewind_sees_new_entries() {
    let env = TestEnvironment::new().unwrap();
    env.create_file("before", b"").unwrap();

    let mut dir = opendir(&env.root).unwrap();
    listing(&mut dir);
    env.create_file("after", b"").unwrap();
    rewinddir(&mut dir);
    assert_eq!(without_dots(listing(&mut dir)), vec!["after", "before"]);
}

#[test]
fn test_long_names_are_reported_whole_when_within_limit() {
    let env = TestEnvironment::new().unwrap();
    let name = "n".repeat(200);
    env.create_file(&name, b"").unwrap();

    let mut dir = opendir(&env.root).unwrap();
    let mut found = None;
    while let Some(entry) = readdir(&mut dir) {
        if entry.d_namlen == 200 {
            found = Some(entry.clone());
        }
    }
    let entry: DirEntry<u8> = found.unwrap();
    assert_eq!(entry.name(), name.as_bytes());
    assert_eq!(entry.d_name[200], 0);
}

#[test]
fn test_wide_stream() {
    let env = TestEnvironment::new().unwrap();
    env.create_file("größe.txt", b"").unwrap();

    let path: Vec<u16> = env.root.to_string_lossy().encode_utf16().collect();
    let mut dir = wopendir(&path).unwrap();
    let mut names = Vec::new();
    while let Some(entry) = readdir(&mut dir) {
        names.push(entry.name_lossy());
    }
    assert!(names.contains(&"größe.txt".to_string()));

    let expected: Vec<u16> = "größe.txt".encode_utf16().collect();
    rewinddir(&mut dir);
    let mut matched = false;
    while let Some(entry) = readdir(&mut dir) {
        matched |= entry.name() == expected.as_slice();
    }
    assert!(matched);
}

#[test]
fn test_iteration_ends_after_lost_handle() {
    let env = TestEnvironment::new().unwrap();
    let sub = env.create_dir("doomed").unwrap();

    let mut dir = opendir(&sub).unwrap();
    std::fs::remove_dir(&sub).unwrap();
    dir.rewind();

    let errors = dir.by_ref().filter(|item| item.is_err()).count();
    assert_eq!(errors, 1);
    assert!(dir.next().is_none());
    assert!(dir.next().is_none());
}
