use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;
use word2json::config::Config;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

fn write_docx(path: &Path, paragraphs: &[&str]) {
    let body: String = paragraphs
        .iter()
        .map(|p| {
            if p.is_empty() {
                "<w:p/>".to_string()
            } else {
                format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", p)
            }
        })
        .collect();
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    );

    let mut zip = ZipWriter::new(fs::File::create(path).unwrap());
    zip.start_file("_rels/.rels", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(PACKAGE_RELS.as_bytes()).unwrap();
    zip.start_file("word/document.xml", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(document.as_bytes()).unwrap();
    zip.finish().unwrap();
}

fn word2json(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("word2json").unwrap();
    cmd.current_dir(dir);
    cmd
}

#[test]
fn test_help() {
    Command::cargo_bin("word2json")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--source"))
        .stdout(predicate::str::contains("--dest"));
}

#[test]
fn test_single_file_is_written_next_to_source() {
    let temp_dir = TempDir::new().unwrap();
    write_docx(&temp_dir.path().join("a.docx"), &["Hello", "", "World"]);

    word2json(temp_dir.path())
        .args(["-s", "a.docx"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Processing"))
        .stdout(predicate::str::contains("All files finished. Count: 1"));

    assert_eq!(
        fs::read_to_string(temp_dir.path().join("a.json")).unwrap(),
        r#"{"items":["Hello","World"]}"#
    );
}

#[test]
fn test_directory_skips_other_files() {
    let temp_dir = TempDir::new().unwrap();
    let docs = temp_dir.path().join("docs");
    fs::create_dir(&docs).unwrap();
    write_docx(&docs.join("a.docx"), &["first"]);
    fs::write(docs.join("b.txt"), "not a document").unwrap();
    write_docx(&docs.join("c.doc"), &["second"]);

    word2json(temp_dir.path())
        .args(["-s", "docs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("All files finished. Count: 2"));

    assert!(docs.join("a.json").exists());
    assert!(docs.join("c.json").exists());
    assert!(!docs.join("b.json").exists());
}

#[test]
fn test_unsupported_format_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    write_docx(&temp_dir.path().join("a.docx"), &["x"]);
    write_docx(&temp_dir.path().join("c.docx"), &["y"]);

    word2json(temp_dir.path())
        .args(["-s", ".", "-f", "xml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Invalid format. Format: xml"))
        .stdout(predicate::str::contains("All files finished. Count: 2"));

    assert!(!temp_dir.path().join("a.xml").exists());
    assert!(!temp_dir.path().join("a.json").exists());
}

#[test]
fn test_destination_directory_is_created() {
    let temp_dir = TempDir::new().unwrap();
    write_docx(&temp_dir.path().join("notes.docx"), &["Line one"]);

    word2json(temp_dir.path())
        .args(["-s", "notes.docx", "-d", "out/nested"])
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(temp_dir.path().join("out/nested/notes.json")).unwrap(),
        r#"{"items":["Line one"]}"#
    );
}

#[test]
fn test_invalid_source_is_reported() {
    let temp_dir = TempDir::new().unwrap();

    word2json(temp_dir.path())
        .args(["-s", "missing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Invalid Source File"))
        .stdout(predicate::str::contains("Count:").not());
}

#[test]
fn test_unknown_flags_are_ignored() {
    let temp_dir = TempDir::new().unwrap();
    write_docx(&temp_dir.path().join("a.docx"), &["kept"]);

    word2json(temp_dir.path())
        .args(["-x", "-s", "a.docx", "--colour", "red"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Count: 1"));

    assert!(temp_dir.path().join("a.json").exists());
}

#[test]
fn test_upper_case_flags_are_accepted() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir(temp_dir.path().join("docs")).unwrap();
    write_docx(&temp_dir.path().join("docs/a.docx"), &["upper"]);

    word2json(temp_dir.path())
        .args(["-S", "docs", "-D", "out", "-V"])
        .assert()
        .success()
        .stdout(predicate::str::contains("All files finished. Count: 1"));

    assert!(temp_dir.path().join("out/a.json").exists());
}

#[test]
fn test_owner_files_count_unless_excluded() {
    let temp_dir = TempDir::new().unwrap();
    write_docx(&temp_dir.path().join("a.docx"), &["x"]);
    fs::write(temp_dir.path().join("~$a.docx"), "owner").unwrap();

    word2json(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("All files finished. Count: 2"));

    fs::write(
        temp_dir.path().join("word2json.toml"),
        Config::create_sample_config(),
    )
    .unwrap();

    word2json(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("All files finished. Count: 1"));
}

#[test]
fn test_legacy_doc_fails_but_run_continues() {
    let temp_dir = TempDir::new().unwrap();
    let mut legacy = vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
    legacy.extend_from_slice(&[0u8; 504]);
    fs::write(temp_dir.path().join("old.doc"), legacy).unwrap();
    write_docx(&temp_dir.path().join("new.docx"), &["fine"]);

    word2json(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("office engine"))
        .stdout(predicate::str::contains("All files finished. Count: 2"));

    assert!(temp_dir.path().join("new.json").exists());
    assert!(!temp_dir.path().join("old.json").exists());
}

#[test]
fn test_dry_run_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    write_docx(&temp_dir.path().join("a.docx"), &["x"]);

    word2json(temp_dir.path())
        .args(["--dry-run", "-d", "out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("a.json"))
        .stdout(predicate::str::contains("1 document(s) would be converted"));

    assert!(!temp_dir.path().join("out").exists());
}

#[test]
fn test_json_output_mode() {
    let temp_dir = TempDir::new().unwrap();
    write_docx(&temp_dir.path().join("a.docx"), &["x"]);

    let output = word2json(temp_dir.path())
        .args(["--output-format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let last: serde_json::Value =
        serde_json::from_str(stdout.lines().last().unwrap()).unwrap();

    assert_eq!(last["type"], "finished");
    assert_eq!(last["count"], 1);
}

#[test]
fn test_quiet_mode_still_prints_the_count() {
    let temp_dir = TempDir::new().unwrap();
    write_docx(&temp_dir.path().join("a.docx"), &["x"]);

    word2json(temp_dir.path())
        .arg("-q")
        .assert()
        .success()
        .stdout(predicate::str::contains("Processing").not())
        .stdout(predicate::str::contains("All files finished. Count: 1"));
}

#[test]
fn test_invalid_config_file_fails_at_startup() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("broken.toml"), "[input\n").unwrap();

    word2json(temp_dir.path())
        .args(["--config", "broken.toml"])
        .assert()
        .failure();
}
