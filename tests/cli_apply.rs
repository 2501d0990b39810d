//! CLI integration tests for the `tagpatch` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tagpatch::tagpatch::testing::{insert_tag, open_marker};
use tempfile::TempDir;

fn tagpatch() -> Command {
    Command::cargo_bin("tagpatch").expect("binary builds")
}

#[test]
fn test_apply_patches_the_target_file() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("patch.hbs");
    let target = dir.path().join("App.vue");
    fs::write(&template, insert_tag(1, 0, "// cli")).unwrap();
    fs::write(&target, "<template>\n<div/>\n</template>").unwrap();

    tagpatch()
        .arg("apply")
        .arg(&template)
        .arg(&target)
        .assert()
        .success();

    let patched = fs::read_to_string(&target).unwrap();
    assert_eq!(patched, "<template>\n// cli<div/>\n</template>");
}

#[test]
fn test_dry_run_prints_without_writing() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("patch.hbs");
    let target = dir.path().join("App.vue");
    let original = "a\nb";
    fs::write(&template, insert_tag(0, 0, "X")).unwrap();
    fs::write(&target, original).unwrap();

    tagpatch()
        .arg("apply")
        .arg("--dry-run")
        .arg(&template)
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::contains("Xa"));

    assert_eq!(fs::read_to_string(&target).unwrap(), original);
}

#[test]
fn test_failed_apply_exits_nonzero_and_keeps_target() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("patch.hbs");
    let target = dir.path().join("App.vue");
    let original = "untouched";
    let unclosed = format!(
        "{}\nbody\n",
        open_marker("insert", &[("startRow", "0"), ("startCol", "0")]),
    );
    fs::write(&template, unclosed).unwrap();
    fs::write(&target, original).unwrap();

    tagpatch()
        .arg("apply")
        .arg(&template)
        .arg(&target)
        .assert()
        .failure()
        .stderr(predicate::str::contains("syntax error: unclosed tag: insert"));

    assert_eq!(fs::read_to_string(&target).unwrap(), original);
}

#[test]
fn test_tags_json_output() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("patch.hbs");
    fs::write(&template, insert_tag(2, 4, "// body")).unwrap();

    tagpatch()
        .arg("tags")
        .arg(&template)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"verb\": \"insert\""))
        .stdout(predicate::str::contains("\"startRow\": 2.0"));
}

#[test]
fn test_tags_simple_output() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("patch.hbs");
    fs::write(&template, insert_tag(0, 0, "x")).unwrap();

    tagpatch()
        .arg("tags")
        .arg(&template)
        .arg("--format")
        .arg("simple")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("insert @ "));
}

#[test]
fn test_tags_unknown_format_is_rejected() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("patch.hbs");
    fs::write(&template, insert_tag(0, 0, "x")).unwrap();

    tagpatch()
        .arg("tags")
        .arg(&template)
        .arg("--format")
        .arg("xml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not supported"));
}

#[test]
fn test_tree_patches_a_directory() {
    let dir = TempDir::new().unwrap();
    let templates = dir.path().join("templates");
    let project = dir.path().join("project");
    fs::create_dir_all(&templates).unwrap();
    fs::create_dir_all(&project).unwrap();
    fs::write(templates.join("main.js.hbs"), insert_tag(0, 0, "// top")).unwrap();
    fs::write(project.join("main.js"), "console.log(1)").unwrap();

    tagpatch()
        .arg("tree")
        .arg(&templates)
        .arg(&project)
        .assert()
        .success()
        .stdout(predicate::str::contains("patched"));

    let patched = fs::read_to_string(project.join("main.js")).unwrap();
    assert!(patched.starts_with("// top"));
}

#[test]
fn test_tree_reports_failures_and_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    let templates = dir.path().join("templates");
    let project = dir.path().join("project");
    fs::create_dir_all(&templates).unwrap();
    fs::create_dir_all(&project).unwrap();
    // No matching target file exists for this template.
    fs::write(templates.join("ghost.js.hbs"), insert_tag(0, 0, "x")).unwrap();

    tagpatch()
        .arg("tree")
        .arg(&templates)
        .arg(&project)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed"));
}

#[test]
fn test_no_subcommand_shows_help() {
    tagpatch().assert().failure();
}
