//! Integration tests for quiz snapshot commands

#![allow(deprecated)]

use predicates::prelude::*;
use tempfile::TempDir;

mod common;
use common::studyvault_cmd;

fn init_vault() -> TempDir {
    let temp = TempDir::new().unwrap();
    studyvault_cmd().arg("init").arg(temp.path()).assert().success();
    temp
}

#[test]
fn test_quiz_answer_saves_snapshot_immediately() {
    let temp = init_vault();

    studyvault_cmd()
        .current_dir(temp.path())
        .args(["quiz", "answer", "bio-101", "2", "B", "--questions", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Quiz bio-101"))
        .stdout(predicate::str::contains("Question: 2/3"))
        .stdout(predicate::str::contains("Answered: 1"));

    assert!(temp
        .path()
        .join(".studyvault/autosave/quiz_autosave_bio-101.json")
        .exists());
}

#[test]
fn test_quiz_answers_accumulate_across_runs() {
    let temp = init_vault();

    for (number, answer) in [("1", "A"), ("3", "C")] {
        studyvault_cmd()
            .current_dir(temp.path())
            .args(["quiz", "answer", "q1", number, answer, "--questions", "4"])
            .assert()
            .success();
    }

    studyvault_cmd()
        .current_dir(temp.path())
        .args(["quiz", "show", "q1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Question: 3/4"))
        .stdout(predicate::str::contains("Answered: 2"))
        .stdout(predicate::str::contains("1. A"))
        .stdout(predicate::str::contains("3. C"));
}

#[test]
fn test_quiz_answer_out_of_range() {
    let temp = init_vault();

    studyvault_cmd()
        .current_dir(temp.path())
        .args(["quiz", "answer", "q1", "11", "A"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));

    studyvault_cmd()
        .current_dir(temp.path())
        .args(["quiz", "answer", "q1", "0", "A"])
        .assert()
        .failure();
}

#[test]
fn test_quiz_show_and_clear_without_snapshot() {
    let temp = init_vault();

    studyvault_cmd()
        .current_dir(temp.path())
        .args(["quiz", "show", "q1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No saved progress for quiz q1"));

    studyvault_cmd()
        .current_dir(temp.path())
        .args(["quiz", "answer", "q1", "1", "A"])
        .assert()
        .success();
    studyvault_cmd()
        .current_dir(temp.path())
        .args(["quiz", "clear", "q1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared saved progress for quiz q1"));
    studyvault_cmd()
        .current_dir(temp.path())
        .args(["quiz", "show", "q1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No saved progress"));
}

#[test]
fn test_invalid_quiz_id_is_rejected() {
    let temp = init_vault();

    studyvault_cmd()
        .current_dir(temp.path())
        .args(["quiz", "show", "../escape"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid quiz id"));
}

#[test]
fn test_progress_notice_on_fifth_answer() {
    let temp = init_vault();

    for number in 1..=4 {
        studyvault_cmd()
            .current_dir(temp.path())
            .args(["quiz", "answer", "q1", &number.to_string(), "A"])
            .assert()
            .success()
            .stdout(predicate::str::contains("questions answered").not());
    }

    studyvault_cmd()
        .current_dir(temp.path())
        .args(["quiz", "answer", "q1", "5", "A"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Progress saved: 5 questions answered"));
}
