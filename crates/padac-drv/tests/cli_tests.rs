//! End-to-end CLI tests, exercising the `compile` binary against the
//! bundled `demos/` fixtures. Grounded on
//! `faxc-drv/tests/e2e/cli_tests.rs`'s `assert_cmd` + fixtures-directory
//! pattern, adapted to padac's single-file-in/assembly-out contract
//! instead of faxc's executable-producing one.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn demos_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("demos")
}

fn compile_in(dir: &Path, source: &Path) -> assert_cmd::assert::Assert {
    Command::cargo_bin("compile")
        .unwrap()
        .current_dir(dir)
        .arg(source)
        .assert()
}

#[test]
fn compiles_hello_world_and_writes_assembly() {
    let tmp = TempDir::new().unwrap();
    let source = demos_dir().join("hello_world.ada");

    compile_in(tmp.path(), &source).success();

    let out = tmp.path().join("asm").join("hello_world.s");
    assert!(out.exists(), "expected {} to be written", out.display());
    let text = std::fs::read_to_string(&out).unwrap();
    assert!(text.contains("end\n"));
    assert!(text.contains("mul"));
    assert!(text.contains("println"));
}

#[test]
fn compiles_nested_static_link_example() {
    let tmp = TempDir::new().unwrap();
    let source = demos_dir().join("nested_static_link.ada");

    compile_in(tmp.path(), &source).success();

    let out = tmp.path().join("asm").join("nested_static_link.s");
    let text = std::fs::read_to_string(&out).unwrap();
    assert!(text.contains("BL"), "calling Inner should emit a BL");
}

#[test]
fn compiles_reverse_for_loop_example() {
    let tmp = TempDir::new().unwrap();
    let source = demos_dir().join("reverse_for_loop.ada");

    compile_in(tmp.path(), &source).success();

    let out = tmp.path().join("asm").join("reverse_for_loop.s");
    assert!(out.exists());
}

#[test]
fn compiles_division_and_rem_example() {
    let tmp = TempDir::new().unwrap();
    let source = demos_dir().join("division_and_rem.ada");

    compile_in(tmp.path(), &source).success();

    let out = tmp.path().join("asm").join("division_and_rem.s");
    let text = std::fs::read_to_string(&out).unwrap();
    assert!(text.contains("div32"));
}

#[test]
fn print_ast_flag_reports_node_count_without_failing() {
    let tmp = TempDir::new().unwrap();
    let source = demos_dir().join("hello_world.ada");

    Command::cargo_bin("compile")
        .unwrap()
        .current_dir(tmp.path())
        .arg(&source)
        .arg("--print-ast")
        .assert()
        .success()
        .stderr(predicate::str::contains("nodes"));
}

#[test]
fn missing_source_file_exits_nonzero() {
    let tmp = TempDir::new().unwrap();

    Command::cargo_bin("compile")
        .unwrap()
        .current_dir(tmp.path())
        .arg("does-not-exist.ada")
        .assert()
        .failure();
}
