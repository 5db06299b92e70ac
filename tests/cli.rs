use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const HEADER: &str = "브랜드,시즌,스타일,중분류,아이템명,PO,TAG,수량,원가견적번호,발주통화,제조업체,(USD)_원자재,(USD)_아트웍,(USD)_부자재,(USD)_택/라벨,(USD) 공임,(USD)본사공급자재,(USD)_정상마진,(USD)_경비";

fn run(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cost_report"))
        .current_dir(cwd)
        .args(args)
        .output()
        .unwrap()
}

fn write_discovery(root: &Path) {
    fs::write(
        root.join("X_25F.csv"),
        format!(
            "{}\nX,25F,DXJP1,Outer,Down,P1,110000,10,Q1,USD,ACME,20,0,0,0,0,0,2,0\nX,25F,DKJP1,Outer,Down,P2,55000,5,Q2,USD,ACME,10,0,0,0,0,0,1,0\n",
            HEADER
        ),
    )
    .unwrap();
}

#[test]
fn lowercase_brand_without_fx_file_writes_both_slices() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_discovery(root);

    let out = run(root, &["--root", ".", "summary", "--season", "25F", "--brand", "x"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(root.join("25FW").join("summary_25fw_x.json").is_file());
    assert!(root.join("25FW").join("summary_25fw_x_kids.json").is_file());
}

#[test]
fn missing_explicit_fx_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_discovery(root);

    let out = run(
        root,
        &["--root", ".", "--fx", "nope.csv", "summary", "--season", "25F", "--brand", "X"],
    );
    assert!(!out.status.success());
    assert!(!root.join("25FW").exists());
}

#[test]
fn run_that_writes_nothing_fails() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    let out = run(root, &["--root", ".", "summary", "--season", "25F", "--brand", "M"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("nothing was written"));

    let out = run(root, &["--root", ".", "merge", "--season", "24S", "25S", "--brand", "M"]);
    assert!(!out.status.success());
}

#[test]
fn bad_season_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(dir.path(), &["summary", "--season", "2025F", "--brand", "M"]);
    assert!(!out.status.success());
}
