//! End-to-end CLI integration tests for the `formctl` binary.
//!
//! Each test writes its fixtures into its own temporary directory and runs
//! `formctl` there as a subprocess via `assert_cmd`.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a `Command` targeting the cargo-built `formctl` binary.
fn formctl(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("formctl").unwrap();
    cmd.current_dir(dir)
        .env_remove("RUST_LOG")
        .env_remove("FORMCTL_CONFIG")
        .env("NO_COLOR", "1");
    cmd
}

const AREA_FORM: &str = r#"{
  "name": "Area",
  "fields": [
    { "id": "w", "type": "number", "label": "Width", "order": 0,
      "validationRules": [{ "type": "required", "message": "Width is required" }] },
    { "id": "h", "type": "number", "label": "Height", "order": 1 },
    { "id": "a", "type": "number", "label": "Area", "order": 2, "isDerived": true,
      "derivedConfig": { "parentFieldIds": ["w", "h"], "formula": "width * height" } }
  ]
}"#;

const AGE_FORM: &str = "\
name: Profile
fields:
  - id: f1
    type: date
    label: Birthdate
  - id: f2
    type: number
    label: Age
    order: 1
    isDerived: true
    derivedConfig:
      parentFieldIds: [f1]
      formula: calculateAge(birthdate)
";

const CHAIN_FORM: &str = r#"{
  "name": "Loop",
  "fields": [
    { "id": "x", "type": "number", "label": "X" },
    { "id": "a", "label": "A", "order": 1, "isDerived": true,
      "derivedConfig": { "parentFieldIds": ["x", "b"], "formula": "x + b" } },
    { "id": "b", "label": "B", "order": 2, "isDerived": true,
      "derivedConfig": { "parentFieldIds": ["a"], "formula": "a * 2" } }
  ]
}"#;

fn project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("area.json"), AREA_FORM).unwrap();
    fs::write(tmp.path().join("age.yaml"), AGE_FORM).unwrap();
    fs::write(tmp.path().join("loop.json"), CHAIN_FORM).unwrap();
    tmp
}

fn json_stdout(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

// ---------------------------------------------------------------------------
// eval
// ---------------------------------------------------------------------------

#[test]
fn eval_computes_area() {
    let tmp = project();
    let json = json_stdout(
        formctl(tmp.path()).args(["eval", "area.json", "--set", "w=4", "--set", "h=5", "--json"]),
    );
    insta::with_settings!({ sort_maps => true }, {
        insta::assert_json_snapshot!(json, @r###"
        {
          "canSubmit": true,
          "derivationErrors": {},
          "errors": {},
          "values": {
            "a": 20,
            "h": 5,
            "w": 4
          }
        }
        "###);
    });
}

#[test]
fn eval_computes_age_from_yaml_form() {
    let tmp = project();
    let json = json_stdout(formctl(tmp.path()).args([
        "eval",
        "age.yaml",
        "--set",
        "f1=2000-06-15",
        "--today",
        "2024-06-01",
        "--json",
    ]));
    assert_eq!(json["values"]["f2"], 23);
    assert_eq!(json["canSubmit"], true);
}

#[test]
fn eval_reads_values_file() {
    let tmp = project();
    fs::write(tmp.path().join("values.json"), r#"{"w": 2.5, "h": 4}"#).unwrap();
    let json = json_stdout(formctl(tmp.path()).args([
        "eval",
        "area.json",
        "--values",
        "values.json",
        "--json",
    ]));
    assert_eq!(json["values"]["a"], 10);
}

#[test]
fn eval_reports_failed_derivation_without_blocking() {
    let tmp = project();
    let json = json_stdout(formctl(tmp.path()).args(["eval", "area.json", "--set", "w=4", "--json"]));
    assert_eq!(json["values"]["a"], "Error in calculation");
    assert_eq!(json["derivationErrors"]["a"]["kind"], "type_mismatch");
    assert_eq!(json["canSubmit"], true);
}

#[test]
fn eval_strict_exits_two_on_validation_errors() {
    let tmp = project();
    formctl(tmp.path())
        .args(["eval", "area.json", "--set", "h=5", "--strict"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Width is required"));

    formctl(tmp.path())
        .args(["eval", "area.json", "--set", "w=1", "--strict"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ready to submit"));
}

#[test]
fn eval_error_value_comes_from_environment() {
    let tmp = project();
    let json = json_stdout(
        formctl(tmp.path())
            .env("FORMS_ENGINE__ERROR_VALUE", "#ERR")
            .args(["eval", "area.json", "--json"]),
    );
    assert_eq!(json["values"]["a"], "#ERR");
}

#[test]
fn eval_missing_form_fails() {
    let tmp = project();
    formctl(tmp.path())
        .args(["eval", "nope.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("neither a schema file nor a form"));
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn check_clean_form() {
    let tmp = project();
    formctl(tmp.path())
        .args(["check", "area.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no problems found"))
        .stdout(predicate::str::contains("evaluation order: a"));
}

#[test]
fn check_rejects_derived_parents_by_default() {
    let tmp = project();
    formctl(tmp.path())
        .args(["check", "loop.json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("cannot use b as a parent"));
}

#[test]
fn check_reports_cycle_when_chains_are_allowed() {
    let tmp = project();
    fs::write(
        tmp.path().join("formctl.yaml"),
        "engine:\n  allow-derived-parents: true\n",
    )
    .unwrap();

    let output = formctl(tmp.path())
        .args(["check", "loop.json", "--json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let kinds: Vec<&str> = report["problems"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["kind"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["cyclic_dependency", "cyclic_dependency"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("\"error\""), "stderr: {}", stderr);
}

// ---------------------------------------------------------------------------
// formula / suggest
// ---------------------------------------------------------------------------

#[test]
fn formula_evaluates_with_vars() {
    let tmp = TempDir::new().unwrap();
    formctl(tmp.path())
        .args(["formula", "2 + 3 * 4"])
        .assert()
        .success()
        .stdout("14\n");

    let json = json_stdout(formctl(tmp.path()).args([
        "formula",
        "greeting + ' ' + name",
        "--var",
        "greeting=Hello",
        "--var",
        "name=Ada",
        "--json",
    ]));
    assert_eq!(json["value"], "Hello Ada");
}

#[test]
fn formula_errors_are_reported() {
    let tmp = TempDir::new().unwrap();
    formctl(tmp.path())
        .args(["formula", "1 / 0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("division by zero"));
    formctl(tmp.path())
        .args(["formula", "missing + 1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unbound variable: missing"));
}

#[test]
fn formula_long_sum_fails_cleanly() {
    let tmp = TempDir::new().unwrap();
    let sum = vec!["1"; 2048].join("+");
    formctl(tmp.path())
        .args(["formula", &sum])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("nesting deeper than 64"));
}

#[test]
fn suggest_offers_age_formula() {
    let tmp = project();
    let json = json_stdout(formctl(tmp.path()).args(["suggest", "age.yaml", "f2", "--json"]));
    assert_eq!(json["parents"], serde_json::json!(["f1"]));
    assert_eq!(json["suggestions"], serde_json::json!(["calculateAge(birthdate)"]));
}

#[test]
fn suggest_rejects_derived_parent() {
    let tmp = project();
    formctl(tmp.path())
        .args(["suggest", "loop.json", "a", "--parent", "b"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be a parent"));
}

// ---------------------------------------------------------------------------
// store
// ---------------------------------------------------------------------------

#[test]
fn store_lifecycle() {
    let tmp = project();

    let saved = json_stdout(formctl(tmp.path()).args(["store", "save", "area.json", "--json"]));
    let id = saved["id"].as_str().unwrap().to_string();
    assert!(id.starts_with("form-"), "unexpected id {}", id);
    assert!(tmp.path().join("forms.jsonl").exists());

    let list = json_stdout(formctl(tmp.path()).args(["store", "list", "--json"]));
    let forms = list.as_array().unwrap();
    assert_eq!(forms.len(), 1);
    assert_eq!(forms[0]["name"], "Area");
    assert_eq!(forms[0]["derived"], 1);

    // Saved forms can be evaluated by id.
    let json = json_stdout(formctl(tmp.path()).args([
        "eval", &id, "--set", "w=3", "--set", "h=3", "--json",
    ]));
    assert_eq!(json["values"]["a"], 9);

    formctl(tmp.path())
        .args(["store", "update", &id, "age.yaml"])
        .assert()
        .success();
    let shown = json_stdout(formctl(tmp.path()).args(["store", "show", &id, "--json"]));
    assert_eq!(shown["name"], "Profile");
    assert_eq!(shown["id"], id.as_str());

    formctl(tmp.path())
        .args(["store", "delete", &id])
        .assert()
        .success();
    formctl(tmp.path())
        .args(["store", "show", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn store_refuses_invalid_forms() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("empty.json"), r#"{"name":"Empty","fields":[]}"#).unwrap();
    formctl(tmp.path())
        .args(["store", "save", "empty.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot save empty form"));
    assert!(!tmp.path().join("forms.jsonl").exists());
}

#[test]
fn store_path_flag_overrides_config() {
    let tmp = project();
    formctl(tmp.path())
        .args(["--store", "data/mine.jsonl", "store", "save", "area.json"])
        .assert()
        .success();
    assert!(tmp.path().join("data").join("mine.jsonl").exists());
    formctl(tmp.path())
        .args(["store", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no saved forms"));
}

// ---------------------------------------------------------------------------
// config / completion
// ---------------------------------------------------------------------------

#[test]
fn config_init_then_show() {
    let tmp = TempDir::new().unwrap();
    formctl(tmp.path())
        .args(["config", "init"])
        .assert()
        .success();
    assert!(tmp.path().join("formctl.yaml").exists());

    formctl(tmp.path())
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    let json = json_stdout(
        formctl(tmp.path())
            .env("FORMS_ENGINE__MAX_DEPTH", "8")
            .args(["config", "show", "--json"]),
    );
    assert_eq!(json["engine"]["max-depth"], 8);
    assert_eq!(json["engine"]["error-value"], "Error in calculation");
}

#[test]
fn invalid_config_is_an_error() {
    let tmp = project();
    fs::write(tmp.path().join("formctl.yaml"), "engine:\n  max-steps: 0\n").unwrap();
    formctl(tmp.path())
        .args(["eval", "area.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("max-steps"));
}

#[test]
fn bad_today_is_rejected() {
    let tmp = project();
    formctl(tmp.path())
        .args(["--today", "June 1st", "eval", "age.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected YYYY-MM-DD"));
}

#[test]
fn completion_bash() {
    let tmp = TempDir::new().unwrap();
    formctl(tmp.path())
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("formctl"));
}
