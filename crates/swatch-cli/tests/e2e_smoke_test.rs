use std::{fs, path::Path};

use tempfile::tempdir;

use swatch::SwatchError;
use swatch_cli::{Args, CheckArgs, Command, run};

fn check(dir: &Path, inputs: &[&str], continue_on_error: bool, output: Option<&str>) -> Args {
    let config = dir.join("config.toml");
    if !config.exists() {
        fs::write(&config, "[parser]\nskip_lint = false\n").expect("Failed to write config");
    }
    Args {
        command: Command::Check(CheckArgs {
            inputs: inputs.iter().map(|name| dir.join(name)).collect(),
            continue_on_error,
            output: output.map(|name| dir.join(name)),
        }),
        config: Some(config),
        log_level: "off".to_string(),
    }
}

#[tokio::test]
async fn e2e_check_valid_files() {
    let dir = tempdir().expect("Failed to create temp directory");
    fs::write(
        dir.path().join("base.json"),
        r##"{
            "color": {
                "$type": "color",
                "brand": {"$value": "#663399"},
                "link": {"$value": "{color.brand}"}
            }
        }"##,
    )
    .unwrap();
    fs::write(
        dir.path().join("theme.json"),
        r#"{"button": {"$type": "color", "fill": {"$value": {"$ref": "./base.json#/color/brand"}}}}"#,
    )
    .unwrap();

    let args = check(dir.path(), &["base.json", "theme.json"], false, Some("out.json"));
    let outcome = run(&args).await.expect("Check failed");
    assert_eq!(outcome.tokens, 3);
    assert!(outcome.diagnostics.is_empty());

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("out.json")).unwrap()).unwrap();
    assert_eq!(written["color"]["link"]["$type"], "color");
    assert_eq!(written["button"]["fill"]["$value"]["colorSpace"], "srgb");
}

#[tokio::test]
async fn e2e_check_reports_all_errors() {
    let dir = tempdir().expect("Failed to create temp directory");
    fs::write(
        dir.path().join("broken.json"),
        r#"{
            "a": {"$type": "number", "$value": "{b}"},
            "b": {"$type": "number", "$value": "{a}"},
            "c": {"$type": "dimension", "$value": "{missing}"}
        }"#,
    )
    .unwrap();

    let args = check(dir.path(), &["broken.json"], true, None);
    let Err(SwatchError::Parse(err)) = run(&args).await else {
        panic!("Expected parse error");
    };
    assert_eq!(err.diagnostics()[0].message(), "parser encountered 2 errors");
}

#[tokio::test]
async fn e2e_check_missing_config() {
    let dir = tempdir().expect("Failed to create temp directory");
    fs::write(dir.path().join("a.json"), "{}").unwrap();

    let mut args = check(dir.path(), &["a.json"], false, None);
    args.config = Some(dir.path().join("absent.toml"));

    let err = run(&args).await.unwrap_err();
    assert!(matches!(err, SwatchError::Config(_)));
}

#[cfg(feature = "yaml")]
#[tokio::test]
async fn e2e_check_yaml_input() {
    let dir = tempdir().expect("Failed to create temp directory");
    fs::write(
        dir.path().join("tokens.yaml"),
        "space:\n  $type: dimension\n  sm:\n    $value: 4px\n",
    )
    .unwrap();

    let args = check(dir.path(), &["tokens.yaml"], false, None);
    let outcome = run(&args).await.expect("Check failed");
    assert_eq!(outcome.tokens, 1);
}
