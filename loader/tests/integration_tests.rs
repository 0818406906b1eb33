use std::io::Write;

use serde::Deserialize;
use yaml_overlay_core::{Mapping, MergeError, Path, Value};
use yaml_overlay_loader::{ConfigFile, LoadError, LoadOptions, LoadedModel, load, load_paths};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load_inline(files: &[(&str, &str)]) -> Result<LoadedModel, LoadError> {
    let files: Vec<_> = files
        .iter()
        .map(|(name, content)| ConfigFile::new(*name, *content))
        .collect();
    load(&files, &LoadOptions::default())
}

fn at<'a>(model: &'a LoadedModel, path: &str) -> Option<&'a Value> {
    let path: Path = path.parse().unwrap();
    model.value.as_ref().and_then(|v| v.get_path(&path))
}

fn strings(items: &[&str]) -> Value {
    Value::Sequence(items.iter().map(|s| Value::from(*s)).collect())
}

// ---------------------------------------------------------------------------
// Cross-file merge
// ---------------------------------------------------------------------------

#[test]
fn test_two_file_map_override() {
    let model = load_inline(&[
        (
            "test.yaml",
            "
services:
  test:
    image: foo
    command: echo hello
    init: true
",
        ),
        (
            "override.yaml",
            "
services:
  test:
    image: bar
    command: echo world
    init: false
",
        ),
    ])
    .unwrap();

    let test = at(&model, "services.test").unwrap().as_mapping().unwrap();
    assert_eq!(test.len(), 3);
    assert_eq!(test["image"], Value::from("bar"));
    assert_eq!(test["command"], Value::from("echo world"));
    assert_eq!(test["init"], Value::from(false));
}

#[test]
fn test_placeholders_survive_merge_untouched() {
    let model = load_inline(&[
        (
            "test.yaml",
            "
services:
  test:
    image: foo
    environment:
      my_env: ${my_env?my_env must be set}
",
        ),
        (
            "override.yaml",
            "
services:
  test:
    image: bar
    environment:
      my_env: ${my_env:-default}
",
        ),
    ])
    .unwrap();

    assert_eq!(
        at(&model, "services.test.environment.my_env"),
        Some(&Value::from("${my_env:-default}"))
    );
    assert_eq!(at(&model, "services.test.image"), Some(&Value::from("bar")));
}

#[test]
fn test_sequences_are_replaced_across_files() {
    let model = load_inline(&[
        ("base.yaml", "ports: [\"80:80\", \"443:443\"]\n"),
        ("override.yaml", "ports: [\"8080:80\"]\n"),
    ])
    .unwrap();
    assert_eq!(at(&model, "ports"), Some(&strings(&["8080:80"])));
}

#[test]
fn test_reset_removes_network() {
    let model = load_inline(&[
        (
            "(inline)",
            "
name: test-reset
networks:
  test:
    name: test
    external: true
",
        ),
        ("(override)", "networks:\n  test: !reset {}\n"),
    ])
    .unwrap();

    assert_eq!(at(&model, "networks"), Some(&Value::Mapping(Mapping::new())));
    assert_eq!(at(&model, "name"), Some(&Value::from("test-reset")));
    assert!(model.resets.contains(&"networks.test".parse().unwrap()));
}

#[test]
fn test_reset_in_earlier_file_wins_over_later_content() {
    let model = load_inline(&[
        ("a.yaml", "services:\n  web:\n    init: !reset true\n"),
        ("b.yaml", "services:\n  web:\n    init: false\n    image: nginx\n"),
    ])
    .unwrap();
    assert!(at(&model, "services.web.init").is_none());
    assert_eq!(at(&model, "services.web.image"), Some(&Value::from("nginx")));
}

#[test]
fn test_override_replaces_network() {
    let model = load_inline(&[
        (
            "(inline)",
            "
name: test-override
networks:
  test:
    name: test
    external: true
",
        ),
        ("(override)", "networks:\n  test: !override {}\n"),
    ])
    .unwrap();

    assert_eq!(
        at(&model, "networks.test"),
        Some(&Value::Mapping(Mapping::new()))
    );
}

#[test]
fn test_override_on_array() {
    let model = load_inline(&[
        ("base.yaml", "services:\n  app:\n    volumes: [/a, /b]\n"),
        ("override.yaml", "services:\n  app:\n    volumes: !override [/c]\n"),
    ])
    .unwrap();
    assert_eq!(at(&model, "services.app.volumes"), Some(&strings(&["/c"])));
}

#[test]
fn test_custom_tags_from_options() {
    let files = [
        ConfigFile::new("base.yaml", "a: 1\nb: {x: 1, y: 2}\n"),
        ConfigFile::new("override.yaml", "a: !drop 0\nb: !replace {z: 3}\n"),
    ];
    let options = LoadOptions {
        reset_tag: "!drop".into(),
        override_tag: "!replace".into(),
        ..LoadOptions::default()
    };
    let model = load(&files, &options).unwrap();
    assert!(at(&model, "a").is_none());
    let b = at(&model, "b").unwrap().as_mapping().unwrap();
    assert_eq!(b.keys().collect::<Vec<_>>(), vec!["z"]);
}

// ---------------------------------------------------------------------------
// Cycle detection
// ---------------------------------------------------------------------------

#[test]
fn test_alias_without_cycle() {
    let model = load_inline(&[(
        "(inline)",
        "
name: test
services:
  a: &a
    image: alpine
  a2: *a
",
    )])
    .unwrap();
    assert_eq!(at(&model, "services.a2.image"), Some(&Value::from("alpine")));
}

#[test]
fn test_alias_without_cycle_reversed() {
    let model = load_inline(&[(
        "(inline)",
        "
name: test
services:
  a2: &a
    image: alpine
  a: *a
",
    )])
    .unwrap();
    assert_eq!(at(&model, "services.a.image"), Some(&Value::from("alpine")));
}

#[test]
fn test_healthcheck_cycle() {
    let err = load_inline(&[(
        "(inline)",
        "
x-healthcheck: &healthcheck
  egress-service:
    <<: *healthcheck
",
    )])
    .unwrap_err();

    assert!(matches!(
        &err,
        LoadError::Merge(MergeError::Cycle { path }) if path == "x-healthcheck.egress-service"
    ));
    assert_eq!(
        err.to_string(),
        "cycle detected at path: x-healthcheck.egress-service"
    );
}

// ---------------------------------------------------------------------------
// Merge keys and aliases within one file
// ---------------------------------------------------------------------------

#[test]
fn test_merge_key_carries_override() {
    let model = load_inline(&[(
        "override.yaml",
        "
services:
  base:
    configs:
      - source: credentials
        target: /credentials/file1
  x: &x
    configs: !override
      - source: credentials
        target: /literally-anywhere-else

  y:
    <<: *x

configs:
  credentials:
    content: |
      dummy value
",
    )])
    .unwrap();

    let target = |service: &str| {
        at(&model, &format!("services.{service}.configs[0].target")).cloned()
    };
    assert_eq!(target("base"), Some(Value::from("/credentials/file1")));
    assert_eq!(target("x"), Some(Value::from("/literally-anywhere-else")));
    assert_eq!(target("y"), Some(Value::from("/literally-anywhere-else")));
    assert_eq!(
        at(&model, "configs.credentials.content"),
        Some(&Value::from("dummy value\n"))
    );
}

#[test]
fn test_aliased_sequence_is_flattened() {
    let model = load_inline(&[(
        "override.yaml",
        "
x-app:
  volumes: &app-volumes
    - /data/app:/app/data
services:
  app:
    image: myapp:latest
    volumes:
      - *app-volumes
      - /logs/app:/app/logs
",
    )])
    .unwrap();

    assert_eq!(
        at(&model, "services.app.volumes"),
        Some(&strings(&["/data/app:/app/data", "/logs/app:/app/logs"]))
    );
    assert_eq!(
        at(&model, "x-app.volumes"),
        Some(&strings(&["/data/app:/app/data"]))
    );
}

#[test]
fn test_merge_key_overrides_scalar_and_appends_sequence() {
    let model = load_inline(&[(
        "override.yaml",
        "
x-app: &app-volumes
  image: alpine
  volumes:
    - /data/app:/app/data
services:
  app:
    image: python
    <<: *app-volumes
    volumes:
      - /logs/app:/app/logs
",
    )])
    .unwrap();

    assert_eq!(at(&model, "services.app.image"), Some(&Value::from("alpine")));
    assert_eq!(
        at(&model, "services.app.volumes"),
        Some(&strings(&["/logs/app:/app/logs", "/data/app:/app/data"]))
    );
    assert_eq!(at(&model, "x-app.image"), Some(&Value::from("alpine")));
}

#[test]
fn test_merge_key_keeps_local_field_of_other_shape() {
    let model = load_inline(&[(
        "inline.yaml",
        "
x: &x {image: [a, b], cmd: run}
svc:
  image: python
  cmd: [sh]
  <<: *x
",
    )])
    .unwrap();
    assert_eq!(at(&model, "svc.image"), Some(&Value::from("python")));
    assert_eq!(at(&model, "svc.cmd"), Some(&strings(&["sh"])));
}

#[test]
fn test_merge_key_append_skips_duplicates() {
    let model = load_inline(&[(
        "inline.yaml",
        "
x-base: &base
  volumes: [/data, /logs]
app:
  <<: *base
  volumes: [/logs, /cache]
",
    )])
    .unwrap();
    assert_eq!(
        at(&model, "app.volumes"),
        Some(&strings(&["/logs", "/cache", "/data"]))
    );
}

// ---------------------------------------------------------------------------
// Typed decoding and file-backed loading
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, PartialEq)]
struct Network {
    name: String,
    #[serde(default)]
    external: bool,
}

#[test]
fn test_decode_merged_tree() {
    let model = load_inline(&[
        ("a.yaml", "test:\n  name: test\n  external: true\n"),
        ("b.yaml", "test:\n  external: false\n"),
    ])
    .unwrap();

    let networks: std::collections::BTreeMap<String, Network> = model.decode().unwrap();
    assert_eq!(
        networks["test"],
        Network {
            name: "test".into(),
            external: false
        }
    );
}

#[test]
fn test_decode_type_mismatch_is_yaml_error() {
    let model = load_inline(&[("a.yaml", "test: [1, 2]\n")]).unwrap();
    let err = model
        .decode::<std::collections::BTreeMap<String, Network>>()
        .unwrap_err();
    assert!(matches!(err, LoadError::Yaml(_)));
}

#[test]
fn test_load_paths_records_sources() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("compose.yaml");
    let over = dir.path().join("compose.override.yaml");

    let mut f = std::fs::File::create(&base).unwrap();
    f.write_all(b"services:\n  web:\n    image: nginx\n").unwrap();
    let mut f = std::fs::File::create(&over).unwrap();
    f.write_all(b"services:\n  web:\n    image: nginx:alpine\n").unwrap();

    let model = load_paths(&[&base, &over], &LoadOptions::default()).unwrap();
    assert_eq!(at(&model, "services.web.image"), Some(&Value::from("nginx:alpine")));

    assert_eq!(model.sources.len(), 2);
    assert_eq!(model.sources[0].filename, base.display().to_string());
    assert_eq!(model.sources[1].filename, over.display().to_string());
    assert_eq!(model.sources[0].digest.len(), 64);
    assert_ne!(model.sources[0].digest, model.sources[1].digest);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_paths(&[dir.path().join("absent.yaml")], &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, LoadError::Io(_)));
}

#[test]
fn test_options_file_drives_load() {
    let dir = tempfile::tempdir().unwrap();
    let options_path = dir.path().join("overlay.yml");
    std::fs::write(&options_path, "merge_key: $merge\n").unwrap();

    let options = LoadOptions::load(&options_path).unwrap();
    let files = [ConfigFile::new(
        "inline.yaml",
        "base: &b {image: alpine}\napp:\n  $merge: *b\n",
    )];
    let model = load(&files, &options).unwrap();
    assert_eq!(at(&model, "app.image"), Some(&Value::from("alpine")));
}
