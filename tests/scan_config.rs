use std::sync::Mutex;

use tempfile::NamedTempFile;

use binsight::ScanConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in ["BINSIGHT_CONFIG", "BINSIGHT_LISTEN_ADDR", "BINSIGHT_MODEL", "PORT"] {
        std::env::remove_var(key);
    }
}

fn write_config(toml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp config");
    std::io::Write::write_all(&mut file, toml.as_bytes()).expect("write config");
    file
}

#[test]
fn defaults_apply_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = ScanConfig::load().expect("load config");
    assert_eq!(cfg.listen_addr, "0.0.0.0:8000");
    assert!(cfg.model_ref.is_none());
    assert!((cfg.conf_threshold - 0.30).abs() < 1e-6);
    assert!((cfg.boost_factor - 1.1).abs() < 1e-6);
    assert!((cfg.boost_cap - 0.95).abs() < 1e-6);
    assert_eq!(cfg.max_items, 3);
    assert_eq!(cfg.infer_timeout.as_millis(), 10_000);

    clear_env();
}

#[test]
fn loads_config_from_file_with_port_override() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(
        r#"
listen_addr = "0.0.0.0:9000"

[model]
path = "stub:kiosk"

[pipeline]
conf_threshold = 0.4
max_items = 2
infer_timeout_ms = 2500
"#,
    );

    std::env::set_var("BINSIGHT_CONFIG", file.path());
    std::env::set_var("PORT", "8081");

    let cfg = ScanConfig::load().expect("load config");

    // PORT rewrites only the port of the file-provided address.
    assert_eq!(cfg.listen_addr, "0.0.0.0:8081");
    assert_eq!(cfg.model_ref.as_deref(), Some("stub:kiosk"));
    assert!((cfg.conf_threshold - 0.4).abs() < 1e-6);
    assert_eq!(cfg.max_items, 2);
    assert_eq!(cfg.infer_timeout.as_millis(), 2500);
    // Untouched knobs keep their defaults.
    assert!((cfg.boost_factor - 1.1).abs() < 1e-6);
    assert!((cfg.boost_cap - 0.95).abs() < 1e-6);

    clear_env();
}

#[test]
fn model_path_comes_from_the_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(
        r#"
[model]
path = "models/custom.onnx"
"#,
    );
    std::env::set_var("BINSIGHT_CONFIG", file.path());

    let cfg = ScanConfig::load().expect("load config");
    assert_eq!(cfg.model_ref.as_deref(), Some("models/custom.onnx"));

    clear_env();
}

#[test]
fn only_port_is_read_from_the_environment() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(
        r#"
listen_addr = "0.0.0.0:9000"

[model]
path = "models/custom.onnx"
"#,
    );
    std::env::set_var("BINSIGHT_CONFIG", file.path());
    // Neither of these is part of the configuration surface.
    std::env::set_var("BINSIGHT_LISTEN_ADDR", "10.0.0.1:7000");
    std::env::set_var("BINSIGHT_MODEL", "stub:demo");

    let cfg = ScanConfig::load().expect("load config");
    assert_eq!(cfg.listen_addr, "0.0.0.0:9000");
    assert_eq!(cfg.model_ref.as_deref(), Some("models/custom.onnx"));

    clear_env();
}

#[test]
fn rejects_out_of_range_pipeline_values() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(
        r#"
[pipeline]
conf_threshold = 1.5
"#,
    );
    std::env::set_var("BINSIGHT_CONFIG", file.path());

    assert!(ScanConfig::load().is_err());

    clear_env();
}

#[test]
fn rejects_non_numeric_port() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("PORT", "not-a-port");
    assert!(ScanConfig::load().is_err());

    clear_env();
}

#[test]
fn rejects_unreadable_config_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("BINSIGHT_CONFIG", "/nonexistent/binsight.toml");
    assert!(ScanConfig::load().is_err());

    clear_env();
}
