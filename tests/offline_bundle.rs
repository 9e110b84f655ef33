// tests/offline_bundle.rs

//! End-to-end bundle tests: downloads, idempotence, generated files.

mod common;

use common::{pipeline, sample_registry, scratch_config, wheel_url, CountingTransport};
use std::fs;
use std::sync::Arc;
use wheelhouse::SilentProgress;

#[test]
fn test_bundle_writes_wheels_and_manifest() {
    let temp = tempfile::tempdir().unwrap();
    let transport = Arc::new(CountingTransport::new());
    let wheelhouse = pipeline(
        scratch_config(temp.path()),
        Arc::new(sample_registry()),
        transport.clone(),
    );

    let outcome = wheelhouse
        .run(&["requests"], &SilentProgress::new())
        .unwrap();

    assert_eq!(outcome.records.len(), 7);
    assert_eq!(outcome.failed_downloads(), 0);
    assert_eq!(transport.calls(), 7);

    let wheels: Vec<_> = fs::read_dir(temp.path().join("wheels"))
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(wheels.len(), 7);
    assert!(wheels.contains(&"requests-2.32.3-py3-none-any.whl".to_string()));

    let requirements = fs::read_to_string(&outcome.files.requirements).unwrap();
    assert_eq!(
        requirements,
        "requests==2.32.3\ncharset-normalizer==3.3.2\nidna==3.7\nurllib3==2.2.1\n\
         certifi==2024.2.2\nnumpy==2.1.0\npandas==2.2.2\n"
    );

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&outcome.files.manifest).unwrap()).unwrap();
    assert_eq!(manifest["schema_version"], 1);
    assert_eq!(manifest["wheel_dir"], "wheels");
    assert_eq!(manifest["artifacts"].as_array().unwrap().len(), 7);

    let script = fs::read_to_string(&outcome.files.install_sh).unwrap();
    assert!(script.contains("for wheel in \"wheels\"/*.whl; do"));
    assert!(script.contains("--no-index --no-deps"));
    assert!(!script.contains("conda create"));
}

#[test]
fn test_second_run_reuses_downloads() {
    let temp = tempfile::tempdir().unwrap();
    let transport = Arc::new(CountingTransport::new());
    let wheelhouse = pipeline(
        scratch_config(temp.path()),
        Arc::new(sample_registry()),
        transport.clone(),
    );

    let first = wheelhouse.run(&["six", "idna"], &SilentProgress::new()).unwrap();
    let calls_after_first = transport.calls();
    let requirements_first = fs::read(&first.files.requirements).unwrap();
    let manifest_first = fs::read(&first.files.manifest).unwrap();

    let second = wheelhouse.run(&["six", "idna"], &SilentProgress::new()).unwrap();

    assert_eq!(transport.calls(), calls_after_first);
    assert_eq!(transport.calls_for(&wheel_url("six", "1.16.0")), 1);
    assert_eq!(first.records, second.records);
    assert_eq!(requirements_first, fs::read(&second.files.requirements).unwrap());
    assert_eq!(manifest_first, fs::read(&second.files.manifest).unwrap());
}

#[test]
fn test_failed_download_is_isolated() {
    let temp = tempfile::tempdir().unwrap();
    let broken = wheel_url("idna", "3.7");
    let transport = Arc::new(CountingTransport::failing_on(&[broken.clone()]));
    let wheelhouse = pipeline(
        scratch_config(temp.path()),
        Arc::new(sample_registry()),
        transport,
    );

    let outcome = wheelhouse.run(&["requests"], &SilentProgress::new()).unwrap();

    assert_eq!(outcome.failed_downloads(), 1);
    let idna = outcome.records.iter().find(|r| r.name == "idna").unwrap();
    assert!(idna.file.is_none());
    assert!(outcome
        .records
        .iter()
        .filter(|r| r.name != "idna")
        .all(|r| r.file.as_ref().is_some_and(|f| f.is_file())));

    // Partial downloads never land under the final name or linger as temp files
    let names: Vec<String> = fs::read_dir(temp.path().join("wheels"))
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 6);
    assert!(names.iter().all(|n| n.ends_with(".whl") && !n.starts_with("idna")));

    let requirements = fs::read_to_string(&outcome.files.requirements).unwrap();
    assert!(requirements.contains("idna==3.7\n"));
    assert!(!outcome.manifest.artifacts.iter().find(|e| e.name == "idna").unwrap().downloaded);
}

#[test]
fn test_conda_preamble_when_configured() {
    let temp = tempfile::tempdir().unwrap();
    let mut config = scratch_config(temp.path());
    config.manifest.env_name = Some("offline_env".to_string());
    config.manifest.python_version = Some("3.9".to_string());
    config.resolver.force_include_critical = false;
    let wheelhouse = pipeline(
        config,
        Arc::new(sample_registry()),
        Arc::new(CountingTransport::new()),
    );

    let outcome = wheelhouse.run(&["six"], &SilentProgress::new()).unwrap();

    let sh = fs::read_to_string(&outcome.files.install_sh).unwrap();
    assert!(sh.contains("conda create -y -n offline_env python=3.9"));
    let bat = fs::read_to_string(&outcome.files.install_bat).unwrap();
    assert!(bat.contains("call conda activate offline_env\r\n"));
    assert!(bat.contains("for %%W in (\"wheels\\*.whl\") do ("));
    assert_eq!(
        fs::read_to_string(&outcome.files.requirements).unwrap(),
        "six==1.16.0\n"
    );
}

#[test]
fn test_empty_resolution_still_writes_bundle() {
    let temp = tempfile::tempdir().unwrap();
    let mut config = scratch_config(temp.path());
    config.resolver.force_include_critical = false;
    let wheelhouse = pipeline(
        config,
        Arc::new(sample_registry()),
        Arc::new(CountingTransport::new()),
    );

    let outcome = wheelhouse.run(&["===bad=="], &SilentProgress::new()).unwrap();

    assert!(outcome.records.is_empty());
    assert_eq!(outcome.resolution.rejected, vec!["===bad==".to_string()]);
    assert_eq!(fs::read_to_string(&outcome.files.requirements).unwrap(), "");
}

#[test]
fn test_name_spellings_share_one_manifest_line() {
    let temp = tempfile::tempdir().unwrap();
    let mut config = scratch_config(temp.path());
    config.resolver.force_include_critical = false;
    let registry = sample_registry()
        .package("typing_extensions", &["4.12.2"], &[])
        .package("app", &["1.0"], &["typing-extensions>=4", "Six"]);
    let transport = Arc::new(CountingTransport::new());
    let wheelhouse = pipeline(config, Arc::new(registry), transport.clone());

    let outcome = wheelhouse
        .run(&["typing_extensions", "app", "TYPING-EXTENSIONS"], &SilentProgress::new())
        .unwrap();

    assert_eq!(
        fs::read_to_string(&outcome.files.requirements).unwrap(),
        "typing-extensions==4.12.2\napp==1.0\nsix==1.16.0\n"
    );
    assert_eq!(outcome.manifest.artifacts.len(), 3);
    assert_eq!(
        outcome.manifest.artifacts[0].filename,
        "typing_extensions-4.12.2-py3-none-any.whl"
    );
    assert_eq!(transport.calls(), 3);
}
