#![allow(missing_docs)]

use std::fs;
use volga_di_gen::{Error, generate_from_manifest};

#[test]
fn it_generates_from_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("di.json");
    fs::write(&manifest, r#"{
        "package_name": "services",
        "output": "src/generated",
        "providers": [
            { "name": "Repo", "provider": "fn repo(pool: Arc<crate::db::Pool>) -> crate::repo::Repo" },
            { "name": "Pool", "provider": "fn pool() -> Result<Arc<crate::db::Pool>, std::io::Error>" }
        ]
    }"#).unwrap();

    let path = generate_from_manifest(&manifest).unwrap();
    let source = fs::read_to_string(&path).unwrap();

    assert_eq!(path, dir.path().join("src").join("generated").join("services.rs"));
    assert!(source.contains("//! Dependency injection container of the `services` module"));
    assert!(source.find("let pool").unwrap() < source.find("let repo").unwrap());
}

#[test]
fn it_uses_template_next_to_manifest() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("order.hbs"), "{{#each services}}{{name}};{{/each}}").unwrap();
    let manifest = dir.path().join("di.json");
    fs::write(&manifest, r#"{
        "template": { "file": "order.hbs" },
        "providers": [
            { "name": "B", "provider": "fn b(x: Arc<crate::x::X>) -> Arc<crate::y::Y>" },
            { "name": "A", "provider": "fn a() -> Arc<crate::x::X>" }
        ]
    }"#).unwrap();

    let path = generate_from_manifest(&manifest).unwrap();

    assert_eq!(path, dir.path().join("di.rs"));
    assert_eq!(fs::read_to_string(path).unwrap(), "A;B;");
}

#[test]
fn it_rejects_duplicate_provider_names() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("di.json");
    fs::write(&manifest, r#"{
        "providers": [
            { "name": "A", "provider": "fn a() -> Arc<crate::x::X>" },
            { "name": "A", "provider": "fn a2() -> Arc<crate::y::Y>" }
        ]
    }"#).unwrap();

    let err = generate_from_manifest(&manifest).unwrap_err();

    assert!(matches!(err, Error::DuplicateName(name) if name == "A"));
    assert!(!dir.path().join("di.rs").exists());
}

#[test]
fn it_rejects_async_provider() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("di.json");
    fs::write(&manifest, r#"{
        "providers": [{ "name": "A", "provider": "async fn a() -> Arc<crate::x::X>" }]
    }"#).unwrap();

    let err = generate_from_manifest(&manifest).unwrap_err();

    assert!(matches!(err, Error::InvalidSignature { provider, .. } if provider == "A"));
}
