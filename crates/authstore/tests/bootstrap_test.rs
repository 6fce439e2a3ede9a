//! End-to-end: config file -> tracing -> storer.

use authstore::{Attributes, BackendKind, LookupStrategy, UserStorer, bootstrap};

#[tokio::test]
async fn test_bootstrap_memory_backend_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("authstore.toml");
    std::fs::write(
        &path,
        r#"
backend = "memory"

[memory]
seed_demo_account = false
lookup = "indexed"

[logging]
level = "debug"
"#,
    )
    .unwrap();

    let (config, storer) = bootstrap(Some(&path)).await.unwrap();
    assert_eq!(config.backend, BackendKind::Memory);
    assert_eq!(config.memory.lookup, LookupStrategy::Indexed);

    let attributes = Attributes::new()
        .with("email", "a@b.com")
        .with("recover_token", "R1");
    storer.create("a@b.com", &attributes).await.unwrap();
    assert_eq!(storer.recover_user("R1").await.unwrap().id, 1);

    storer.add_token("a@b.com", "cookie").await.unwrap();
    storer.use_token("a@b.com", "cookie").await.unwrap();
    assert!(
        storer
            .use_token("a@b.com", "cookie")
            .await
            .unwrap_err()
            .is_token_not_found()
    );
}
