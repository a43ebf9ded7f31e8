use dockhand_control::{run_migrations, UserStore};
use dockhand_models::DockhandError;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    run_migrations(&pool).await.unwrap();
    pool
}

#[tokio::test]
async fn ensure_admin_bootstraps_once() {
    let store = UserStore::new(memory_pool().await);

    store.ensure_admin("admin", "admin").await.unwrap();
    let first = store.find_user("admin").await.unwrap().unwrap();

    // A second call with a different password must not rotate the credential.
    store.ensure_admin("admin", "changed").await.unwrap();
    let second = store.find_user("admin").await.unwrap().unwrap();
    assert_eq!(first.password_hash, second.password_hash);
}

#[tokio::test]
async fn authenticate_checks_password() {
    let store = UserStore::new(memory_pool().await);
    store.ensure_admin("admin", "swordfish").await.unwrap();

    let user = store.authenticate("admin", "swordfish").await.unwrap();
    assert_eq!(user.username, "admin");

    let err = store.authenticate("admin", "wrong").await.unwrap_err();
    assert!(matches!(err, DockhandError::InvalidCredentials));
}

#[tokio::test]
async fn unknown_user_fails_like_bad_password() {
    let store = UserStore::new(memory_pool().await);

    let err = store.authenticate("nobody", "whatever").await.unwrap_err();
    assert!(matches!(err, DockhandError::InvalidCredentials));
}

#[tokio::test]
async fn password_hashes_are_salted() {
    let store = UserStore::new(memory_pool().await);
    store.ensure_admin("a", "same").await.unwrap();
    store.ensure_admin("b", "same").await.unwrap();

    let a = store.find_user("a").await.unwrap().unwrap();
    let b = store.find_user("b").await.unwrap().unwrap();
    assert_ne!(a.password_hash, b.password_hash);
}
