//! Integration tests for rustwift against a live Swift cluster.
//!
//! These tests require a reachable Swift proxy. They are marked `#[ignore]`
//! so they don't run during normal `cargo test`.
//!
//! Credentials come from the usual Swift CLI variables: either
//! `OS_STORAGE_URL` and `OS_AUTH_TOKEN`, or `ST_AUTH`, `ST_USER` and `ST_KEY`
//! (defaulting to the SAIO `test:tester`/`testing` account).
//!
//! Run them with:
//! ```text
//! cargo test -p rustwift-integration -- --ignored
//! ```

use std::env;
use std::sync::{Arc, Once};

use rustwift::backend::{HttpBackend, HttpBackendConfig};
use rustwift::rustwift_auth::{Authenticator, StaticToken, SwauthV1};
use rustwift::{Account, Container};

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

fn authenticator() -> Arc<dyn Authenticator> {
    if let (Ok(url), Ok(token)) = (env::var("OS_STORAGE_URL"), env::var("OS_AUTH_TOKEN")) {
        return Arc::new(StaticToken::new(token, url));
    }
    let auth_url =
        env::var("ST_AUTH").unwrap_or_else(|_| "http://localhost:8080/auth/v1.0".to_owned());
    let user = env::var("ST_USER").unwrap_or_else(|_| "test:tester".to_owned());
    let key = env::var("ST_KEY").unwrap_or_else(|_| "testing".to_owned());
    Arc::new(SwauthV1::new(auth_url, user, key))
}

/// Authenticate and return the test account.
pub async fn account() -> anyhow::Result<Account> {
    init_tracing();
    let backend = HttpBackend::connect(authenticator(), HttpBackendConfig::default()).await?;
    Ok(Account::new(Arc::new(backend))?)
}

/// Generate a unique container name for a test.
#[must_use]
pub fn test_container_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}")
}

/// Create a uniquely named container.
pub async fn create_test_container(account: &Account, prefix: &str) -> anyhow::Result<Container> {
    let mut container = account.container(test_container_name(prefix));
    container.ensure_exists().await?;
    Ok(container)
}

/// Delete the given containers along with every object in them.
pub async fn cleanup_containers(account: &Account, containers: &[Container]) {
    let mut objects = Vec::new();
    for container in containers {
        match container.objects().collect().await {
            Ok(mut listed) => objects.append(&mut listed),
            Err(e) => tracing::warn!(container = container.name(), error = %e, "listing failed"),
        }
    }
    if let Err(e) = account.bulk_delete(&objects, containers, None).await {
        tracing::warn!(error = %e, "cleanup failed");
    }
}

/// `len` random bytes.
#[must_use]
pub fn random_bytes(len: usize) -> Vec<u8> {
    use rand::RngExt;

    let mut rng = rand::rng();
    let mut buf = vec![0u8; len];
    rng.fill(&mut buf[..]);
    buf
}

mod test_large_object;
mod test_object;
