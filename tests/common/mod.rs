// Shared integration-test harness: spawns the built server binary on a free
// port and exposes database helpers for seeding. Database-backed tests skip
// themselves when DATABASE_URL is absent or unreachable.
#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

/// Signing key handed to the spawned server unless the environment brings its own
pub const TEST_JWT_SECRET: &str = "integration-test-secret";

/// bcrypt cost for seeded fixtures; minimum keeps the suite fast
pub const TEST_BCRYPT_COST: u32 = 4;

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Spawn the already-built binary to keep start fast during tests
        // Assumes debug profile; adjust if you run tests with --release
        let mut cmd = Command::new("target/debug/studio-api");
        cmd.env("STUDIO_API_PORT", port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        if std::env::var("JWT_SECRET").is_err() {
            cmd.env("JWT_SECRET", TEST_JWT_SECRET);
        }

        // Inherit environment so the server can see DATABASE_URL from .env (loaded by the server)
        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline { break; }
            let url = format!("{}/health", self.base_url);
            match client.get(&url).send().await {
                Ok(resp) => {
                    // Consider server ready on any non-404 response
                    if resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE {
                        return Ok(());
                    }
                }
                Err(_) => {}
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    // Use stable get_or_init and convert init errors into a panic with context.
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Connect to the test database, or None when it is not available. Callers
/// skip database-backed assertions in that case.
pub async fn connect_db() -> Option<PgPool> {
    let url = std::env::var("DATABASE_URL").ok()?;
    PgPoolOptions::new()
        .max_connections(4)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&url)
        .await
        .ok()
}

/// True once the spawned server reports a healthy database, meaning its
/// startup migrations have been applied
pub async fn server_has_database(server: &TestServer) -> bool {
    let client = reqwest::Client::new();
    match client.get(format!("{}/health", server.base_url)).send().await {
        Ok(resp) => resp.status() == StatusCode::OK,
        Err(_) => false,
    }
}

pub struct SeededUser {
    pub id: Uuid,
    pub email: String,
    pub password: String,
}

/// Insert a user fixture directly. Emails are unique per call so suites can
/// re-run without cleanup.
pub async fn seed_user(pool: &PgPool, role: &str, is_active: bool) -> Result<SeededUser> {
    let marker = Uuid::new_v4().simple().to_string();
    let email = format!("{}-{}@test.example.com", role.to_lowercase(), &marker[..12]);
    let password = format!("Passw0rd-{}", &marker[..8]);
    let password_hash = bcrypt::hash(&password, TEST_BCRYPT_COST)?;

    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO users (name, email, password_hash, role, is_active) \
         VALUES ($1, $2, $3, $4::user_role, $5) RETURNING id",
    )
    .bind(format!("Seeded {}", role))
    .bind(&email)
    .bind(&password_hash)
    .bind(role)
    .bind(is_active)
    .fetch_one(pool)
    .await?;

    Ok(SeededUser { id, email, password })
}

/// Backdate a stored refresh token so it reads as expired
pub async fn expire_refresh_token(pool: &PgPool, user_id: Uuid) -> Result<()> {
    sqlx::query(
        "UPDATE refresh_tokens SET expires_at = now() - interval '1 hour' WHERE user_id = $1",
    )
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}
