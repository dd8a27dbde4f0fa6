mod common;

use anyhow::Result;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use sqlx::PgPool;

use common::TestServer;

// End-to-end session-lifecycle properties. These need a real database; each
// test skips itself when none is reachable.

async fn setup() -> Result<Option<(&'static TestServer, PgPool)>> {
    let server = common::ensure_server().await?;
    if !common::server_has_database(server).await {
        eprintln!("skipping: server has no database");
        return Ok(None);
    }
    let Some(pool) = common::connect_db().await else {
        eprintln!("skipping: cannot connect to DATABASE_URL");
        return Ok(None);
    };
    Ok(Some((server, pool)))
}

async fn login(client: &Client, base: &str, email: &str, password: &str) -> Result<reqwest::Response> {
    Ok(client
        .post(format!("{}/auth/login", base))
        .json(&json!({"email": email, "password": password}))
        .send()
        .await?)
}

/// Login and return (access_token, refresh_token)
async fn login_ok(client: &Client, base: &str, email: &str, password: &str) -> Result<(String, String)> {
    let res = login(client, base, email, password).await?;
    assert_eq!(res.status(), StatusCode::OK, "login should succeed");
    let body = res.json::<Value>().await?;
    let access = body["data"]["access_token"].as_str().unwrap().to_string();
    let refresh = body["data"]["refresh_token"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["token_type"], "Bearer");
    Ok((access, refresh))
}

async fn refresh(client: &Client, base: &str, raw: &str) -> Result<reqwest::Response> {
    Ok(client
        .post(format!("{}/auth/refresh", base))
        .json(&json!({"refresh_token": raw}))
        .send()
        .await?)
}

#[tokio::test]
async fn refresh_token_is_single_use() -> Result<()> {
    let Some((server, pool)) = setup().await? else { return Ok(()) };
    let client = Client::new();
    let user = common::seed_user(&pool, "EDITOR", true).await?;

    let (_, rt1) = login_ok(&client, &server.base_url, &user.email, &user.password).await?;

    // First redemption succeeds and rotates
    let res = refresh(&client, &server.base_url, &rt1).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    let rt2 = body["data"]["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(rt1, rt2, "rotation must issue a different raw token");

    // Replaying the consumed token fails
    let res = refresh(&client, &server.base_url, &rt1).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<Value>().await?;
    assert_eq!(body["error"], "INVALID_REFRESH_TOKEN");

    // The replacement still works
    let res = refresh(&client, &server.base_url, &rt2).await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn logout_all_revokes_refresh_and_access_tokens() -> Result<()> {
    let Some((server, pool)) = setup().await? else { return Ok(()) };
    let client = Client::new();
    let user = common::seed_user(&pool, "EDITOR", true).await?;

    // Two sessions, as from two devices
    let (access_a, rt_a) = login_ok(&client, &server.base_url, &user.email, &user.password).await?;
    let (_, rt_b) = login_ok(&client, &server.base_url, &user.email, &user.password).await?;

    let res = client
        .post(format!("{}/auth/logout-all", server.base_url))
        .bearer_auth(&access_a)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    // Every refresh token issued before the call is now dead, expiry untouched
    for rt in [&rt_a, &rt_b] {
        let res = refresh(&client, &server.base_url, rt).await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body = res.json::<Value>().await?;
        assert_eq!(body["error"], "REFRESH_TOKEN_REVOKED");
    }

    // The unexpired access token dies at the next live token_version check
    let res = client
        .get(format!("{}/auth/profile", server.base_url))
        .bearer_auth(&access_a)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<Value>().await?;
    assert_eq!(body["error"], "TOKEN_REVOKED");
    Ok(())
}

#[tokio::test]
async fn expired_refresh_token_is_rejected_despite_matching_version() -> Result<()> {
    let Some((server, pool)) = setup().await? else { return Ok(()) };
    let client = Client::new();
    let user = common::seed_user(&pool, "VIEWER", true).await?;

    let (_, rt) = login_ok(&client, &server.base_url, &user.email, &user.password).await?;
    common::expire_refresh_token(&pool, user.id).await?;

    let res = refresh(&client, &server.base_url, &rt).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<Value>().await?;
    assert_eq!(body["error"], "REFRESH_TOKEN_REVOKED");
    Ok(())
}

#[tokio::test]
async fn concurrent_refresh_has_exactly_one_winner() -> Result<()> {
    let Some((server, pool)) = setup().await? else { return Ok(()) };
    let client = Client::new();
    let user = common::seed_user(&pool, "EDITOR", true).await?;

    let (_, rt) = login_ok(&client, &server.base_url, &user.email, &user.password).await?;

    let (first, second) = tokio::join!(
        refresh(&client, &server.base_url, &rt),
        refresh(&client, &server.base_url, &rt),
    );
    let statuses = [first?.status(), second?.status()];

    let winners = statuses.iter().filter(|s| **s == StatusCode::OK).count();
    let losers = statuses.iter().filter(|s| **s == StatusCode::UNAUTHORIZED).count();
    assert_eq!((winners, losers), (1, 1), "statuses: {:?}", statuses);

    // Exactly one replacement token exists for this user afterwards
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM refresh_tokens WHERE user_id = $1")
        .bind(user.id)
        .fetch_one(&pool)
        .await?;
    assert_eq!(count, 1);
    Ok(())
}

#[tokio::test]
async fn wrong_password_and_unknown_email_are_indistinguishable() -> Result<()> {
    let Some((server, pool)) = setup().await? else { return Ok(()) };
    let client = Client::new();
    let user = common::seed_user(&pool, "EDITOR", true).await?;

    let wrong_password = login(&client, &server.base_url, &user.email, "Wrong-Passw0rd").await?;
    let unknown_email =
        login(&client, &server.base_url, "nobody@test.example.com", "Wrong-Passw0rd").await?;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);

    // Same body, byte for byte: no account enumeration
    let body_a = wrong_password.json::<Value>().await?;
    let body_b = unknown_email.json::<Value>().await?;
    assert_eq!(body_a, body_b);
    assert_eq!(body_a["error"], "INVALID_CREDENTIALS");
    Ok(())
}

#[tokio::test]
async fn generation_counter_scenario() -> Result<()> {
    let Some((server, pool)) = setup().await? else { return Ok(()) };
    let client = Client::new();
    let user = common::seed_user(&pool, "EDITOR", true).await?;

    // login -> rt1
    let (_, rt1) = login_ok(&client, &server.base_url, &user.email, &user.password).await?;

    // refresh(rt1) -> rt2
    let res = refresh(&client, &server.base_url, &rt1).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    let access2 = body["data"]["access_token"].as_str().unwrap().to_string();
    let rt2 = body["data"]["refresh_token"].as_str().unwrap().to_string();

    // refresh(rt1) again -> consumed
    let res = refresh(&client, &server.base_url, &rt1).await?;
    let body = res.json::<Value>().await?;
    assert_eq!(body["error"], "INVALID_REFRESH_TOKEN");

    // logout-all bumps token_version to 1
    let res = client
        .post(format!("{}/auth/logout-all", server.base_url))
        .bearer_auth(&access2)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let version: i32 = sqlx::query_scalar("SELECT token_version FROM users WHERE id = $1")
        .bind(user.id)
        .fetch_one(&pool)
        .await?;
    assert_eq!(version, 1);

    // rt2 snapshot is 0, user is now 1: version mismatch
    let res = refresh(&client, &server.base_url, &rt2).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<Value>().await?;
    assert_eq!(body["error"], "REFRESH_TOKEN_REVOKED");
    Ok(())
}

#[tokio::test]
async fn logout_closes_one_session_but_access_token_expires_naturally() -> Result<()> {
    let Some((server, pool)) = setup().await? else { return Ok(()) };
    let client = Client::new();
    let user = common::seed_user(&pool, "EDITOR", true).await?;

    let (access, rt) = login_ok(&client, &server.base_url, &user.email, &user.password).await?;

    let logout = |rt: String| {
        let client = client.clone();
        let url = format!("{}/auth/logout", server.base_url);
        let access = access.clone();
        async move {
            client
                .post(url)
                .bearer_auth(access)
                .json(&json!({"refresh_token": rt}))
                .send()
                .await
        }
    };

    let res = logout(rt.clone()).await?;
    assert_eq!(res.status(), StatusCode::OK);

    // The refresh token is gone
    let res = refresh(&client, &server.base_url, &rt).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Deleting an already-deleted token is not an error
    let res = logout(rt.clone()).await?;
    assert_eq!(res.status(), StatusCode::OK);

    // Stateless access tokens stay valid until natural expiry
    let res = client
        .get(format!("{}/auth/profile", server.base_url))
        .bearer_auth(&access)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn inactive_accounts_cannot_login() -> Result<()> {
    let Some((server, pool)) = setup().await? else { return Ok(()) };
    let client = Client::new();
    let user = common::seed_user(&pool, "EDITOR", false).await?;

    let res = login(&client, &server.base_url, &user.email, &user.password).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<Value>().await?;
    assert_eq!(body["error"], "ACCOUNT_INACTIVE");
    Ok(())
}

#[tokio::test]
async fn profile_lists_sessions_without_token_material() -> Result<()> {
    let Some((server, pool)) = setup().await? else { return Ok(()) };
    let client = Client::new();
    let user = common::seed_user(&pool, "VIEWER", true).await?;

    let (access, _) = login_ok(&client, &server.base_url, &user.email, &user.password).await?;

    let res = client
        .get(format!("{}/auth/profile", server.base_url))
        .bearer_auth(&access)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["user"]["email"], user.email.as_str());
    assert!(body["data"]["user"].get("password_hash").is_none());
    assert!(body["data"]["user"].get("token_version").is_none());

    let sessions = body["data"]["sessions"].as_array().unwrap();
    assert!(!sessions.is_empty());
    for session in sessions {
        assert!(session.get("token_hash").is_none());
        assert!(session.get("expires_at").is_some());
    }
    Ok(())
}
