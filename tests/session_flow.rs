use anyhow::{ensure, Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use std::{
    net::TcpListener,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zerotrust::{
    app_lib::{AppError, ClientConfig},
    features::auth::{
        decision::LoginDecision,
        state::SessionState,
        store::{CredentialStore, MemoryCredentialStore},
        types::{RiskLevel, Role},
        Gate, GateOutcome, LoginDecisionHandler,
    },
    routes::{LoginOutcome, Route, View},
    App,
};

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

struct Harness {
    server: MockServer,
    store: Arc<MemoryCredentialStore>,
    app: App,
}

impl Harness {
    async fn start() -> Result<Self> {
        Self::with_store(MemoryCredentialStore::new()).await
    }

    async fn with_store(store: MemoryCredentialStore) -> Result<Self> {
        let server = MockServer::start().await;
        let store = Arc::new(store);
        let config = ClientConfig::new(&format!("{}/api", server.uri()))
            .with_request_timeout(Duration::from_secs(5));
        let app = App::with_store(config, store.clone()).context("failed to build client")?;
        Ok(Self { server, store, app })
    }

    fn stored(&self) -> Result<Option<String>> {
        Ok(self
            .store
            .load()?
            .map(|credential| credential.expose_secret().to_string()))
    }
}

/// Base URL of a local port nothing listens on, so connections are refused.
fn unreachable_api() -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(format!("http://127.0.0.1:{port}/api"))
}

fn offline_app(store: &Arc<MemoryCredentialStore>) -> Result<App> {
    let config =
        ClientConfig::new(&unreachable_api()?).with_request_timeout(Duration::from_secs(5));
    App::with_store(config, store.clone()).context("failed to build client")
}

fn secret(value: &str) -> SecretString {
    SecretString::from(value.to_string())
}

fn status_body(role: &str, risk: &str, score: f64) -> Value {
    json!({
        "userId": "6f1c2f55-8d5e-4d8e-9d43-0c1d5b7a3e11",
        "email": "user1@company.com",
        "role": role,
        "trustScore": score,
        "riskLevel": risk,
        "mfaEnabled": false,
        "accountLocked": false,
        "failedLoginAttempts": 0,
        "lastLoginAt": "2024-03-01 10:15:00",
        "message": "User status retrieved successfully"
    })
}

async fn mount_status(server: &MockServer, token: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path("/api/auth/user-status"))
        .and(header("Authorization", format!("Bearer {token}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_login(server: &MockServer, status: u16, body: Value) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({
            "email": "user1@company.com",
            "password": "Password123!"
        })))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn allowed_login_authenticates_and_lands_on_user_status() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let harness = Harness::start().await?;
    mount_login(
        &harness.server,
        200,
        json!({
            "decision": "ALLOW",
            "token": "abc.def.ghi",
            "email": "user1@company.com",
            "role": "USER",
            "riskLevel": "LOW",
            "trustScore": 82.0,
            "message": "Login successful",
            "mfaRequired": false,
            "accountLocked": false
        }),
    )
    .await;
    mount_status(&harness.server, "abc.def.ghi", status_body("USER", "LOW", 82.0)).await;

    harness.app.session.bootstrap().await;
    let mut page = harness.app.login_page();
    let outcome = page
        .submit("user1@company.com", &secret("Password123!"))
        .await?;

    let LoginOutcome::Authenticated(principal) = outcome else {
        anyhow::bail!("expected an authenticated outcome, got {outcome:?}");
    };
    assert_eq!(principal.role, Role::User);
    assert_eq!(principal.risk_level, RiskLevel::Low);
    assert!(harness.app.session.is_authenticated());
    assert_eq!(harness.app.navigator.current(), Route::UserStatus);
    assert_eq!(harness.stored()?.as_deref(), Some("abc.def.ghi"));
    Ok(())
}

#[tokio::test]
async fn second_factor_keeps_session_closed_until_accepted() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let harness = Harness::start().await?;
    mount_login(
        &harness.server,
        200,
        json!({
            "decision": "REQUIRE_MFA",
            "token": "abc.def.ghi",
            "email": "user1@company.com",
            "role": "USER",
            "riskLevel": "MEDIUM",
            "trustScore": 55.0,
            "message": "Additional verification required",
            "mfaRequired": true,
            "accountLocked": false
        }),
    )
    .await;
    mount_status(&harness.server, "abc.def.ghi", status_body("USER", "MEDIUM", 55.0)).await;

    harness.app.session.bootstrap().await;
    let mut page = harness.app.login_page();
    let outcome = page
        .submit("user1@company.com", &secret("Password123!"))
        .await?;

    let LoginOutcome::SecondFactorRequired(summary) = outcome else {
        anyhow::bail!("expected a second-factor outcome, got {outcome:?}");
    };
    assert_eq!(summary.risk_level, Some(RiskLevel::Medium));
    assert_eq!(harness.app.session.state(), SessionState::Unauthenticated);
    assert!(!harness.app.session.snapshot().has_credential);
    assert!(harness.stored()?.is_none());
    assert!(page.pending().is_some());

    let outcome = page.continue_second_factor().await?;
    let LoginOutcome::Authenticated(principal) = outcome else {
        anyhow::bail!("expected an authenticated outcome, got {outcome:?}");
    };
    assert_eq!(principal.risk_level, RiskLevel::Medium);
    assert!(harness.app.session.is_authenticated());
    assert_eq!(harness.stored()?.as_deref(), Some("abc.def.ghi"));

    // The continuation is single use.
    let err = page.continue_second_factor().await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    Ok(())
}

#[tokio::test]
async fn blocked_login_surfaces_message_and_leaves_store_untouched() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let harness = Harness::with_store(MemoryCredentialStore::new()).await?;
    mount_login(
        &harness.server,
        403,
        json!({
            "decision": "BLOCKED",
            "email": "user1@company.com",
            "role": "USER",
            "riskLevel": "HIGH",
            "trustScore": 21.0,
            "message": "Account locked",
            "mfaRequired": false,
            "accountLocked": true
        }),
    )
    .await;

    harness.app.session.bootstrap().await;
    let mut page = harness.app.login_page();
    let outcome = page
        .submit("user1@company.com", &secret("Password123!"))
        .await?;

    assert_eq!(outcome, LoginOutcome::Denied("Account locked".to_string()));
    assert_eq!(page.error(), Some("Account locked"));
    assert_eq!(harness.app.session.state(), SessionState::Unauthenticated);
    assert!(harness.stored()?.is_none());
    assert_eq!(harness.app.navigator.current(), Route::Login);
    Ok(())
}

#[tokio::test]
async fn denied_decision_never_touches_an_existing_credential() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let harness =
        Harness::with_store(MemoryCredentialStore::with_credential(secret("previous"))).await?;
    mount_login(
        &harness.server,
        401,
        json!({ "decision": "BLOCKED", "message": "Risk too high" }),
    )
    .await;

    let handler = zerotrust::features::auth::LoginDecisionHandler::new(
        Arc::clone(harness.app.session.gateway()),
        Duration::from_secs(300),
    );
    let decision = handler
        .submit("user1@company.com", &secret("Password123!"))
        .await?;

    ensure!(
        matches!(decision, LoginDecision::Denied { ref reason, .. } if reason == "Risk too high"),
        "unexpected decision: {decision:?}"
    );
    assert_eq!(harness.stored()?.as_deref(), Some("previous"));
    assert_eq!(harness.app.session.state(), SessionState::Uninitialized);
    Ok(())
}

#[tokio::test]
async fn unauthorized_mid_session_logs_out_and_returns_to_login() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let harness =
        Harness::with_store(MemoryCredentialStore::with_credential(secret("stored"))).await?;
    mount_status(&harness.server, "stored", status_body("ADMIN", "LOW", 90.0)).await;
    Mock::given(method("GET"))
        .and(path("/api/risk-history/6f1c2f55-8d5e-4d8e-9d43-0c1d5b7a3e11"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "Not authenticated",
            "message": "Please login again"
        })))
        .mount(&harness.server)
        .await;

    assert!(harness.app.session.bootstrap().await.is_authenticated());
    assert_eq!(harness.app.navigator.open("/admin"), View::Showing(Route::Admin));

    let err = zerotrust::features::auth::client::risk_history(
        harness.app.session.gateway(),
        "6f1c2f55-8d5e-4d8e-9d43-0c1d5b7a3e11",
    )
    .await
    .unwrap_err();

    assert_eq!(err, AppError::Unauthorized("Please login again".to_string()));
    assert_eq!(harness.app.session.state(), SessionState::Unauthenticated);
    assert!(harness.stored()?.is_none());
    assert_eq!(harness.app.navigator.current(), Route::Login);
    Ok(())
}

#[tokio::test]
async fn bootstrap_with_rejected_credential_does_not_retry() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let harness =
        Harness::with_store(MemoryCredentialStore::with_credential(secret("expired"))).await?;
    Mock::given(method("GET"))
        .and(path("/api/auth/user-status"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&harness.server)
        .await;

    assert_eq!(
        harness.app.session.bootstrap().await,
        SessionState::Unauthenticated
    );
    assert_eq!(
        harness.app.session.bootstrap().await,
        SessionState::Unauthenticated
    );
    assert!(harness.stored()?.is_none());
    assert_eq!(
        harness.app.navigator.open("/user-status"),
        View::Showing(Route::Login)
    );
    Ok(())
}

#[tokio::test]
async fn logout_succeeds_locally_when_server_is_down() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let harness =
        Harness::with_store(MemoryCredentialStore::with_credential(secret("stored"))).await?;
    mount_status(&harness.server, "stored", status_body("USER", "LOW", 82.0)).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&harness.server)
        .await;

    assert!(harness.app.session.bootstrap().await.is_authenticated());
    harness.app.session.logout().await;

    assert_eq!(harness.app.session.state(), SessionState::Unauthenticated);
    assert!(harness.stored()?.is_none());
    Ok(())
}

#[tokio::test]
async fn admin_gate_demotes_authenticated_user() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let harness =
        Harness::with_store(MemoryCredentialStore::with_credential(secret("stored"))).await?;
    mount_status(&harness.server, "stored", status_body("USER", "LOW", 82.0)).await;

    let state = harness.app.session.bootstrap().await;
    assert_eq!(
        Gate::RequireRole(Role::Admin).evaluate(&state),
        GateOutcome::Redirect(Route::UserStatus)
    );
    assert_eq!(
        harness.app.navigator.open("/admin"),
        View::Showing(Route::UserStatus)
    );
    Ok(())
}

#[tokio::test]
async fn unreachable_server_is_a_retryable_error_not_a_denial() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let store = Arc::new(MemoryCredentialStore::with_credential(secret("previous")));
    let app = offline_app(&store)?;
    let handler = LoginDecisionHandler::new(
        Arc::clone(app.session.gateway()),
        Duration::from_secs(300),
    );

    let result = handler
        .submit("user1@company.com", &secret("Password123!"))
        .await;

    let Err(err) = result else {
        anyhow::bail!("expected a transport error, got {result:?}");
    };
    ensure!(
        matches!(err, AppError::Network(_) | AppError::Timeout(_)),
        "unexpected error: {err:?}"
    );
    assert!(err.is_retryable());
    assert_eq!(
        store.load()?.map(|c| c.expose_secret().to_string()).as_deref(),
        Some("previous")
    );
    assert_eq!(app.session.state(), SessionState::Uninitialized);
    Ok(())
}

#[tokio::test]
async fn login_page_shows_retry_message_when_server_is_unreachable() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let store = Arc::new(MemoryCredentialStore::new());
    let app = offline_app(&store)?;
    assert_eq!(app.session.bootstrap().await, SessionState::Unauthenticated);

    let mut page = app.login_page();
    let result = page
        .submit("user1@company.com", &secret("Password123!"))
        .await;

    ensure!(
        matches!(result, Err(AppError::Network(_) | AppError::Timeout(_))),
        "unexpected result: {result:?}"
    );
    assert_eq!(
        page.error(),
        Some("Unable to reach the server. Please try again.")
    );
    assert!(page.pending().is_none());
    assert_eq!(app.session.state(), SessionState::Unauthenticated);
    assert!(store.load()?.is_none());
    assert_eq!(app.navigator.current(), Route::Login);
    Ok(())
}

#[tokio::test]
async fn unauthorized_while_on_login_does_not_renavigate() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let harness = Harness::start().await?;
    Mock::given(method("GET"))
        .and(path("/api/risk-history/6f1c2f55-8d5e-4d8e-9d43-0c1d5b7a3e11"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Please login again"
        })))
        .mount(&harness.server)
        .await;

    assert_eq!(
        harness.app.session.bootstrap().await,
        SessionState::Unauthenticated
    );
    assert_eq!(harness.app.navigator.current(), Route::Login);

    let events = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&events);
    harness.app.session.gateway().on_unauthorized(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    });
    let route = harness.app.navigator.subscribe();
    assert!(!route.has_changed()?);

    let err = zerotrust::features::auth::client::risk_history(
        harness.app.session.gateway(),
        "6f1c2f55-8d5e-4d8e-9d43-0c1d5b7a3e11",
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::Unauthorized(_)));
    assert_eq!(events.load(Ordering::SeqCst), 1);
    assert!(!route.has_changed()?);
    assert_eq!(*route.borrow(), Route::Login);
    assert_eq!(harness.app.session.state(), SessionState::Unauthenticated);
    Ok(())
}
