use std::net::TcpListener;
use std::path::{Path, PathBuf};

use guildhall_config::AppConfig;
use guildhall_db::{Database, SqlValue, SqliteDatabase};
use guildhall_gateway::GatewayServer;
use serde_json::Value;

const PENDING_UUID: &str = "0b7d5b4e-2f7a-4a8c-9a1e-5c3f0a9d2e11";
const ADMIN_TOKEN: &str = "test-admin-token";

/// Pick a random available port.
fn random_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind to random port");
    listener.local_addr().unwrap().port()
}

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

/// Config with a fresh database file and the bundled install script as the
/// only update step.
fn test_config(port: u16, db_path: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.gateway.host = "127.0.0.1".to_string();
    config.gateway.port = port;
    config.database.path = db_path.to_path_buf();
    config.installation.root_dir = workspace_root();
    config.installation.update_scripts = vec!["db.sql".to_string()];
    config.gateway.admin_token = Some(ADMIN_TOKEN.to_string());
    config
}

/// Start the gateway in the background and return its base address.
async fn start_test_gateway(config: AppConfig) -> String {
    let port = config.gateway.port;
    tokio::spawn(async move {
        let server = GatewayServer::new(config);
        let _ = server.run().await;
    });

    // Wait for the server to be ready
    for _ in 0..50 {
        if TcpListener::bind(format!("127.0.0.1:{port}")).is_err() {
            break; // port is in use = server is up
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }

    format!("http://127.0.0.1:{port}")
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

async fn install(base: &str) {
    let resp = client()
        .post(format!("{base}/adm_program/installation/update"))
        .bearer_auth(ADMIN_TOKEN)
        .send()
        .await
        .expect("update request failed");
    assert_eq!(resp.status(), 200);
}

fn add_pending_user(db_path: &Path) {
    let db = SqliteDatabase::open(db_path, "adm").unwrap();
    db.query_prepared(
        "INSERT INTO adm_users (usr_id, usr_uuid, usr_login_name, usr_valid) VALUES (50, ?1, 'jdoe', 0)",
        &[SqlValue::Text(PENDING_UUID.into())],
    )
    .unwrap();
    db.query_prepared(
        "INSERT INTO adm_user_data (usd_usr_id, usd_usf_id, usd_value)
         SELECT 50, usf_id, CASE usf_name_intern
                WHEN 'LAST_NAME' THEN 'Doe'
                WHEN 'FIRST_NAME' THEN 'Jane'
                ELSE 'jane@example.org' END
           FROM adm_user_fields",
        &[],
    )
    .unwrap();
    db.query_prepared(
        "INSERT INTO adm_registrations (reg_org_id, reg_usr_id, reg_timestamp)
         VALUES (1, 50, '2024-01-31 09:15:00')",
        &[],
    )
    .unwrap();
}

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let dir = tempfile::tempdir().unwrap();
    let port = random_port();
    let base = start_test_gateway(test_config(port, &dir.path().join("gh.db"))).await;

    let resp = reqwest::get(format!("{base}/health"))
        .await
        .expect("health request failed");
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn update_reports_scripts_and_base_url() {
    let dir = tempfile::tempdir().unwrap();
    let port = random_port();
    let base = start_test_gateway(test_config(port, &dir.path().join("gh.db"))).await;

    let resp = client()
        .post(format!("{base}/adm_program/installation/update"))
        .header("x-forwarded-host", "members.example.org")
        .bearer_auth(ADMIN_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["base_url"], "http://members.example.org");
    assert_eq!(body["report"]["scripts"][0]["file"], "db.sql");
}

#[tokio::test]
async fn update_with_missing_script_returns_localized_message() {
    let dir = tempfile::tempdir().unwrap();
    let port = random_port();
    let mut config = test_config(port, &dir.path().join("gh.db"));
    config.installation.update_scripts = vec!["upd_missing.sql".to_string()];
    let base = start_test_gateway(config).await;

    let resp = client()
        .post(format!("{base}/adm_program/installation/update"))
        .bearer_auth(ADMIN_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("<strong>upd_missing.sql</strong> could not be found"));
}

#[tokio::test]
async fn base_url_endpoint_uses_host_header() {
    let dir = tempfile::tempdir().unwrap();
    let port = random_port();
    let base = start_test_gateway(test_config(port, &dir.path().join("gh.db"))).await;

    let body: Value = client()
        .get(format!("{base}/adm_program/installation/base-url"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["base_url"], format!("http://127.0.0.1:{port}"));
}

#[tokio::test]
async fn empty_registration_list_redirects_home() {
    let dir = tempfile::tempdir().unwrap();
    let port = random_port();
    let base = start_test_gateway(test_config(port, &dir.path().join("gh.db"))).await;
    install(&base).await;

    let resp = client()
        .get(format!("{base}/adm_program/modules/registration"))
        .bearer_auth(ADMIN_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(
        resp.headers()["location"],
        format!("http://127.0.0.1:{port}/adm_program/overview").as_str()
    );
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["type"], "empty");
    assert_eq!(body["message"], "There are no new registrations.");
}

#[tokio::test]
async fn pending_registration_is_listed_and_can_be_approved() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("gh.db");
    let port = random_port();
    let base = start_test_gateway(test_config(port, &db_path)).await;
    install(&base).await;
    add_pending_user(&db_path);

    let resp = client()
        .get(format!("{base}/adm_program/modules/registration"))
        .bearer_auth(ADMIN_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["type"], "cards");
    let card = &body["cards"][0];
    assert_eq!(card["title"], "Jane Doe");
    assert_eq!(card["information"][0], "Registered on 31.01.2024 at 09:15");
    assert_eq!(card["information"][1], "Username: jdoe");

    let resp = client()
        .post(format!(
            "{base}/adm_program/modules/registration/{PENDING_UUID}/assign"
        ))
        .bearer_auth(ADMIN_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // approved twice is no longer pending
    let resp = client()
        .post(format!(
            "{base}/adm_program/modules/registration/{PENDING_UUID}/assign"
        ))
        .bearer_auth(ADMIN_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = client()
        .get(format!("{base}/adm_program/modules/registration"))
        .bearer_auth(ADMIN_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 303);
}

#[tokio::test]
async fn malformed_uuid_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let port = random_port();
    let base = start_test_gateway(test_config(port, &dir.path().join("gh.db"))).await;

    let resp = client()
        .delete(format!("{base}/adm_program/modules/registration/not-a-uuid"))
        .bearer_auth(ADMIN_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn admin_endpoints_reject_anonymous_requests() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("gh.db");
    let port = random_port();
    let base = start_test_gateway(test_config(port, &db_path)).await;
    install(&base).await;
    add_pending_user(&db_path);

    let client = client();
    let requests = [
        client.get(format!("{base}/adm_program/modules/registration")),
        client.post(format!(
            "{base}/adm_program/modules/registration/{PENDING_UUID}/assign"
        )),
        client.delete(format!(
            "{base}/adm_program/modules/registration/{PENDING_UUID}"
        )),
        client.post(format!("{base}/adm_program/installation/update")),
    ];
    for request in requests {
        let resp = request.send().await.unwrap();
        assert_eq!(resp.status(), 401);
        assert_eq!(resp.headers()["www-authenticate"], "Bearer");
    }

    // a wrong token is no better than none
    let resp = client
        .get(format!("{base}/adm_program/modules/registration"))
        .bearer_auth("not-the-token")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // nothing was approved or deleted along the way
    let resp = client
        .get(format!("{base}/adm_program/modules/registration"))
        .bearer_auth(ADMIN_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["cards"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn admin_endpoints_closed_without_configured_token() {
    let dir = tempfile::tempdir().unwrap();
    let port = random_port();
    let mut config = test_config(port, &dir.path().join("gh.db"));
    config.gateway.admin_token = None;
    let base = start_test_gateway(config).await;

    let resp = client()
        .post(format!("{base}/adm_program/installation/update"))
        .bearer_auth(ADMIN_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // public endpoints stay open
    let resp = client().get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let resp = client()
        .get(format!("{base}/adm_program/installation/base-url"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}
