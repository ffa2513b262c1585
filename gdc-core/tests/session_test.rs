use gdc_core::Sdk;
use gdc_core::config::ConfigStorage;
use gdc_core::error::ApiError;
use gdc_core::paging::fetch_all_pages;
use gdc_core::transport::{LOGIN_PATH, TOKEN_PATH, Transport};
use gdc_core::user::{UserApi, UserError};
use gdc_stub_service::{StubResponse, StubServer};
use serde_json::json;

const BOOTSTRAP_PATH: &str = "/gdc/app/account/bootstrap";

fn transport_for(server: &StubServer) -> Transport {
    let config = ConfigStorage::new();
    config.set_custom_domain(Some(&server.url())).unwrap();
    Transport::new(config).unwrap()
}

fn bootstrap_body() -> String {
    json!({
        "bootstrapResource": {
            "accountSetting": {
                "login": "bear@gooddata.com",
                "firstName": "Sterling",
                "lastName": "Archer",
                "links": { "self": "/gdc/account/profile/user123" },
            },
            "current": { "loginMD5": "d41d8cd98f" },
            "settings": { "organizationName": "ISIS" },
        }
    })
    .to_string()
}

#[tokio::test]
async fn login_posts_the_credentials_payload() {
    let server = StubServer::builder()
        .route(
            LOGIN_PATH,
            [StubResponse::json(
                200,
                r#"{"userLogin":{"state":"/gdc/account/login/user123"}}"#,
            )],
        )
        .spawn()
        .await;
    let user = UserApi::new(transport_for(&server));

    let profile = user.login("bear@gooddata.com", "secret").await.unwrap();

    assert_eq!(
        profile,
        json!({"userLogin": {"state": "/gdc/account/login/user123"}})
    );

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    let sent: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(sent["postUserLogin"]["login"], "bear@gooddata.com");
    assert_eq!(sent["postUserLogin"]["password"], "secret");
    assert_eq!(sent["postUserLogin"]["remember"], 1);
}

#[tokio::test]
async fn login_with_bad_credentials_is_an_application_error() {
    let server = StubServer::builder()
        .route(
            LOGIN_PATH,
            [StubResponse::json(400, r#"{"error":"bad credentials"}"#)],
        )
        .spawn()
        .await;
    let user = UserApi::new(transport_for(&server));

    let error = user.login("bear@gooddata.com", "wrong").await.unwrap_err();

    match error {
        UserError::Api(ApiError::Response { response, .. }) => {
            assert_eq!(response.status().as_u16(), 400);
        }
        other => panic!("Expected an application error, got {other:?}"),
    }
}

#[tokio::test]
async fn is_logged_in_resolves_true_on_a_valid_token() {
    let server = StubServer::builder()
        .route(TOKEN_PATH, [StubResponse::status(200)])
        .spawn()
        .await;
    let user = UserApi::new(transport_for(&server));

    assert!(user.is_logged_in().await.unwrap());
}

#[tokio::test]
async fn is_logged_in_resolves_false_when_the_refresh_is_rejected() {
    let server = StubServer::builder()
        .route(TOKEN_PATH, [StubResponse::status(401), StubResponse::status(401)])
        .spawn()
        .await;
    let user = UserApi::new(transport_for(&server));

    assert!(!user.is_logged_in().await.unwrap());
    // the probing GET plus the rejected refresh
    assert_eq!(server.hits(TOKEN_PATH), 2);
}

#[tokio::test]
async fn logout_deletes_the_current_login() {
    let server = StubServer::builder()
        .route(TOKEN_PATH, [StubResponse::status(200)])
        .route(BOOTSTRAP_PATH, [StubResponse::json(200, &bootstrap_body())])
        .route("/gdc/account/login/user123", [StubResponse::status(200)])
        .spawn()
        .await;
    let user = UserApi::new(transport_for(&server));

    let response = user.logout().await.unwrap();

    assert!(response.is_some());
    let delete = server
        .requests()
        .into_iter()
        .find(|r| r.path == "/gdc/account/login/user123")
        .unwrap();
    assert_eq!(delete.method, "DELETE");
}

#[tokio::test]
async fn logout_is_a_no_op_when_nobody_is_logged_in() {
    let server = StubServer::builder()
        .route(TOKEN_PATH, [StubResponse::status(401)])
        .spawn()
        .await;
    let user = UserApi::new(transport_for(&server));

    assert!(user.logout().await.unwrap().is_none());
    assert_eq!(server.hits(BOOTSTRAP_PATH), 0);
}

#[tokio::test]
async fn current_profile_unwraps_the_account_setting() {
    let server = StubServer::builder()
        .route(
            "/gdc/account/profile/current",
            [StubResponse::json(
                200,
                r#"{"accountSetting":{"login":"bear@gooddata.com"}}"#,
            )],
        )
        .spawn()
        .await;
    let user = UserApi::new(transport_for(&server));

    let profile = user.current_profile().await.unwrap();

    assert_eq!(profile, json!({"login": "bear@gooddata.com"}));
}

#[tokio::test]
async fn account_info_is_projected_from_the_bootstrap_resource() {
    let server = StubServer::builder()
        .route(BOOTSTRAP_PATH, [StubResponse::json(200, &bootstrap_body())])
        .spawn()
        .await;
    let user = UserApi::new(transport_for(&server));

    let info = user.account_info().await.unwrap();

    assert_eq!(info.login, "bear@gooddata.com");
    assert_eq!(info.organization_name, "ISIS");
    assert_eq!(info.profile_uri, "/gdc/account/profile/user123");
}

#[tokio::test]
async fn fetch_all_pages_concatenates_pages_in_order() {
    let page_one = json!({
        "projects": {
            "items": ["alpha", "bravo"],
            "paging": { "totalCount": 150 },
        }
    })
    .to_string();
    let page_two = json!({
        "projects": {
            "items": ["charlie"],
            "paging": { "totalCount": 150 },
        }
    })
    .to_string();

    let server = StubServer::builder()
        .route(
            "/gdc/account/profile/user123/projects",
            [
                StubResponse::json(200, &page_one),
                StubResponse::json(200, &page_two),
            ],
        )
        .spawn()
        .await;
    let transport = transport_for(&server);

    let items = fetch_all_pages(
        &transport,
        "/gdc/account/profile/user123/projects",
        "projects",
    )
    .await
    .unwrap();

    assert_eq!(items, vec![json!("alpha"), json!("bravo"), json!("charlie")]);

    let paths: Vec<_> = server.requests().into_iter().map(|r| r.path).collect();
    assert_eq!(
        paths,
        vec![
            "/gdc/account/profile/user123/projects?offset=0&limit=100",
            "/gdc/account/profile/user123/projects?offset=100&limit=100",
        ]
    );
}

#[tokio::test]
async fn detached_sdks_do_not_share_configuration() {
    let sdk = Sdk::new().unwrap();
    sdk.config()
        .set_custom_domain(Some("https://one.example.com"))
        .unwrap();

    let detached = sdk.detach().unwrap();
    detached
        .config()
        .set_custom_domain(Some("https://two.example.com"))
        .unwrap();

    assert_eq!(
        sdk.config().custom_domain().as_deref(),
        Some("https://one.example.com")
    );
    assert_eq!(
        detached.config().custom_domain().as_deref(),
        Some("https://two.example.com")
    );
}

#[tokio::test]
async fn the_sdk_serves_requests_through_its_transport() {
    let server = StubServer::builder()
        .route(TOKEN_PATH, [StubResponse::json(200, r#"{"a":1}"#)])
        .spawn()
        .await;

    let sdk = Sdk::new().unwrap();
    sdk.config().set_custom_domain(Some(&server.url())).unwrap();

    let response = sdk.xhr().get(TOKEN_PATH, Default::default()).await.unwrap();

    assert_eq!(response.data(), json!({"a": 1}));
}
