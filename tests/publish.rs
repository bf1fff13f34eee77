//! Protocol tests for the WeChat publish component against a mock server.
//!
//! WeChat reports failure inside HTTP 200 bodies, so every operation is
//! exercised both ways: expected field present (success) and `errmsg` body
//! with the field absent (protocol-level error).

use pdf2draft::{ArticleSource, DocumentStore, Pdf2DraftError, PublishConfig, Publisher};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ──────────────────────────────────────────────────────────────

fn config_for(server: &MockServer) -> PublishConfig {
    PublishConfig::builder()
        .app_id("test_appid")
        .app_secret("test_appsecret")
        .api_base(server.uri())
        .upload_delay_secs(0..=0)
        .build()
        .expect("valid test config")
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/cgi-bin/token"))
        .and(query_param("grant_type", "client_credential"))
        .and(query_param("appid", "test_appid"))
        .and(query_param("secret", "test_appsecret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "MOCK_TOKEN",
            "expires_in": 7200
        })))
        .mount(server)
        .await;
}

fn write_file(dir: &Path, name: &str) -> std::path::PathBuf {
    let p = dir.join(name);
    std::fs::write(&p, b"fake image bytes").unwrap();
    p
}

// ── Authenticate ─────────────────────────────────────────────────────────

#[tokio::test]
async fn connect_acquires_token() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    let publisher = Publisher::connect(&config_for(&server)).await;
    assert!(publisher.is_ok());
}

#[tokio::test]
async fn connect_fails_on_errmsg_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errcode": 40013,
            "errmsg": "invalid appid"
        })))
        .mount(&server)
        .await;

    let err = Publisher::connect(&config_for(&server)).await.unwrap_err();
    assert!(matches!(err, Pdf2DraftError::Auth(_)));
    assert!(err.to_string().contains("invalid appid"));
}

#[tokio::test]
async fn connect_fails_on_empty_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cgi-bin/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "access_token": "", "expires_in": 7200 })),
        )
        .mount(&server)
        .await;

    let err = Publisher::connect(&config_for(&server)).await.unwrap_err();
    assert!(matches!(err, Pdf2DraftError::Auth(_)));
}

// ── Persistent upload (material endpoint) ────────────────────────────────

#[tokio::test]
async fn upload_material_returns_media_id() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path("/cgi-bin/material/add_material"))
        .and(query_param("access_token", "MOCK_TOKEN"))
        .and(query_param("type", "image"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "media_id": "MEDIA_42" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let cover = write_file(tmp.path(), "cover.jpg");

    let publisher = Publisher::connect(&config_for(&server)).await.unwrap();
    let media_id = publisher.upload_material(&cover).await.unwrap();
    assert_eq!(media_id.0, "MEDIA_42");
}

#[tokio::test]
async fn upload_material_errmsg_without_media_id_is_upload_error() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path("/cgi-bin/material/add_material"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errcode": 40004,
            "errmsg": "invalid media type"
        })))
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let cover = write_file(tmp.path(), "cover.jpg");

    let publisher = Publisher::connect(&config_for(&server)).await.unwrap();
    let err = publisher.upload_material(&cover).await.unwrap_err();
    assert!(matches!(err, Pdf2DraftError::Upload { .. }));
    assert!(err.to_string().contains("invalid media type"));
}

// ── Transient upload (temp-image endpoint) ───────────────────────────────

#[tokio::test]
async fn upload_temp_image_returns_url() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path("/cgi-bin/media/uploadimg"))
        .and(query_param("access_token", "MOCK_TOKEN"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            serde_json::json!({ "url": "http://mmbiz.example/page" }),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let page = write_file(tmp.path(), "doc_page_1.png");

    let publisher = Publisher::connect(&config_for(&server)).await.unwrap();
    let url = publisher.upload_temp_image(&page).await.unwrap();
    assert_eq!(url.0, "http://mmbiz.example/page");
}

#[tokio::test]
async fn upload_temp_image_errmsg_without_url_is_upload_error() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path("/cgi-bin/media/uploadimg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errmsg": "media size out of limit"
        })))
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let page = write_file(tmp.path(), "doc_page_1.png");

    let publisher = Publisher::connect(&config_for(&server)).await.unwrap();
    let err = publisher.upload_temp_image(&page).await.unwrap_err();
    assert!(err.to_string().contains("media size out of limit"));
}

// ── Draft submission ─────────────────────────────────────────────────────

#[tokio::test]
async fn create_draft_errmsg_without_media_id_is_publish_error() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path("/cgi-bin/draft/add"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errcode": 45110,
            "errmsg": "article count exceeds limit"
        })))
        .mount(&server)
        .await;

    let publisher = Publisher::connect(&config_for(&server)).await.unwrap();
    let err = publisher.create_draft(&[]).await.unwrap_err();
    assert!(matches!(err, Pdf2DraftError::Publish(_)));
    assert!(err.to_string().contains("article count exceeds limit"));
}

#[tokio::test]
async fn create_draft_transport_error_propagates() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path("/cgi-bin/draft/add"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let publisher = Publisher::connect(&config_for(&server)).await.unwrap();
    let err = publisher.create_draft(&[]).await.unwrap_err();
    assert!(matches!(err, Pdf2DraftError::Publish(_)));
}

// ── Composed create_article ──────────────────────────────────────────────

/// N page images → exactly 1 cover upload + N transient uploads + 1 draft
/// submission, with the N image references in page order in the body.
#[tokio::test]
async fn create_article_issues_expected_calls_in_page_order() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/material/add_material"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "media_id": "COVER_ID" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    // One mock per page file: the multipart body carries the filename, so
    // each upload can be answered with a distinguishable URL.
    for n in 1..=3 {
        Mock::given(method("POST"))
            .and(path("/cgi-bin/media/uploadimg"))
            .and(body_string_contains(format!("deck_page_{n}.png")))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({ "url": format!("http://mmbiz.example/p{n}") }),
            ))
            .expect(1)
            .mount(&server)
            .await;
    }

    Mock::given(method("POST"))
        .and(path("/cgi-bin/draft/add"))
        .and(query_param("access_token", "MOCK_TOKEN"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "media_id": "DRAFT_ID" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let store = DocumentStore::new(tmp.path().join("in"), tmp.path().join("out")).unwrap();
    let workspace = store.ensure_workspace("deck").unwrap();
    // written out of order on purpose; the filename sort restores page order
    write_file(&workspace, "deck_page_3.png");
    write_file(&workspace, "deck_page_1.png");
    write_file(&workspace, "deck_page_2.png");
    let cover = write_file(tmp.path(), "cover.jpg");

    let publisher = Publisher::connect(&config_for(&server)).await.unwrap();
    let sources = [ArticleSource {
        title: "deck".into(),
        workspace,
    }];
    let draft_id = publisher
        .create_article(&store, &sources, &cover)
        .await
        .unwrap();
    assert_eq!(draft_id.0, "DRAFT_ID");

    // Inspect the submitted draft payload.
    let requests = server.received_requests().await.unwrap();
    let draft_request = requests
        .iter()
        .find(|r| r.url.path() == "/cgi-bin/draft/add")
        .expect("draft request was made");
    let payload: serde_json::Value = serde_json::from_slice(&draft_request.body).unwrap();

    let articles = payload["articles"].as_array().unwrap();
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0]["title"], "deck");
    assert_eq!(articles[0]["thumb_media_id"], "COVER_ID");
    assert_eq!(articles[0]["need_open_comment"], 1);
    assert_eq!(articles[0]["only_fans_can_comment"], 0);
    assert_eq!(
        articles[0]["content"],
        "<img src=\"http://mmbiz.example/p1\" />\
         <img src=\"http://mmbiz.example/p2\" />\
         <img src=\"http://mmbiz.example/p3\" />"
    );
}

/// A failed page upload aborts article assembly before any draft submission,
/// so no draft ever references an image whose upload did not complete.
#[tokio::test]
async fn create_article_stops_on_failed_page_upload() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/material/add_material"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "media_id": "COVER_ID" })),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/media/uploadimg"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "errmsg": "upload refused" })),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/cgi-bin/draft/add"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "media_id": "DRAFT_ID" })),
        )
        .expect(0)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let store = DocumentStore::new(tmp.path().join("in"), tmp.path().join("out")).unwrap();
    let workspace = store.ensure_workspace("deck").unwrap();
    write_file(&workspace, "deck_page_1.png");
    let cover = write_file(tmp.path(), "cover.jpg");

    let publisher = Publisher::connect(&config_for(&server)).await.unwrap();
    let sources = [ArticleSource {
        title: "deck".into(),
        workspace,
    }];
    let err = publisher
        .create_article(&store, &sources, &cover)
        .await
        .unwrap_err();
    assert!(matches!(err, Pdf2DraftError::Upload { .. }));
}
