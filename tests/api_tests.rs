//! HTTP API tests against an in-process service with a temporary template store.

mod common;

use std::sync::Arc;

use actix_web::dev::ServiceResponse;
use actix_web::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use pkl_document_server::config::AppConfig;
use pkl_document_server::template::FsTemplateStore;
use pkl_document_server::{api_config, AppState};
use serde_json::{json, Value};
use tempfile::TempDir;

const BOUNDARY: &str = "----pkl-test-boundary";

async fn test_state() -> (web::Data<AppState>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = FsTemplateStore::open(dir.path()).await.unwrap();
    let config = AppConfig {
        template_dir: dir.path().to_path_buf(),
        ..Default::default()
    };
    (web::Data::new(AppState::with_store(config, Arc::new(store))), dir)
}

fn multipart_upload(filename: &str, content: &[u8], name: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            BOUNDARY, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(b"\r\n");
    if let Some(name) = name {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\n{}\r\n",
                BOUNDARY, name
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(filename: &str, content: &[u8], name: Option<&str>) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/templates")
        .insert_header((
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(multipart_upload(filename, content, name))
}

fn disposition<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(CONTENT_DISPOSITION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data($state.clone())
                .service(web::scope("/api").configure(api_config)),
        )
        .await
    };
}

#[actix_web::test]
async fn test_upload_activate_and_render() {
    let (state, _dir) = test_state().await;
    let app = app!(state);

    let template = common::docx(&format!(
        "{}{}",
        common::paragraph("${KOTA}, ${TANGGAL}"),
        common::paragraph("Kepada Yth. ${NAMAPERUSAHAAN}")
    ));
    let resp = test::call_service(
        &app,
        upload_request("pengantar.docx", &template, Some("Surat Pengantar")).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let meta: Value = test::read_body_json(resp).await;
    assert_eq!(meta["name"], "Surat Pengantar");
    assert_eq!(meta["variables"], json!(["KOTA", "TANGGAL", "NAMAPERUSAHAAN"]));
    let id = meta["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get().uri("/api/templates/active").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::put()
        .uri(&format!("/api/templates/{}/activate", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/api/templates").to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed[0]["active"], true);

    let req = test::TestRequest::post()
        .uri("/api/templates/active/render")
        .set_json(json!({
            "KOTA": "Sidoarjo",
            "TANGGAL": "2024-07-28",
            "NAMAPERUSAHAAN": "PT SO GOOD FOOD"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(disposition(&resp).contains("Surat_Pengantar_PT_SO_GOOD_FOOD.docx"));
    let body = test::read_body(resp).await;
    let text = common::visible_text(&common::document_part(&body));
    assert_eq!(text, "Sidoarjo, 28 Juli 2024Kepada Yth. PT SO GOOD FOOD");
}

#[actix_web::test]
async fn test_upload_rejects_non_word_files() {
    let (state, _dir) = test_state().await;
    let app = app!(state);

    let resp = test::call_service(&app, upload_request("foto.png", b"png", None).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(
        &app,
        upload_request("rusak.docx", b"not a zip archive", None).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get().uri("/api/templates").to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed, json!([]));
}

#[actix_web::test]
async fn test_preview_download_and_delete() {
    let (state, _dir) = test_state().await;
    let app = app!(state);

    let template = common::docx(&common::paragraph("Pimpinan ${NAMAPERUSAHAAN}"));
    let resp = test::call_service(
        &app,
        upload_request("Surat Pengajuan.docx", &template, None).to_request(),
    )
    .await;
    let meta: Value = test::read_body_json(resp).await;
    let id = meta["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri(&format!("/api/templates/{}/preview", id))
        .to_request();
    let html = test::call_and_read_body(&app, req).await;
    assert!(String::from_utf8_lossy(&html).contains("Pimpinan ${NAMAPERUSAHAAN}"));

    let req = test::TestRequest::get()
        .uri(&format!("/api/templates/{}/download", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert_eq!(body.as_ref(), template.as_slice());

    let req = test::TestRequest::delete()
        .uri(&format!("/api/templates/{}", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/templates/{}/preview", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_unknown_template_is_not_found() {
    let (state, _dir) = test_state().await;
    let app = app!(state);
    let missing = uuid::Uuid::new_v4();

    for req in [
        test::TestRequest::get().uri(&format!("/api/templates/{}", missing)),
        test::TestRequest::put().uri(&format!("/api/templates/{}/activate", missing)),
        test::TestRequest::delete().uri(&format!("/api/templates/{}", missing)),
    ] {
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    let req = test::TestRequest::post()
        .uri(&format!("/api/templates/{}/render", missing))
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_variables_catalogue() {
    let (state, _dir) = test_state().await;
    let app = app!(state);

    let req = test::TestRequest::get().uri("/api/templates/variables").to_request();
    let variables: Value = test::call_and_read_body_json(&app, req).await;
    let names: Vec<&str> = variables
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v["name"].as_str())
        .collect();
    assert!(names.contains(&"NAMAPERUSAHAAN"));
    assert!(names.contains(&"SISWA_LIST"));
}

#[actix_web::test]
async fn test_certificate_download() {
    let (state, _dir) = test_state().await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/documents/sertifikat")
        .set_json(json!({
            "nama": "Budi Santoso",
            "nis": "12345",
            "rombel": "XII TKJ 1",
            "nama_perusahaan": "PT. SO GOOD FOOD",
            "periode": "Juli - September 2024",
            "nilai": 80
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(CONTENT_TYPE).unwrap().to_str().unwrap(),
        "application/pdf"
    );
    assert!(disposition(&resp).contains("Sertifikat_Budi_Santoso.pdf"));
    let body = test::read_body(resp).await;
    assert!(body.starts_with(b"%PDF"));
}

#[actix_web::test]
async fn test_invalid_document_requests() {
    let (state, _dir) = test_state().await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/documents/surat-pengajuan")
        .set_json(json!({ "nama_perusahaan": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/documents/laporan")
        .set_json(json!({ "title": "LAPORAN", "columns": [], "rows": [] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_report_presets() {
    let (state, _dir) = test_state().await;
    let app = app!(state);

    let req = test::TestRequest::get().uri("/api/documents/laporan/presets").to_request();
    let presets: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(presets.as_array().unwrap().len(), 3);

    let req = test::TestRequest::post()
        .uri("/api/documents/laporan/presets/monitoring")
        .set_json(json!({
            "rows": [{ "tanggal": "2024-08-01", "nis": "0001", "nama_siswa": "Ani" }]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(disposition(&resp).contains("Laporan_Monitoring_PKL.pdf"));

    let req = test::TestRequest::post()
        .uri("/api/documents/laporan/presets/rekap-kategori")
        .set_json(json!({ "rows": [] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/documents/laporan/presets/tidak-ada")
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
