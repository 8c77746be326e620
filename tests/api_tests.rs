mod common;

use actix_web::dev::ServiceResponse;
use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use biodata_maker::biodata::{routes, DRAFT_SESSION_HEADER};
use biodata_maker::draft::DRAFT_FILE;
use biodata_maker::photo::encode_data_uri;
use serde_json::{json, Value};

use common::{bearer, complete_record, legacy_record, png, test_context};

macro_rules! app {
    ($ctx:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($ctx.state.clone()))
                .service(web::scope("/api").configure(routes::config))
                .configure(routes::images),
        )
        .await
    };
}

fn session_id(resp: &ServiceResponse) -> String {
    resp.headers()
        .get(DRAFT_SESSION_HEADER)
        .expect("anonymous draft responses carry a session id")
        .to_str()
        .unwrap()
        .to_string()
}

#[actix_web::test]
async fn test_templates_are_listed_in_order() {
    let ctx = test_context();
    let app = app!(ctx);

    let req = test::TestRequest::get().uri("/api/templates").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["template-1", "template-2", "template-3", "template-4"]);
}

#[actix_web::test]
async fn test_preview_renders_requested_template() {
    let ctx = test_context();
    let app = app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/preview?template=template-4")
        .set_json(complete_record())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();

    assert!(html.contains(r#"id="biodata-preview""#));
    assert!(html.contains("plain"));
    assert!(html.contains("राम पाटील"));
}

#[actix_web::test]
async fn test_preview_of_legacy_record_uses_legacy_values() {
    let ctx = test_context();
    let app = app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/preview")
        .set_json(legacy_record())
        .to_request();
    let html = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();

    assert!(html.contains("|| श्री गणेश ||"));
    assert!(html.contains("राम पाटील"));
    assert!(html.contains("2 (विवाहित: 1)"));
    assert!(html.contains("9876543210"));
}

#[actix_web::test]
async fn test_resolve_reports_value_and_generation() {
    let ctx = test_context();
    let app = app!(ctx);

    let record = json!({
        "personalInfo": { "name": "राम" },
        "personalDetails": { "fullName": "Ram" }
    });
    let req = test::TestRequest::post()
        .uri("/api/resolve/name")
        .set_json(&record)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["text"], "राम");
    assert_eq!(body["generation"], "new");
    assert_eq!(body["placeholder"], false);

    let req = test::TestRequest::post()
        .uri("/api/resolve/bloodGroup")
        .set_json(&record)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["text"].is_null());

    let req = test::TestRequest::post()
        .uri("/api/resolve/mobile")
        .set_json(&record)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["text"], "N/A");
    assert_eq!(body["placeholder"], true);
}

#[actix_web::test]
async fn test_resolve_unknown_field_is_bad_request() {
    let ctx = test_context();
    let app = app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/resolve/shoeSize")
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_print_export_returns_self_printing_page() {
    let ctx = test_context();
    let app = app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/export")
        .set_json(json!({
            "strategy": "print",
            "template": "template-2",
            "record": complete_record()
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();

    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("window.print()"));
    assert!(html.contains("@media print"));
    assert!(html.contains("राम पाटील"));
}

#[actix_web::test]
async fn test_raster_export_without_capture_is_rejected() {
    let ctx = test_context();
    let app = app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/export")
        .set_json(json!({ "strategy": "raster", "record": complete_record() }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_raster_export_rejects_capture_below_supersample() {
    let ctx = test_context();
    let app = app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/export")
        .set_json(json!({
            "strategy": "raster",
            "record": complete_record(),
            "captures": [{
                "dataUri": encode_data_uri("image/png", &png(40, 60)),
                "scale": 1
            }]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["message"].as_str().unwrap().contains("2x required"));
}

#[actix_web::test]
async fn test_crop_defaults_to_centred_portrait() {
    let ctx = test_context();
    let app = app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/photo/crop")
        .set_json(json!({ "dataUri": encode_data_uri("image/png", &png(400, 400)) }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["area"], json!({ "x": 50, "y": 0, "width": 300, "height": 400 }));
    assert!(body["dataUri"].as_str().unwrap().starts_with("data:image/jpeg;base64,"));
}

#[actix_web::test]
async fn test_crop_outside_image_is_rejected() {
    let ctx = test_context();
    let app = app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/photo/crop")
        .set_json(json!({
            "dataUri": encode_data_uri("image/png", &png(100, 100)),
            "area": { "x": 50, "y": 50, "width": 90, "height": 90 }
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_draft_patch_and_wizard_steps() {
    let ctx = test_context();
    let app = app!(ctx);
    let session = (DRAFT_SESSION_HEADER, "tab-0001");

    let req = test::TestRequest::patch()
        .uri("/api/draft")
        .insert_header(session)
        .set_json(json!({ "personalInfo": { "name": "राम" } }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["record"]["personalInfo"]["name"], "राम");
    assert_eq!(body["step"], 0);

    // Nothing is required on the deity step.
    let req = test::TestRequest::put()
        .uri("/api/draft/step")
        .insert_header(session)
        .set_json(json!({ "step": 1 }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["step"], 1);
    assert_eq!(body["stepName"], "personal");

    // The personal step is incomplete.
    let req = test::TestRequest::put()
        .uri("/api/draft/step")
        .insert_header(session)
        .set_json(json!({ "step": 2 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let report: Value = test::read_body_json(resp).await;
    assert_eq!(report["valid"], false);
    assert!(report["errors"]
        .as_array()
        .unwrap()
        .iter()
        .any(|e| e["field"] == "personalInfo.dateOfBirth"));

    let req = test::TestRequest::put()
        .uri("/api/draft/step")
        .insert_header(session)
        .set_json(json!({ "step": 9 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::delete()
        .uri("/api/draft")
        .insert_header(session)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["step"], 0);
    assert!(body["record"]["personalInfo"].is_null());
}

#[actix_web::test]
async fn test_draft_sessions_do_not_leak() {
    let ctx = test_context();
    let app = app!(ctx);

    let req = test::TestRequest::patch()
        .uri("/api/draft")
        .insert_header((DRAFT_SESSION_HEADER, "first-tab"))
        .set_json(json!({ "aboutMe": "पहिला" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let req = test::TestRequest::get()
        .uri("/api/draft")
        .insert_header((DRAFT_SESSION_HEADER, "second-tab"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["record"]["aboutMe"].is_null());
}

#[actix_web::test]
async fn test_malformed_patch_leaves_draft_untouched() {
    let ctx = test_context();
    let app = app!(ctx);

    let req = test::TestRequest::patch()
        .uri("/api/draft")
        .set_json(json!({ "aboutMe": "ठेवा" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let session = (DRAFT_SESSION_HEADER, session_id(&resp));

    let req = test::TestRequest::patch()
        .uri("/api/draft")
        .insert_header(session.clone())
        .set_json(json!({ "personalInfo": "not an object" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/draft")
        .insert_header(session)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["record"]["aboutMe"], "ठेवा");
}

#[actix_web::test]
async fn test_auth_state_reports_local_only_mode() {
    let ctx = test_context();
    let app = app!(ctx);

    let req = test::TestRequest::get().uri("/api/auth/me").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "unauthenticated");

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header(bearer("u1"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "authenticated");
    assert_eq!(body["user"]["uid"], "u1");
}

#[actix_web::test]
async fn test_saved_biodata_require_sign_in() {
    let ctx = test_context();
    let app = app!(ctx);

    let req = test::TestRequest::get().uri("/api/biodata").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

#[actix_web::test]
async fn test_saved_biodata_are_private_to_their_owner() {
    let ctx = test_context();
    let app = app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/biodata")
        .insert_header(bearer("owner"))
        .set_json(complete_record())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri(&format!("/api/biodata/{}", id))
        .insert_header(bearer("someone-else"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/biodata/{}", id))
        .insert_header(bearer("someone-else"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri(&format!("/api/biodata/{}", id))
        .insert_header(bearer("owner"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["userId"], "owner");
    assert_eq!(body["data"]["personalInfo"]["name"], "राम पाटील");

    let req = test::TestRequest::get()
        .uri("/api/biodata")
        .insert_header(bearer("owner"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let req = test::TestRequest::get()
        .uri("/api/biodata/does-not-exist")
        .insert_header(bearer("owner"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_draft_save_validates_then_stamps_id() {
    let ctx = test_context();
    let app = app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/draft/save")
        .insert_header(bearer("writer"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let req = test::TestRequest::put()
        .uri("/api/draft")
        .insert_header(bearer("writer"))
        .set_json(complete_record())
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/api/draft/save")
        .insert_header(bearer("writer"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/api/draft")
        .insert_header(bearer("writer"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["record"]["id"], id.as_str());
}

#[actix_web::test]
async fn test_draft_save_needs_an_account() {
    let ctx = test_context();
    let app = app!(ctx);

    let req = test::TestRequest::post().uri("/api/draft/save").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_photo_upload_links_the_record() {
    let ctx = test_context();
    let app = app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/biodata")
        .insert_header(bearer("owner"))
        .set_json(complete_record())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let boundary = "biodata-boundary";
    let mut payload = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"me.png\"\r\nContent-Type: image/png\r\n\r\n"
    )
    .into_bytes();
    payload.extend_from_slice(&png(30, 40));
    payload.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let req = test::TestRequest::post()
        .uri(&format!("/api/biodata/{}/photo", id))
        .insert_header(bearer("owner"))
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        ))
        .set_payload(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let url = body["data"]["url"].as_str().unwrap().to_string();
    assert!(ctx.images.has_url(&url).await);

    let req = test::TestRequest::get()
        .uri(&format!("/api/biodata/{}", id))
        .insert_header(bearer("owner"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["photoUrl"], url.as_str());
}

#[actix_web::test]
async fn test_local_images_are_served() {
    let ctx = test_context();
    let folder = ctx.dir.path().join("images").join("biodata-photos");
    std::fs::create_dir_all(&folder).unwrap();
    std::fs::write(folder.join("abc.png"), png(10, 10)).unwrap();
    let app = app!(ctx);

    let req = test::TestRequest::get()
        .uri("/images/biodata-photos/abc.png")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/png"
    );

    let req = test::TestRequest::get()
        .uri("/images/biodata-photos/missing.png")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_headerless_visitors_get_separate_drafts() {
    let ctx = test_context();
    let app = app!(ctx);

    let req = test::TestRequest::patch()
        .uri("/api/draft")
        .set_json(json!({
            "personalInfo": { "name": "गुप्त व्यक्ती" },
            "contact": { "mobileNumber": "9876543210" }
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let first = session_id(&resp);

    let req = test::TestRequest::get().uri("/api/draft").to_request();
    let resp = test::call_service(&app, req).await;
    let second = session_id(&resp);
    assert_ne!(first, second);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["record"]["personalInfo"].is_null());
    assert!(body["record"]["contact"].is_null());

    let req = test::TestRequest::get()
        .uri("/api/draft")
        .insert_header((DRAFT_SESSION_HEADER, first.as_str()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(session_id(&resp), first);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["record"]["personalInfo"]["name"], "गुप्त व्यक्ती");
}

#[actix_web::test]
async fn test_malformed_session_id_is_rejected() {
    let ctx = test_context();
    let app = app!(ctx);

    for id in ["short", "../../../etc/passwd", "has space in it"] {
        let req = test::TestRequest::get()
            .uri("/api/draft")
            .insert_header((DRAFT_SESSION_HEADER, id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", id);
    }
}

#[actix_web::test]
async fn test_signed_in_drafts_ignore_the_session_header() {
    let ctx = test_context();
    let app = app!(ctx);

    let req = test::TestRequest::patch()
        .uri("/api/draft")
        .insert_header(bearer("member"))
        .set_json(json!({ "aboutMe": "खाते" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.headers().get(DRAFT_SESSION_HEADER).is_none());

    let req = test::TestRequest::get()
        .uri("/api/draft")
        .insert_header(bearer("member"))
        .insert_header((DRAFT_SESSION_HEADER, "other-tab-id"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["record"]["aboutMe"], "खाते");
}

#[actix_web::test]
async fn test_large_embedded_photo_is_accepted() {
    let ctx = test_context();
    let app = app!(ctx);

    // Over actix's 2 MiB default, well under a 10 MiB photo once encoded.
    let photo = encode_data_uri("image/jpeg", &vec![0xAB; 3 * 1024 * 1024]);
    let mut record = complete_record();
    record["photoUrl"] = json!(photo);

    let req = test::TestRequest::post()
        .uri("/api/preview?template=template-3")
        .set_json(record)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_preview_accepts_unchosen_family_type() {
    let ctx = test_context();
    let app = app!(ctx);

    let mut record = legacy_record();
    record["familyDetails"]["familyType"] = json!("");

    let req = test::TestRequest::post()
        .uri("/api/preview")
        .set_json(record)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(html.contains("राम पाटील"));
    assert!(!html.contains("संयुक्त"));
}

#[actix_web::test]
async fn test_draft_changes_reach_the_draft_file() {
    let ctx = test_context();
    let app = app!(ctx);
    let file = ctx
        .dir
        .path()
        .join("drafts")
        .join("anon-tab-0002")
        .join(DRAFT_FILE);

    let req = test::TestRequest::patch()
        .uri("/api/draft")
        .insert_header((DRAFT_SESSION_HEADER, "tab-0002"))
        .set_json(json!({ "aboutMe": "जतन" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let saved: Value = serde_json::from_slice(&std::fs::read(&file).unwrap()).unwrap();
    assert_eq!(saved["aboutMe"], "जतन");

    let req = test::TestRequest::delete()
        .uri("/api/draft")
        .insert_header((DRAFT_SESSION_HEADER, "tab-0002"))
        .to_request();
    test::call_service(&app, req).await;
    assert!(!file.exists());
}

#[::core::prelude::v1::test]
fn test_openapi_document_describes_record_bodies() {
    use utoipa::OpenApi;

    let doc = serde_json::to_value(biodata_maker::ApiDoc::openapi()).unwrap();
    let schemas = &doc["components"]["schemas"];
    assert!(schemas["RecordBody"].is_object());
    assert!(schemas["PatchBody"].is_object());
    assert!(doc["paths"]["/api/draft"].is_object());
    assert!(doc["paths"]["/api/export"].is_object());
}
