/// Integration tests for company-scoped resources and companies

mod common;

use axum::http::StatusCode;
use common::{TestContext, EMAIL, PASSWORD};
use onboardly_shared::models::resource::Collection;
use onboardly_shared::store::DocumentStore;
use serde_json::{json, Value};

#[tokio::test]
async fn test_manager_crud_on_jobs() {
    let ctx = TestContext::new().await;
    let acme = ctx.seed_company("Acme").await;

    let created = ctx
        .request(
            "POST",
            "/api/jobs",
            Some(json!({ "title": "Backend Engineer", "department": "Engineering" })),
            Some(&acme.manager),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["success"], true);
    assert_eq!(created.body["data"]["title"], "Backend Engineer");
    assert_eq!(created.body["data"]["company_id"], json!(acme.id));
    let id = created.body["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/jobs/{}", id);

    let read = ctx.request("GET", &uri, None, Some(&acme.employee)).await;
    assert_eq!(read.status, StatusCode::OK);
    assert_eq!(read.body["data"]["department"], "Engineering");

    let updated = ctx
        .request(
            "PUT",
            &uri,
            Some(json!({ "description": "Rust services" })),
            Some(&acme.manager),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["data"]["title"], "Backend Engineer");
    assert_eq!(updated.body["data"]["description"], "Rust services");

    let deleted = ctx.request("DELETE", &uri, None, Some(&acme.admin)).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["data"]["id"], id);

    let gone = ctx.request("GET", &uri, None, Some(&acme.admin)).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    assert_eq!(gone.body["error"]["code"], "not_found");
    assert_eq!(gone.body["error"]["message"], "Job not found");
}

#[tokio::test]
async fn test_list_is_paginated_and_newest_first() {
    let ctx = TestContext::new().await;
    let acme = ctx.seed_company("Acme").await;

    for question in ["First?", "Second?", "Third?"] {
        let response = ctx
            .request(
                "POST",
                "/api/faqs",
                Some(json!({ "question": question, "answer": "Yes." })),
                Some(&acme.manager),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
    }

    let page = ctx
        .request("GET", "/api/faqs?limit=2", None, Some(&acme.employee))
        .await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.body["data"]["total"], 3);
    assert_eq!(page.body["data"]["limit"], 2);
    let items = page.body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["question"], "Third?");

    let rest = ctx
        .request("GET", "/api/faqs?limit=2&offset=2", None, Some(&acme.employee))
        .await;
    assert_eq!(rest.body["data"]["items"][0]["question"], "First?");

    let bad = ctx
        .request("GET", "/api/faqs?limit=0", None, Some(&acme.employee))
        .await;
    assert_eq!(bad.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(bad.body["error"]["details"][0]["field"], "limit");
}

#[tokio::test]
async fn test_other_company_records_are_not_found() {
    let ctx = TestContext::new().await;
    let acme = ctx.seed_company("Acme").await;
    let globex = ctx.seed_company("Globex").await;

    let created = ctx
        .request(
            "POST",
            "/api/projects",
            Some(json!({ "name": "Launch", "due_date": "2026-12-01" })),
            Some(&acme.manager),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let uri = format!("/api/projects/{}", created.body["data"]["id"].as_str().unwrap());

    let read = ctx.request("GET", &uri, None, Some(&globex.admin)).await;
    assert_eq!(read.status, StatusCode::NOT_FOUND);

    let update = ctx
        .request("PUT", &uri, Some(json!({ "name": "Hijack" })), Some(&globex.admin))
        .await;
    assert_eq!(update.status, StatusCode::NOT_FOUND);

    let delete = ctx.request("DELETE", &uri, None, Some(&globex.admin)).await;
    assert_eq!(delete.status, StatusCode::NOT_FOUND);

    let list = ctx.request("GET", "/api/projects", None, Some(&globex.admin)).await;
    assert_eq!(list.body["data"]["total"], 0);

    let still_there = ctx.request("GET", &uri, None, Some(&acme.employee)).await;
    assert_eq!(still_there.status, StatusCode::OK);
    assert_eq!(still_there.body["data"]["name"], "Launch");
}

#[tokio::test]
async fn test_employees_cannot_write_content() {
    let ctx = TestContext::new().await;
    let acme = ctx.seed_company("Acme").await;

    let create = ctx
        .request(
            "POST",
            "/api/responsibilities",
            Some(json!({ "title": "Code review" })),
            Some(&acme.employee),
        )
        .await;
    assert_eq!(create.status, StatusCode::FORBIDDEN);
    assert_eq!(create.body["error"]["code"], "forbidden");

    let created = ctx
        .request(
            "POST",
            "/api/responsibilities",
            Some(json!({ "title": "Code review" })),
            Some(&acme.manager),
        )
        .await;
    let uri = format!(
        "/api/responsibilities/{}",
        created.body["data"]["id"].as_str().unwrap()
    );

    let update = ctx
        .request("PUT", &uri, Some(json!({ "title": "Nap" })), Some(&acme.employee))
        .await;
    assert_eq!(update.status, StatusCode::FORBIDDEN);

    let delete = ctx.request("DELETE", &uri, None, Some(&acme.employee)).await;
    assert_eq!(delete.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_any_member_can_complete_a_task() {
    let ctx = TestContext::new().await;
    let acme = ctx.seed_company("Acme").await;

    let created = ctx
        .request(
            "POST",
            "/api/tasks",
            Some(json!({ "title": "Set up laptop", "description": "Install tooling" })),
            Some(&acme.manager),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["data"]["completed"], false);
    let uri = format!("/api/tasks/{}", created.body["data"]["id"].as_str().unwrap());

    let done = ctx
        .request("PUT", &uri, Some(json!({ "completed": true })), Some(&acme.employee))
        .await;
    assert_eq!(done.status, StatusCode::OK);
    assert_eq!(done.body["data"]["completed"], true);
    assert_eq!(done.body["data"]["title"], "Set up laptop");
    assert_eq!(done.body["data"]["description"], "Install tooling");
}

#[tokio::test]
async fn test_request_rejections() {
    let ctx = TestContext::new().await;
    let acme = ctx.seed_company("Acme").await;

    let anonymous = ctx.request("GET", "/api/jobs", None, None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
    assert_eq!(anonymous.body["success"], false);

    let loner = ctx.login(EMAIL, PASSWORD).await;
    let no_company = ctx.request("GET", "/api/jobs", None, Some(&loner)).await;
    assert_eq!(no_company.status, StatusCode::FORBIDDEN);

    let bad_id = ctx
        .request("GET", "/api/jobs/not-a-uuid", None, Some(&acme.employee))
        .await;
    assert_eq!(bad_id.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_id.body["error"]["message"], "Invalid id");

    let invalid = ctx
        .request("POST", "/api/jobs", Some(json!({ "title": "" })), Some(&acme.manager))
        .await;
    assert_eq!(invalid.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(invalid.body["error"]["details"][0]["field"], "title");

    let wrong_shape = ctx
        .request("POST", "/api/jobs", Some(json!({ "title": 42 })), Some(&acme.manager))
        .await;
    assert_eq!(wrong_shape.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(wrong_shape.body["error"]["details"][0]["field"], "body");

    let bad_status = ctx
        .request(
            "POST",
            "/api/onboarding",
            Some(json!({ "title": "Week one", "status": "abandoned" })),
            Some(&acme.manager),
        )
        .await;
    assert_eq!(bad_status.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_user_without_company_founds_one() {
    let ctx = TestContext::new().await;
    let cookie = ctx.login(EMAIL, PASSWORD).await;

    let empty = ctx.request("GET", "/api/companies", None, Some(&cookie)).await;
    assert_eq!(empty.body["data"]["total"], 0);

    let created = ctx
        .request(
            "POST",
            "/api/companies",
            Some(json!({ "name": "Initech", "website": "https://initech.example" })),
            Some(&cookie),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let company_id = created.body["data"]["id"].clone();
    assert_eq!(created.body["data"]["company_id"], company_id);

    let me = ctx
        .request("GET", "/api/users/current", None, Some(&cookie))
        .await;
    assert_eq!(me.body["data"]["role"], "admin");
    assert_eq!(me.body["data"]["company_id"], company_id);

    let list = ctx.request("GET", "/api/companies", None, Some(&cookie)).await;
    assert_eq!(list.body["data"]["total"], 1);
    assert_eq!(list.body["data"]["items"][0]["name"], "Initech");

    let again = ctx
        .request("POST", "/api/companies", Some(json!({ "name": "Second" })), Some(&cookie))
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_only_company_admin_edits_company() {
    let ctx = TestContext::new().await;
    let acme = ctx.seed_company("Acme").await;
    let globex = ctx.seed_company("Globex").await;
    let uri = format!("/api/companies/{}", acme.id);

    let by_manager = ctx
        .request("PUT", &uri, Some(json!({ "name": "Acme 2" })), Some(&acme.manager))
        .await;
    assert_eq!(by_manager.status, StatusCode::FORBIDDEN);

    let by_outsider = ctx
        .request("PUT", &uri, Some(json!({ "name": "Acme 2" })), Some(&globex.admin))
        .await;
    assert_eq!(by_outsider.status, StatusCode::NOT_FOUND);

    let by_admin = ctx
        .request("PUT", &uri, Some(json!({ "name": "Acme Corp" })), Some(&acme.admin))
        .await;
    assert_eq!(by_admin.status, StatusCode::OK);
    assert_eq!(by_admin.body["data"]["name"], "Acme Corp");

    let read = ctx.request("GET", &uri, None, Some(&acme.employee)).await;
    assert_eq!(read.body["data"]["name"], "Acme Corp");

    let delete_by_manager = ctx.request("DELETE", &uri, None, Some(&acme.manager)).await;
    assert_eq!(delete_by_manager.status, StatusCode::FORBIDDEN);

    let delete = ctx.request("DELETE", &uri, None, Some(&acme.admin)).await;
    assert_eq!(delete.status, StatusCode::OK);
}

#[tokio::test]
async fn test_deleting_company_releases_members() {
    let ctx = TestContext::new().await;
    let acme = ctx.seed_company("Acme").await;

    let job = ctx
        .request("POST", "/api/jobs", Some(json!({ "title": "Engineer" })), Some(&acme.manager))
        .await;
    assert_eq!(job.status, StatusCode::CREATED);

    let uri = format!("/api/companies/{}", acme.id);
    let delete = ctx.request("DELETE", &uri, None, Some(&acme.admin)).await;
    assert_eq!(delete.status, StatusCode::OK);

    let ghost = ctx
        .request("POST", "/api/jobs", Some(json!({ "title": "Ghost" })), Some(&acme.manager))
        .await;
    assert_eq!(ghost.status, StatusCode::FORBIDDEN);

    let me = ctx
        .request("GET", "/api/users/current", None, Some(&acme.admin))
        .await;
    assert_eq!(me.body["data"]["company_id"], Value::Null);
    assert_eq!(me.body["data"]["role"], "employee");

    let refounded = ctx
        .request("POST", "/api/companies", Some(json!({ "name": "Acme Again" })), Some(&acme.admin))
        .await;
    assert_eq!(refounded.status, StatusCode::CREATED);

    // The old company's documents went with it
    let jobs = ctx.request("GET", "/api/jobs", None, Some(&acme.admin)).await;
    assert_eq!(jobs.status, StatusCode::OK);
    assert_eq!(jobs.body["data"]["total"], 0);
}

#[tokio::test]
async fn test_member_of_missing_company_may_found_one() {
    let ctx = TestContext::new().await;
    let acme = ctx.seed_company("Acme").await;

    // Company document gone but memberships left behind
    ctx.stores
        .documents
        .delete(Collection::Companies, acme.id)
        .await
        .unwrap();

    let ghost = ctx
        .request("POST", "/api/faqs", Some(json!({ "question": "q", "answer": "a" })), Some(&acme.manager))
        .await;
    assert_eq!(ghost.status, StatusCode::FORBIDDEN);

    let founded = ctx
        .request("POST", "/api/companies", Some(json!({ "name": "Acme Again" })), Some(&acme.employee))
        .await;
    assert_eq!(founded.status, StatusCode::CREATED);
}
