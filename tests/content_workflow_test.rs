mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;

#[tokio::test]
async fn test_category_crud_and_menu() {
    let app = setup_app().await;
    let admin = login_admin(&app).await;
    let bob = register_and_login(&app, "bob", "password123").await;

    // Writes are gated on categories.manage
    let (status, _) = request(
        &app,
        "POST",
        "/categories",
        Some(&bob),
        Some(json!({ "name": "News" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, news) = request(
        &app,
        "POST",
        "/categories",
        Some(&admin),
        Some(json!({ "name": "News", "show_on_menu": true, "menu_order": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(news["slug"], "news");
    let news_id = news["id"].as_str().unwrap().to_string();

    // Explicit duplicate slug conflicts
    let (status, _) = request(
        &app,
        "POST",
        "/categories",
        Some(&admin),
        Some(json!({ "name": "Newsroom", "slug": "news" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Generated slugs get a numeric suffix instead
    let (status, second) = request(
        &app,
        "POST",
        "/categories",
        Some(&admin),
        Some(json!({ "name": "News" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(second["slug"], "news-2");

    let (status, tech) = request(
        &app,
        "POST",
        "/subcategories",
        Some(&admin),
        Some(json!({ "name": "Tech" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let tech_id = tech["id"].as_str().unwrap().to_string();

    let (status, updated) = request(
        &app,
        "PUT",
        &format!("/categories/{}/subcategories", news_id),
        Some(&admin),
        Some(json!({ "subcategory_ids": [tech_id] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["subcategory_ids"].as_array().unwrap().len(), 1);

    // Public menu needs no token and carries the subcategories
    let (status, menu) = request(&app, "GET", "/categories/menu", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let menu = menu.as_array().unwrap();
    assert_eq!(menu.len(), 1);
    assert_eq!(menu[0]["slug"], "news");
    assert_eq!(menu[0]["subcategories"][0]["name"], "Tech");

    // Deleting a subcategory detaches it
    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/subcategories/{}", tech_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, after) = request(
        &app,
        "GET",
        &format!("/categories/{}", news_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(after["subcategory_ids"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_publication_moderation_workflow() {
    let app = setup_app().await;
    let admin = login_admin(&app).await;
    let bob = register_and_login(&app, "bob", "password123").await;
    assign_role(&app, &admin, "bob", "editor").await;

    let (_, category) = request(
        &app,
        "POST",
        "/categories",
        Some(&admin),
        Some(json!({ "name": "Articles" })),
    )
    .await;
    let category_id = category["id"].as_str().unwrap().to_string();

    // Without content.create the endpoint is off limits
    let alice = register_and_login(&app, "alice", "password123").await;
    let (status, _) = request(
        &app,
        "POST",
        "/publications",
        Some(&alice),
        Some(json!({ "title": "Nope", "category_id": category_id })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, publication) = request(
        &app,
        "POST",
        "/publications",
        Some(&bob),
        Some(json!({
            "title": "Hello World",
            "summary": "First post",
            "body": "Long form text",
            "category_id": category_id
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(publication["status"], "draft");
    assert_eq!(publication["slug"], "hello-world");
    assert_eq!(publication["category_name"], "Articles");
    let pub_id = publication["id"].as_str().unwrap().to_string();

    // Same title -> suffixed slug
    let (_, second) = request(
        &app,
        "POST",
        "/publications",
        Some(&bob),
        Some(json!({ "title": "Hello World", "category_id": category_id })),
    )
    .await;
    assert_eq!(second["slug"], "hello-world-2");

    // Reviewing a draft is invalid, and bob cannot review at all
    let (status, _) = request(
        &app,
        "POST",
        &format!("/publications/{}/approve", pub_id),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = request(
        &app,
        "POST",
        &format!("/publications/{}/approve", pub_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // draft -> pending
    let (status, submitted) = request(
        &app,
        "POST",
        &format!("/publications/{}/submit", pub_id),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(submitted["status"], "pending");

    // Pending records are frozen for the creator
    let (status, _) = request(
        &app,
        "PUT",
        &format!("/publications/{}", pub_id),
        Some(&bob),
        Some(json!({ "title": "Hello World, Again" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Only the creator may submit
    let (status, _) = request(
        &app,
        "POST",
        &format!("/publications/{}/submit", pub_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // pending -> rejected, with a note
    let (status, rejected) = request(
        &app,
        "POST",
        &format!("/publications/{}/reject", pub_id),
        Some(&admin),
        Some(json!({ "note": "Needs sources" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rejected["status"], "rejected");
    assert_eq!(rejected["review_note"], "Needs sources");

    // rejected -> pending -> approved
    let (status, _) = request(
        &app,
        "POST",
        &format!("/publications/{}/submit", pub_id),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, approved) = request(
        &app,
        "POST",
        &format!("/publications/{}/approve", pub_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "approved");

    // Double approve is a conflict
    let (status, _) = request(
        &app,
        "POST",
        &format!("/publications/{}/approve", pub_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Public surface shows only the approved record
    let (status, listed) = request(&app, "GET", "/public/publications", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["total_items"], 1);
    assert_eq!(listed["items"][0]["slug"], "hello-world");

    let (status, shown) = request(
        &app,
        "GET",
        "/public/publications/hello-world",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shown["title"], "Hello World");

    let (status, _) = request(
        &app,
        "GET",
        "/public/publications/hello-world-2",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Creator edit of an approved record sends it back to draft
    let (status, reverted) = request(
        &app,
        "PUT",
        &format!("/publications/{}", pub_id),
        Some(&bob),
        Some(json!({ "title": "Hello World, Revised" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reverted["status"], "draft");

    // Admin listing sees both records; bob's listing is his own anyway
    let (status, all) = request(&app, "GET", "/publications", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all["total_items"], 2);

    let (status, drafts) = request(
        &app,
        "GET",
        "/publications?status=draft",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(drafts["total_items"], 2);

    let (status, searched) = request(
        &app,
        "GET",
        "/publications?search=revised",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(searched["total_items"], 1);
}

#[tokio::test]
async fn test_publication_attachments() {
    let app = setup_app().await;
    let admin = login_admin(&app).await;
    let bob = register_and_login(&app, "bob", "password123").await;
    let alice = register_and_login(&app, "alice", "password123").await;
    assign_role(&app, &admin, "bob", "editor").await;

    let (_, category) = request(
        &app,
        "POST",
        "/categories",
        Some(&admin),
        Some(json!({ "name": "Media" })),
    )
    .await;
    let category_id = category["id"].as_str().unwrap().to_string();

    let (_, own_file) = upload(&app, &bob, "chart.txt", "text/plain", b"data", None).await;
    let own_file_id = own_file["id"].as_str().unwrap().to_string();

    let (_, foreign_file) = upload(&app, &alice, "secret.txt", "text/plain", b"hers", None).await;
    let foreign_file_id = foreign_file["id"].as_str().unwrap().to_string();

    // Files the creator cannot read are rejected as attachments
    let (status, _) = request(
        &app,
        "POST",
        "/publications",
        Some(&bob),
        Some(json!({
            "title": "With Attachments",
            "category_id": category_id,
            "attachment_file_ids": [foreign_file_id]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, publication) = request(
        &app,
        "POST",
        "/publications",
        Some(&bob),
        Some(json!({
            "title": "With Attachments",
            "category_id": category_id,
            "attachment_file_ids": [own_file_id]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(publication["attachments"].as_array().unwrap().len(), 1);
    assert_eq!(publication["attachments"][0]["filename"], "chart.txt");
}

#[tokio::test]
async fn test_role_and_permission_management() {
    let app = setup_app().await;
    let admin = login_admin(&app).await;
    let bob = register_and_login(&app, "bob", "password123").await;

    // The catalog is seeded
    let (status, permissions) = request(&app, "GET", "/permissions", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(permissions.as_array().unwrap().len(), 6);

    // Listing users needs users.manage
    let (status, _) = request(&app, "GET", "/users", Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, role) = request(
        &app,
        "POST",
        "/roles",
        Some(&admin),
        Some(json!({
            "name": "publisher",
            "description": "Publishes content",
            "permission_keys": ["content.create"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let role_id = role["id"].as_str().unwrap().to_string();
    assert_eq!(role["permission_keys"], json!(["content.create"]));

    // Unknown permission keys are rejected
    let (status, _) = request(
        &app,
        "PUT",
        &format!("/roles/{}/permissions", role_id),
        Some(&admin),
        Some(json!({ "permission_keys": ["content.rule-the-world"] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, role) = request(
        &app,
        "PUT",
        &format!("/roles/{}/permissions", role_id),
        Some(&admin),
        Some(json!({ "permission_keys": ["content.create", "content.review"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(role["permission_keys"].as_array().unwrap().len(), 2);

    // Assignment grants the permissions transitively
    assign_role(&app, &admin, "bob", "publisher").await;
    let (_, profile) = request(&app, "GET", "/users/me", Some(&bob), None).await;
    assert_eq!(profile["roles"], json!(["publisher"]));
    assert!(
        profile["permissions"]
            .as_array()
            .unwrap()
            .contains(&json!("content.review"))
    );

    // A built-in role cannot be deleted
    let admin_role_id = role_id_of(&app, &admin, "admin").await;
    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/roles/{}", admin_role_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Neither can a role that is still assigned
    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/roles/{}", role_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Unassign, then deletion goes through
    let bob_id = user_id_of(&app, &admin, "bob").await;
    let (status, _) = request(
        &app,
        "PUT",
        &format!("/users/{}/roles", bob_id),
        Some(&admin),
        Some(json!({ "role_ids": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/roles/{}", role_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_navigation_links() {
    let app = setup_app().await;
    let admin = login_admin(&app).await;
    let bob = register_and_login(&app, "bob", "password123").await;

    let (status, _) = request(
        &app,
        "POST",
        "/nav-links",
        Some(&bob),
        Some(json!({ "label": "Home", "url": "/" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, home) = request(
        &app,
        "POST",
        "/nav-links",
        Some(&admin),
        Some(json!({ "label": "Home", "url": "/", "position": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let home_id = home["id"].as_str().unwrap().to_string();

    let (_, about) = request(
        &app,
        "POST",
        "/nav-links",
        Some(&admin),
        Some(json!({ "label": "About", "url": "/about", "position": 1 })),
    )
    .await;
    let about_id = about["id"].as_str().unwrap().to_string();

    let (_, hidden) = request(
        &app,
        "POST",
        "/nav-links",
        Some(&admin),
        Some(json!({ "label": "Drafts", "url": "/drafts", "position": 2, "visible": false })),
    )
    .await;
    let hidden_id = hidden["id"].as_str().unwrap().to_string();

    // Public navigation skips hidden links
    let (status, nav) = request(&app, "GET", "/navigation", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let labels: Vec<&str> = nav
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["label"].as_str().unwrap())
        .collect();
    assert_eq!(labels, vec!["Home", "About"]);

    // Admin listing shows everything
    let (_, all) = request(&app, "GET", "/nav-links", Some(&admin), None).await;
    assert_eq!(all.as_array().unwrap().len(), 3);

    // Reorder flips the public order
    let (status, _) = request(
        &app,
        "PUT",
        "/nav-links/reorder",
        Some(&admin),
        Some(json!({ "ordered_ids": [about_id, home_id, hidden_id] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, nav) = request(&app, "GET", "/navigation", None, None).await;
    let labels: Vec<&str> = nav
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["label"].as_str().unwrap())
        .collect();
    assert_eq!(labels, vec!["About", "Home"]);

    // Hide, update, delete
    let (status, updated) = request(
        &app,
        "PUT",
        &format!("/nav-links/{}", about_id),
        Some(&admin),
        Some(json!({ "visible": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["visible"], false);

    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/nav-links/{}", hidden_id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_response_cache_inspection_and_invalidation() {
    let app = setup_app().await;
    let admin = login_admin(&app).await;
    let bob = register_and_login(&app, "bob", "password123").await;

    // Inspection is admin-only
    let (status, _) = request(&app, "GET", "/system/cache", Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Cold cache
    let (status, stats) = request(&app, "GET", "/system/cache", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["entry_count"], 0);

    let (_, first) = request(
        &app,
        "POST",
        "/categories",
        Some(&admin),
        Some(json!({ "name": "One", "show_on_menu": true })),
    )
    .await;
    assert_eq!(first["slug"], "one");

    // A public read warms the cache
    let (_, menu) = request(&app, "GET", "/categories/menu", None, None).await;
    assert_eq!(menu.as_array().unwrap().len(), 1);

    let (_, stats) = request(&app, "GET", "/system/cache", Some(&admin), None).await;
    assert_eq!(stats["entry_count"], 1);
    assert_eq!(stats["keys"][0], "categories:menu");

    // A write invalidates, and the next read sees the new row
    let (_, _) = request(
        &app,
        "POST",
        "/categories",
        Some(&admin),
        Some(json!({ "name": "Two", "show_on_menu": true })),
    )
    .await;

    let (_, stats) = request(&app, "GET", "/system/cache", Some(&admin), None).await;
    assert_eq!(stats["entry_count"], 0);

    let (_, menu) = request(&app, "GET", "/categories/menu", None, None).await;
    assert_eq!(menu.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_dashboard_stats_scoping() {
    let app = setup_app().await;
    let admin = login_admin(&app).await;
    let bob = register_and_login(&app, "bob", "password123").await;
    assign_role(&app, &admin, "bob", "editor").await;

    let (_, category) = request(
        &app,
        "POST",
        "/categories",
        Some(&admin),
        Some(json!({ "name": "General" })),
    )
    .await;
    let category_id = category["id"].as_str().unwrap().to_string();

    let (_, publication) = request(
        &app,
        "POST",
        "/publications",
        Some(&bob),
        Some(json!({ "title": "Numbers", "category_id": category_id })),
    )
    .await;
    let pub_id = publication["id"].as_str().unwrap().to_string();
    let (status, _) = request(
        &app,
        "POST",
        &format!("/publications/{}/submit", pub_id),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    upload(&app, &bob, "stats.txt", "text/plain", b"123456", None).await;

    // Bob sees his own scope, without the global sections
    let (status, stats) = request(&app, "GET", "/dashboard/stats", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["publications"]["pending"], 1);
    assert_eq!(stats["files"]["count"], 1);
    assert_eq!(stats["files"]["total_size"], 6);
    assert!(stats.get("categories").is_none());
    assert!(stats.get("users").is_none());

    // Admin gets global counts
    let (status, stats) = request(&app, "GET", "/dashboard/stats", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["publications"]["pending"], 1);
    assert_eq!(stats["categories"], 1);
    assert_eq!(stats["users"], 2); // admin + bob
    assert_eq!(stats["files"]["count"], 0);
}
