mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::json;

#[tokio::test]
async fn test_health_check() {
    let app = setup_app().await;

    let (status, body) = request(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn test_register_login_profile() {
    let app = setup_app().await;

    let token = register_and_login(&app, "bob", "password123").await;

    // Duplicate username
    let (status, _) = request(
        &app,
        "POST",
        "/register",
        None,
        Some(json!({ "username": "bob", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Wrong password
    let (status, _) = request(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({ "username": "bob", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // No token -> 401
    let (status, _) = request(&app, "GET", "/users/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, profile) = request(&app, "GET", "/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["username"], "bob");
    assert_eq!(profile["roles"].as_array().unwrap().len(), 0);

    // Profile update, then password change
    let (status, profile) = request(
        &app,
        "PUT",
        "/users/me",
        Some(&token),
        Some(json!({ "name": "Bob Example", "email": "bob@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["name"], "Bob Example");

    let (status, _) = request(
        &app,
        "PUT",
        "/users/me",
        Some(&token),
        Some(json!({ "current_password": "nope-nope-nope", "new_password": "newpassword456" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = request(
        &app,
        "PUT",
        "/users/me",
        Some(&token),
        Some(json!({ "current_password": "password123", "new_password": "newpassword456" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    login(&app, "bob", "newpassword456").await;
}

#[tokio::test]
async fn test_folder_tree_and_cycle_rules() {
    let app = setup_app().await;
    let token = register_and_login(&app, "bob", "password123").await;

    let (status, docs) = request(
        &app,
        "POST",
        "/folders",
        Some(&token),
        Some(json!({ "name": "Docs" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let docs_id = docs["id"].as_str().unwrap().to_string();

    let (status, reports) = request(
        &app,
        "POST",
        "/folders",
        Some(&token),
        Some(json!({ "name": "Reports", "parent_id": docs_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let reports_id = reports["id"].as_str().unwrap().to_string();
    assert_eq!(reports["parent_id"], docs["id"]);

    // Creating under an unknown parent fails without leaking
    let (status, _) = request(
        &app,
        "POST",
        "/folders",
        Some(&token),
        Some(json!({ "name": "Orphan", "parent_id": "no-such-folder" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, tree) = request(&app, "GET", "/folders/tree", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tree.as_array().unwrap().len(), 2);

    // Breadcrumbs: root first
    let (status, path) = request(
        &app,
        "GET",
        &format!("/folders/{}/path", reports_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let path = path.as_array().unwrap();
    assert_eq!(path.len(), 2);
    assert_eq!(path[0]["name"], "Docs");
    assert_eq!(path[1]["name"], "Reports");

    // Moving a folder into itself or its descendant is rejected
    let (status, _) = request(
        &app,
        "PUT",
        &format!("/folders/{}", docs_id),
        Some(&token),
        Some(json!({ "parent_id": docs_id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = request(
        &app,
        "PUT",
        &format!("/folders/{}", docs_id),
        Some(&token),
        Some(json!({ "parent_id": reports_id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Rename works and sentinels resolve to root
    let (status, renamed) = request(
        &app,
        "PUT",
        &format!("/folders/{}", reports_id),
        Some(&token),
        Some(json!({ "name": "Quarterly Reports", "parent_id": "root" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["name"], "Quarterly Reports");
    assert!(renamed["parent_id"].is_null());

    // Move it back, then the non-empty parent refuses deletion
    let (status, _) = request(
        &app,
        "PUT",
        &format!("/folders/{}", reports_id),
        Some(&token),
        Some(json!({ "parent_id": docs_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/folders/{}", docs_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/folders/{}", reports_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/folders/{}", docs_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_upload_list_rename_download_delete() {
    let app = setup_app().await;
    let token = register_and_login(&app, "bob", "password123").await;

    let (status, file) = upload(&app, &token, "hello.txt", "text/plain", b"hello world", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(file["filename"], "hello.txt");
    assert_eq!(file["mime_type"], "text/plain");
    assert_eq!(file["file_size"], 11);
    assert!(file["download_url"].as_str().unwrap().contains("files/"));
    let file_id = file["id"].as_str().unwrap().to_string();

    // Same name again gets a numbered variant
    let (status, second) =
        upload(&app, &token, "hello.txt", "text/plain", b"other bytes", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(second["filename"], "hello (2).txt");

    // Blocked extension refused
    let (status, _) = upload(&app, &token, "evil.exe", "text/plain", b"MZ", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Root listing shows both files
    let (status, listing) = request(&app, "GET", "/files", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing.as_array().unwrap().len(), 2);

    // Search scope is separate from folder scope
    let (status, found) = request(&app, "GET", "/files?search=HELLO", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found.as_array().unwrap().len(), 2);

    let (status, found) = request(
        &app,
        "GET",
        "/files?search=hello&mime_class=image",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found.as_array().unwrap().len(), 0);

    // Download streams the stored bytes as an attachment
    let (status, bytes, headers) = request_raw(
        &app,
        "GET",
        &format!("/files/{}/download", file_id),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"hello world");
    assert!(
        headers["content-disposition"]
            .to_str()
            .unwrap()
            .starts_with("attachment")
    );

    // Move into a folder under a new name
    let (status, folder) = request(
        &app,
        "POST",
        "/folders",
        Some(&token),
        Some(json!({ "name": "Texts" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let folder_id = folder["id"].as_str().unwrap().to_string();

    let (status, moved) = request(
        &app,
        "PUT",
        &format!("/files/{}/rename", file_id),
        Some(&token),
        Some(json!({ "name": "greeting.txt", "folder_id": folder_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["filename"], "greeting.txt");
    assert_eq!(moved["folder_id"], folder["id"]);

    let (status, listing) = request(
        &app,
        "GET",
        &format!("/files?parent_id={}", folder_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing.as_array().unwrap().len(), 1);

    // Moving the second file onto the same name conflicts
    let (status, _) = request(
        &app,
        "PUT",
        &format!("/files/{}/rename", second["id"].as_str().unwrap()),
        Some(&token),
        Some(json!({ "name": "greeting.txt", "folder_id": folder_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Delete, then the file is gone
    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/files/{}", file_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = request(
        &app,
        "GET",
        &format!("/files/{}", file_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_share_grants_and_visibility() {
    let app = setup_app().await;
    let bob = register_and_login(&app, "bob", "password123").await;
    let alice = register_and_login(&app, "alice", "password123").await;
    let admin = login_admin(&app).await;
    let alice_id = user_id_of(&app, &admin, "alice").await;

    let (_, file) = upload(&app, &bob, "report.txt", "text/plain", b"q3 numbers", None).await;
    let file_id = file["id"].as_str().unwrap().to_string();

    // Invisible to alice before any grant
    let (status, _) = request(
        &app,
        "GET",
        &format!("/files/{}", file_id),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Read grant
    let (status, share) = request(
        &app,
        "POST",
        "/shares",
        Some(&bob),
        Some(json!({
            "file_id": file_id,
            "shared_with_user_id": alice_id,
            "access_level": "read"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let share_id = share["id"].as_str().unwrap().to_string();

    let (status, seen) = request(
        &app,
        "GET",
        &format!("/files/{}", file_id),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(seen["filename"], "report.txt");
    assert_eq!(seen["is_shared"], true);

    let (status, bytes, _) = request_raw(
        &app,
        "GET",
        &format!("/files/{}/download", file_id),
        Some(&alice),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"q3 numbers");

    // Read does not allow rename
    let (status, _) = request(
        &app,
        "PUT",
        &format!("/files/{}/rename", file_id),
        Some(&alice),
        Some(json!({ "name": "stolen.txt" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Re-granting upgrades the level in place
    let (status, _) = request(
        &app,
        "POST",
        "/shares",
        Some(&bob),
        Some(json!({
            "file_id": file_id,
            "shared_with_user_id": alice_id,
            "access_level": "write"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, shares) = request(&app, "GET", "/shares", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shares.as_array().unwrap().len(), 1);
    assert_eq!(shares[0]["access_level"], "write");

    let (status, renamed) = request(
        &app,
        "PUT",
        &format!("/files/{}/rename", file_id),
        Some(&alice),
        Some(json!({ "name": "numbers.txt" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["filename"], "numbers.txt");

    // But still not delete
    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/files/{}", file_id),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, with_me) = request(&app, "GET", "/shares/with-me/files", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(with_me.as_array().unwrap().len(), 1);
    assert_eq!(with_me[0]["access_level"], "write");
    assert_eq!(with_me[0]["filename"], "numbers.txt");

    // Revoke hides the file again
    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/shares/{}", share_id),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = request(
        &app,
        "GET",
        &format!("/files/{}", file_id),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_folder_grant_covers_contents() {
    let app = setup_app().await;
    let bob = register_and_login(&app, "bob", "password123").await;
    let alice = register_and_login(&app, "alice", "password123").await;
    let admin = login_admin(&app).await;
    let alice_id = user_id_of(&app, &admin, "alice").await;

    let (_, folder) = request(
        &app,
        "POST",
        "/folders",
        Some(&bob),
        Some(json!({ "name": "Shared Docs" })),
    )
    .await;
    let folder_id = folder["id"].as_str().unwrap().to_string();

    let (_, sub) = request(
        &app,
        "POST",
        "/folders",
        Some(&bob),
        Some(json!({ "name": "Inner", "parent_id": folder_id })),
    )
    .await;
    let sub_id = sub["id"].as_str().unwrap().to_string();

    let (_, file) = upload(
        &app,
        &bob,
        "deep.txt",
        "text/plain",
        b"nested",
        Some(&sub_id),
    )
    .await;
    let file_id = file["id"].as_str().unwrap().to_string();

    // No grant yet: alice sees nothing
    let (status, _) = request(
        &app,
        "GET",
        &format!("/files/{}", file_id),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Granting the top folder covers the whole subtree
    let (status, _) = request(
        &app,
        "POST",
        "/shares",
        Some(&bob),
        Some(json!({
            "folder_id": folder_id,
            "shared_with_user_id": alice_id,
            "access_level": "read"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, seen) = request(
        &app,
        "GET",
        &format!("/files/{}", file_id),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(seen["filename"], "deep.txt");

    // The shared subtree appears in alice's tree listing
    let (status, tree) = request(&app, "GET", "/folders/tree", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = tree
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"Shared Docs"));
    assert!(names.contains(&"Inner"));

    let (status, with_me) = request(
        &app,
        "GET",
        "/shares/with-me/folders",
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(with_me.as_array().unwrap().len(), 1);
    assert_eq!(with_me[0]["name"], "Shared Docs");

    // Alice can list the folder's contents
    let (status, listing) = request(
        &app,
        "GET",
        &format!("/files?parent_id={}", sub_id),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_bulk_move_and_delete() {
    let app = setup_app().await;
    let token = register_and_login(&app, "bob", "password123").await;

    let (_, folder_a) = request(
        &app,
        "POST",
        "/folders",
        Some(&token),
        Some(json!({ "name": "A" })),
    )
    .await;
    let a_id = folder_a["id"].as_str().unwrap().to_string();

    let (_, f1) = upload(&app, &token, "one.txt", "text/plain", b"1", None).await;
    let (_, f2) = upload(&app, &token, "two.txt", "text/plain", b"2", None).await;
    let f1_id = f1["id"].as_str().unwrap().to_string();
    let f2_id = f2["id"].as_str().unwrap().to_string();

    // Move both files plus a bogus id into A
    let (status, outcome) = request(
        &app,
        "POST",
        "/files/bulk-move",
        Some(&token),
        Some(json!({
            "item_ids": [f1_id, f2_id, "missing-id"],
            "target_parent_id": a_id
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["processed"], 2);
    assert_eq!(outcome["skipped"].as_array().unwrap().len(), 1);

    let (_, listing) = request(
        &app,
        "GET",
        &format!("/files?parent_id={}", a_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(listing.as_array().unwrap().len(), 2);

    // A folder with contents is skipped by bulk delete; its file is not
    let (status, outcome) = request(
        &app,
        "POST",
        "/files/bulk-delete",
        Some(&token),
        Some(json!({ "item_ids": [a_id, f1_id] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["processed"], 1);
    assert_eq!(outcome["skipped"].as_array().unwrap().len(), 1);

    // Now empty it and delete everything
    let (status, outcome) = request(
        &app,
        "POST",
        "/files/bulk-delete",
        Some(&token),
        Some(json!({ "item_ids": [f2_id, a_id] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["processed"], 2);
    assert_eq!(outcome["skipped"].as_array().unwrap().len(), 0);

    let (_, tree) = request(&app, "GET", "/folders/tree", Some(&token), None).await;
    assert_eq!(tree.as_array().unwrap().len(), 0);
}
