use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn clients_can_be_created_and_fetched() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("owner@example.com", "Owner").await;

    let id = app.create_client(&token, "Construcciones Pérez").await;

    let res = app.get_with_token(&routes::client(id), &token).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["name"], "Construcciones Pérez");
    assert_eq!(res.body["nif"], "B12345678");
    assert_eq!(res.body["is_archived"], false);
}

#[tokio::test]
async fn clients_are_scoped_to_their_owner() {
    let app = TestApp::spawn().await;
    let owner = app.create_authenticated_user("owner@example.com", "Owner").await;
    let other = app.create_authenticated_user("other@example.com", "Other").await;

    let id = app.create_client(&owner, "Construcciones Pérez").await;

    let res = app.get_with_token(&routes::client(id), &other).await;
    assert_eq!(res.status, 404);
    assert_eq!(res.body["code"], "NOT_FOUND");

    let list = app.get_with_token(routes::CLIENTS, &other).await;
    assert_eq!(list.status, 200);
    assert_eq!(list.body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn patch_updates_only_the_provided_fields() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("owner@example.com", "Owner").await;
    let id = app.create_client(&token, "Construcciones Pérez").await;

    let res = app
        .patch_with_token(
            &routes::client(id),
            &json!({"phone": "+34 600 000 000", "nif": null}),
            &token,
        )
        .await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body["name"], "Construcciones Pérez");
    assert_eq!(res.body["phone"], "+34 600 000 000");
    assert!(res.body["nif"].is_null());
}

#[tokio::test]
async fn archived_clients_are_hidden_until_restored() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("owner@example.com", "Owner").await;
    let id = app.create_client(&token, "Construcciones Pérez").await;

    let res = app
        .patch_with_token(&routes::client_archive(id), &json!({}), &token)
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["is_archived"], true);

    let list = app.get_with_token(routes::CLIENTS, &token).await;
    assert_eq!(list.body.as_array().unwrap().len(), 0);

    let list = app
        .get_with_token(&format!("{}?include_archived=true", routes::CLIENTS), &token)
        .await;
    assert_eq!(list.body.as_array().unwrap().len(), 1);

    let res = app
        .patch_with_token(&routes::client_restore(id), &json!({}), &token)
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["is_archived"], false);

    let list = app.get_with_token(routes::CLIENTS, &token).await;
    assert_eq!(list.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn hard_delete_removes_the_client() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("owner@example.com", "Owner").await;
    let id = app.create_client(&token, "Construcciones Pérez").await;

    let res = app.delete_with_token(&routes::client(id), &token).await;
    assert_eq!(res.status, 204);

    let res = app.get_with_token(&routes::client(id), &token).await;
    assert_eq!(res.status, 404);
}
