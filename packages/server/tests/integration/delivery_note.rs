use serde_json::json;

use crate::common::{TestApp, routes, tiny_png};

/// Spawn an app with one user, client, and project; return (app, token, project_id).
async fn app_with_project() -> (TestApp, String, i32) {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("owner@example.com", "Owner").await;
    let client_id = app.create_client(&token, "Construcciones Pérez").await;
    let project_id = app.create_project(&token, client_id, "Reforma nave").await;
    (app, token, project_id)
}

mod creation {
    use super::*;

    #[tokio::test]
    async fn numbers_are_sequential_and_carry_the_current_year() {
        let (app, token, project_id) = app_with_project().await;
        let year = chrono::Datelike::year(&chrono::Utc::now());

        let first = app
            .post_with_token(routes::DELIVERY_NOTES, &json!({"project_id": project_id}), &token)
            .await;
        let second = app
            .post_with_token(routes::DELIVERY_NOTES, &json!({"project_id": project_id}), &token)
            .await;

        assert_eq!(first.status, 201);
        assert_eq!(second.status, 201);
        assert_eq!(first.body["number"], format!("ALB-{year}-0001"));
        assert_eq!(second.body["number"], format!("ALB-{year}-0002"));
    }

    #[tokio::test]
    async fn client_is_derived_from_the_project() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("owner@example.com", "Owner").await;
        let client_id = app.create_client(&token, "Construcciones Pérez").await;
        let project_id = app.create_project(&token, client_id, "Reforma nave").await;

        let res = app
            .post_with_token(routes::DELIVERY_NOTES, &json!({"project_id": project_id}), &token)
            .await;

        assert_eq!(res.status, 201);
        assert_eq!(res.body["client_id"], client_id);
    }

    #[tokio::test]
    async fn notes_cannot_be_issued_against_foreign_projects() {
        let (app, _, project_id) = app_with_project().await;
        let other = app.create_authenticated_user("other@example.com", "Other").await;

        let res = app
            .post_with_token(routes::DELIVERY_NOTES, &json!({"project_id": project_id}), &other)
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn notes_with_at_most_one_line_of_each_kind_are_simple() {
        let (app, token, project_id) = app_with_project().await;

        let empty = app
            .post_with_token(routes::DELIVERY_NOTES, &json!({"project_id": project_id}), &token)
            .await;
        assert_eq!(empty.body["is_simple"], true);

        let one_each = app
            .post_with_token(
                routes::DELIVERY_NOTES,
                &json!({
                    "project_id": project_id,
                    "hours_entries": [{"user_id": 1, "hours": 8.0}],
                    "material_entries": [{"name": "Cemento", "quantity": 3.0}],
                }),
                &token,
            )
            .await;
        assert_eq!(one_each.body["is_simple"], true);

        let two_hours = app
            .post_with_token(
                routes::DELIVERY_NOTES,
                &json!({
                    "project_id": project_id,
                    "hours_entries": [
                        {"user_id": 1, "hours": 8.0},
                        {"user_id": 1, "hours": 4.0},
                    ],
                }),
                &token,
            )
            .await;
        assert_eq!(two_hours.body["is_simple"], false);
    }

    #[tokio::test]
    async fn material_unit_defaults_to_unidad() {
        let (app, token, project_id) = app_with_project().await;

        let res = app
            .post_with_token(
                routes::DELIVERY_NOTES,
                &json!({
                    "project_id": project_id,
                    "material_entries": [{"name": "Ladrillo", "quantity": 100.0, "price": 0.35}],
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 201);
        assert_eq!(res.body["material_entries"][0]["unit"], "unidad");
    }

    #[tokio::test]
    async fn negative_hours_are_rejected() {
        let (app, token, project_id) = app_with_project().await;

        let res = app
            .post_with_token(
                routes::DELIVERY_NOTES,
                &json!({
                    "project_id": project_id,
                    "hours_entries": [{"user_id": 1, "hours": -2.0}],
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn zero_hours_and_zero_quantities_are_accepted() {
        let (app, token, project_id) = app_with_project().await;

        let res = app
            .post_with_token(
                routes::DELIVERY_NOTES,
                &json!({
                    "project_id": project_id,
                    "hours_entries": [{"user_id": 1, "hours": 0.0}],
                    "material_entries": [{"name": "Cemento", "quantity": 0.0}],
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "boundary values rejected: {}", res.text);
        assert_eq!(res.body["hours_entries"][0]["hours"], 0.0);
    }

    #[tokio::test]
    async fn fresh_notes_start_unsigned_in_draft() {
        let (app, token, project_id) = app_with_project().await;

        let res = app
            .post_with_token(routes::DELIVERY_NOTES, &json!({"project_id": project_id}), &token)
            .await;

        assert_eq!(res.status, 201);
        assert_eq!(res.body["status"], "draft");
        assert_eq!(res.body["signature"]["is_signed"], false);
        assert_eq!(res.body["pdf"]["pending"], false);
        assert_eq!(res.body["guest_access"].as_array().unwrap().len(), 0);
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn notes_come_back_in_creation_order_with_filters() {
        let (app, token, project_a) = app_with_project().await;
        let client_b = app.create_client(&token, "Cliente B").await;
        let project_b = app.create_project(&token, client_b, "Proyecto B").await;

        let n1 = app.create_delivery_note(&token, project_a).await;
        let n2 = app.create_delivery_note(&token, project_b).await;
        let n3 = app.create_delivery_note(&token, project_a).await;

        let all = app.get_with_token(routes::DELIVERY_NOTES, &token).await;
        let ids: Vec<i64> = all
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![n1 as i64, n2 as i64, n3 as i64]);

        let filtered = app
            .get_with_token(
                &format!("{}?project_id={}", routes::DELIVERY_NOTES, project_a),
                &token,
            )
            .await;
        assert_eq!(filtered.body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn other_users_see_an_empty_list() {
        let (app, token, project_id) = app_with_project().await;
        app.create_delivery_note(&token, project_id).await;
        let other = app.create_authenticated_user("other@example.com", "Other").await;

        let res = app.get_with_token(routes::DELIVERY_NOTES, &other).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body.as_array().unwrap().len(), 0);
    }
}

mod detail {
    use super::*;

    #[tokio::test]
    async fn detail_resolves_project_client_and_line_users() {
        let app = TestApp::spawn().await;
        let (token, user_id) = app.create_user_with_id("owner@example.com", "Owner").await;
        let client_id = app.create_client(&token, "Construcciones Pérez").await;
        let project_id = app.create_project(&token, client_id, "Reforma nave").await;

        let created = app
            .post_with_token(
                routes::DELIVERY_NOTES,
                &json!({
                    "project_id": project_id,
                    "hours_entries": [{"user_id": user_id, "hours": 7.5}],
                }),
                &token,
            )
            .await;
        assert_eq!(created.status, 201);

        let res = app
            .get_with_token(&routes::delivery_note(created.id()), &token)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["project"]["name"], "Reforma nave");
        assert_eq!(res.body["client"]["name"], "Construcciones Pérez");
        assert_eq!(res.body["creator"]["name"], "Owner");
        assert_eq!(res.body["hours_entries"][0]["user"]["name"], "Owner");
    }

    #[tokio::test]
    async fn foreign_and_missing_notes_are_equally_not_found() {
        let (app, token, project_id) = app_with_project().await;
        let note_id = app.create_delivery_note(&token, project_id).await;
        let other = app.create_authenticated_user("other@example.com", "Other").await;

        let res = app.get_with_token(&routes::delivery_note(note_id), &other).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");

        let res = app.get_with_token(&routes::delivery_note(999_999), &token).await;
        assert_eq!(res.status, 404);
    }
}

mod updates {
    use super::*;

    #[tokio::test]
    async fn replacing_entries_recomputes_is_simple() {
        let (app, token, project_id) = app_with_project().await;
        let note_id = app.create_delivery_note(&token, project_id).await;

        let res = app
            .patch_with_token(
                &routes::delivery_note(note_id),
                &json!({
                    "hours_entries": [
                        {"user_id": 1, "hours": 8.0},
                        {"user_id": 2, "hours": 6.0},
                    ],
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["is_simple"], false);

        let res = app
            .patch_with_token(
                &routes::delivery_note(note_id),
                &json!({"hours_entries": [{"user_id": 1, "hours": 8.0}]}),
                &token,
            )
            .await;

        assert_eq!(res.body["is_simple"], true);
    }

    #[tokio::test]
    async fn reassigning_the_project_rederives_the_client_and_keeps_the_number() {
        let (app, token, project_a) = app_with_project().await;
        let client_b = app.create_client(&token, "Cliente B").await;
        let project_b = app.create_project(&token, client_b, "Proyecto B").await;

        let created = app
            .post_with_token(routes::DELIVERY_NOTES, &json!({"project_id": project_a}), &token)
            .await;
        let original_number = created.body["number"].as_str().unwrap().to_string();

        let res = app
            .patch_with_token(
                &routes::delivery_note(created.id()),
                &json!({"project_id": project_b}),
                &token,
            )
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["project_id"], project_b);
        assert_eq!(res.body["client_id"], client_b);
        assert_eq!(res.body["number"], original_number);
    }

    #[tokio::test]
    async fn guests_cannot_update_the_note() {
        let (app, token, project_id) = app_with_project().await;
        let note_id = app.create_delivery_note(&token, project_id).await;
        let (guest_token, guest_id) = app.create_user_with_id("guest@example.com", "Guest").await;

        let res = app
            .post_with_token(
                &routes::delivery_note_guests(note_id),
                &json!({"guest_id": guest_id}),
                &token,
            )
            .await;
        assert_eq!(res.status, 200);

        let res = app
            .patch_with_token(
                &routes::delivery_note(note_id),
                &json!({"description": "intruso"}),
                &guest_token,
            )
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn status_can_move_freely() {
        let (app, token, project_id) = app_with_project().await;
        let note_id = app.create_delivery_note(&token, project_id).await;

        let res = app
            .patch_with_token(
                &routes::delivery_note_status(note_id),
                &json!({"status": "invoiced"}),
                &token,
            )
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "invoiced");

        let res = app
            .patch_with_token(
                &routes::delivery_note_status(note_id),
                &json!({"status": "draft"}),
                &token,
            )
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "draft");
    }
}

mod guests {
    use super::*;

    #[tokio::test]
    async fn granting_access_covers_downloads_but_not_the_detail_view() {
        let (app, token, project_id) = app_with_project().await;
        let note_id = app.create_delivery_note(&token, project_id).await;
        let (guest_token, guest_id) = app.create_user_with_id("guest@example.com", "Guest").await;

        let res = app
            .post_with_token(
                &routes::delivery_note_guests(note_id),
                &json!({"guest_id": guest_id}),
                &token,
            )
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["message"], "GUEST_ACCESS_GRANTED");
        assert_eq!(res.body["guest_access"], json!([guest_id]));

        // Guests may sign and download, but the detail view stays with the
        // creator.
        let res = app.get_with_token(&routes::delivery_note(note_id), &guest_token).await;
        assert_eq!(res.status, 404);

        let (status, _, bytes) = app
            .get_bytes_with_token(&routes::delivery_note_pdf(note_id), &guest_token)
            .await;
        assert_eq!(status, 200);
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn granting_access_twice_is_an_idempotent_no_op() {
        let (app, token, project_id) = app_with_project().await;
        let note_id = app.create_delivery_note(&token, project_id).await;
        let (_, guest_id) = app.create_user_with_id("guest@example.com", "Guest").await;

        let body = json!({"guest_id": guest_id});
        let first = app
            .post_with_token(&routes::delivery_note_guests(note_id), &body, &token)
            .await;
        assert_eq!(first.body["message"], "GUEST_ACCESS_GRANTED");

        let second = app
            .post_with_token(&routes::delivery_note_guests(note_id), &body, &token)
            .await;
        assert_eq!(second.status, 200);
        assert_eq!(second.body["message"], "GUEST_ALREADY_HAS_ACCESS");
        assert_eq!(second.body["guest_access"], json!([guest_id]));
    }

    #[tokio::test]
    async fn unknown_users_cannot_be_added_as_guests() {
        let (app, token, project_id) = app_with_project().await;
        let note_id = app.create_delivery_note(&token, project_id).await;

        let res = app
            .post_with_token(
                &routes::delivery_note_guests(note_id),
                &json!({"guest_id": 999_999}),
                &token,
            )
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod signing {
    use super::*;

    #[tokio::test]
    async fn signing_pins_the_image_and_eventually_the_pdf() {
        let (app, token, project_id) = app_with_project().await;
        let note_id = app.create_delivery_note(&token, project_id).await;

        let res = app
            .sign_with_token(
                &routes::delivery_note_sign(note_id),
                Some(tiny_png()),
                Some("María García"),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "sign failed: {}", res.text);
        assert_eq!(res.body["signature"]["is_signed"], true);
        assert_eq!(res.body["signature"]["signed_by"], "María García");
        assert!(res.body["signature"]["content_id"].is_string());
        assert_eq!(res.body["pdf"]["pending"], true);

        let body = app.wait_for_pdf_pin(note_id, &token).await;
        assert!(body["pdf"]["content_id"].is_string());
        assert!(body["pdf"]["url"].is_string());

        // Signature image plus the rendered PDF.
        assert_eq!(app.content_store.len(), 2);
    }

    #[tokio::test]
    async fn signed_by_defaults_to_the_caller_name() {
        let (app, token, project_id) = app_with_project().await;
        let note_id = app.create_delivery_note(&token, project_id).await;

        let res = app
            .sign_with_token(&routes::delivery_note_sign(note_id), Some(tiny_png()), None, &token)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["signature"]["signed_by"], "Owner");
    }

    #[tokio::test]
    async fn a_second_signature_is_rejected() {
        let (app, token, project_id) = app_with_project().await;
        let note_id = app.create_delivery_note(&token, project_id).await;

        let first = app
            .sign_with_token(&routes::delivery_note_sign(note_id), Some(tiny_png()), None, &token)
            .await;
        assert_eq!(first.status, 200);

        let second = app
            .sign_with_token(&routes::delivery_note_sign(note_id), Some(tiny_png()), None, &token)
            .await;
        assert_eq!(second.status, 400);
        assert_eq!(second.body["code"], "ALREADY_SIGNED");
    }

    #[tokio::test]
    async fn signing_without_an_image_is_rejected() {
        let (app, token, project_id) = app_with_project().await;
        let note_id = app.create_delivery_note(&token, project_id).await;

        let res = app
            .sign_with_token(&routes::delivery_note_sign(note_id), None, Some("María"), &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "SIGNATURE_IMAGE_REQUIRED");
    }

    #[tokio::test]
    async fn a_guest_can_sign_the_note() {
        let (app, token, project_id) = app_with_project().await;
        let note_id = app.create_delivery_note(&token, project_id).await;
        let (guest_token, guest_id) = app.create_user_with_id("guest@example.com", "Guest").await;

        app.post_with_token(
            &routes::delivery_note_guests(note_id),
            &json!({"guest_id": guest_id}),
            &token,
        )
        .await;

        let res = app
            .sign_with_token(&routes::delivery_note_sign(note_id), Some(tiny_png()), None, &guest_token)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["signature"]["signed_by"], "Guest");
    }

    #[tokio::test]
    async fn strangers_cannot_sign_and_learn_nothing() {
        let (app, token, project_id) = app_with_project().await;
        let note_id = app.create_delivery_note(&token, project_id).await;
        let other = app.create_authenticated_user("other@example.com", "Other").await;

        let res = app
            .sign_with_token(&routes::delivery_note_sign(note_id), Some(tiny_png()), None, &other)
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod deletion {
    use super::*;

    #[tokio::test]
    async fn safe_delete_removes_unsigned_notes() {
        let (app, token, project_id) = app_with_project().await;
        let note_id = app.create_delivery_note(&token, project_id).await;

        let res = app
            .delete_with_token(&routes::delivery_note_safe(note_id), &token)
            .await;
        assert_eq!(res.status, 204);

        let res = app.get_with_token(&routes::delivery_note(note_id), &token).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn safe_delete_refuses_signed_notes() {
        let (app, token, project_id) = app_with_project().await;
        let note_id = app.create_delivery_note(&token, project_id).await;
        app.sign_with_token(&routes::delivery_note_sign(note_id), Some(tiny_png()), None, &token)
            .await;

        let res = app
            .delete_with_token(&routes::delivery_note_safe(note_id), &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "CANNOT_DELETE_SIGNED");
    }

    #[tokio::test]
    async fn unconditional_delete_removes_even_signed_notes() {
        let (app, token, project_id) = app_with_project().await;
        let note_id = app.create_delivery_note(&token, project_id).await;
        app.sign_with_token(&routes::delivery_note_sign(note_id), Some(tiny_png()), None, &token)
            .await;

        let res = app.delete_with_token(&routes::delivery_note(note_id), &token).await;
        assert_eq!(res.status, 204);
    }

    #[tokio::test]
    async fn deleted_numbers_are_not_reused() {
        let (app, token, project_id) = app_with_project().await;
        let year = chrono::Datelike::year(&chrono::Utc::now());

        let first = app
            .post_with_token(routes::DELIVERY_NOTES, &json!({"project_id": project_id}), &token)
            .await;
        assert_eq!(first.body["number"], format!("ALB-{year}-0001"));

        app.delete_with_token(&routes::delivery_note(first.id()), &token).await;

        let second = app
            .post_with_token(routes::DELIVERY_NOTES, &json!({"project_id": project_id}), &token)
            .await;
        assert_eq!(second.body["number"], format!("ALB-{year}-0002"));
    }
}

mod pdf {
    use super::*;

    #[tokio::test]
    async fn owner_downloads_a_pdf_via_the_authorization_header() {
        let (app, token, project_id) = app_with_project().await;
        let note_id = app.create_delivery_note(&token, project_id).await;

        let (status, content_type, bytes) = app
            .get_bytes_with_token(&routes::delivery_note_pdf(note_id), &token)
            .await;

        assert_eq!(status, 200);
        assert_eq!(content_type.as_deref(), Some("application/pdf"));
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn the_token_may_ride_in_the_query_string() {
        let (app, token, project_id) = app_with_project().await;
        let note_id = app.create_delivery_note(&token, project_id).await;

        let res = app
            .get_without_token(&format!("{}?{}", routes::delivery_note_pdf(note_id), token))
            .await;

        assert_eq!(res.status, 200);
        assert!(res.text.starts_with("%PDF"));
    }

    #[tokio::test]
    async fn a_signed_note_still_renders_when_the_image_gateway_is_down() {
        let (app, token, project_id) = app_with_project().await;
        let note_id = app.create_delivery_note(&token, project_id).await;
        app.sign_with_token(&routes::delivery_note_sign(note_id), Some(tiny_png()), None, &token)
            .await;

        let (status, _, bytes) = app
            .get_bytes_with_token(&routes::delivery_note_pdf(note_id), &token)
            .await;

        assert_eq!(status, 200);
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn a_guest_can_download_the_pdf() {
        let (app, token, project_id) = app_with_project().await;
        let note_id = app.create_delivery_note(&token, project_id).await;
        let (guest_token, guest_id) = app.create_user_with_id("guest@example.com", "Guest").await;

        app.post_with_token(
            &routes::delivery_note_guests(note_id),
            &json!({"guest_id": guest_id}),
            &token,
        )
        .await;

        let (status, _, bytes) = app
            .get_bytes_with_token(&routes::delivery_note_pdf(note_id), &guest_token)
            .await;

        assert_eq!(status, 200);
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn strangers_get_forbidden_and_anonymous_gets_unauthorized() {
        let (app, token, project_id) = app_with_project().await;
        let note_id = app.create_delivery_note(&token, project_id).await;
        let other = app.create_authenticated_user("other@example.com", "Other").await;

        let res = app
            .get_with_token(&routes::delivery_note_pdf(note_id), &other)
            .await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "ACCESS_DENIED");

        let res = app.get_without_token(&routes::delivery_note_pdf(note_id)).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }
}
