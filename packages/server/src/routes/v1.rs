use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/clients", client_routes())
        .nest("/projects", project_routes())
        .nest("/delivery-notes", delivery_note_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::register))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::me))
}

fn client_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::client::list_clients,
            handlers::client::create_client
        ))
        .routes(routes!(
            handlers::client::get_client,
            handlers::client::update_client,
            handlers::client::delete_client
        ))
        .routes(routes!(handlers::client::archive_client))
        .routes(routes!(handlers::client::restore_client))
}

fn project_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::project::list_projects,
            handlers::project::create_project
        ))
        .routes(routes!(
            handlers::project::get_project,
            handlers::project::update_project,
            handlers::project::delete_project
        ))
        .routes(routes!(handlers::project::archive_project))
        .routes(routes!(handlers::project::restore_project))
}

fn delivery_note_routes() -> OpenApiRouter<AppState> {
    let crud = OpenApiRouter::new()
        .routes(routes!(
            handlers::delivery_note::list_delivery_notes,
            handlers::delivery_note::create_delivery_note
        ))
        .routes(routes!(
            handlers::delivery_note::get_delivery_note,
            handlers::delivery_note::update_delivery_note,
            handlers::delivery_note::delete_delivery_note
        ))
        .routes(routes!(handlers::delivery_note::change_delivery_note_status))
        .routes(routes!(handlers::delivery_note::add_delivery_note_guest))
        .routes(routes!(handlers::delivery_note::safe_delete_delivery_note))
        .routes(routes!(handlers::delivery_note_pdf::get_delivery_note_pdf));

    let sign = OpenApiRouter::new()
        .routes(routes!(handlers::delivery_note_pdf::sign_delivery_note))
        .layer(handlers::delivery_note_pdf::signature_body_limit());

    crud.merge(sign)
}
