use crate::common::TestApp;

#[tokio::test]
async fn the_openapi_document_is_served_and_describes_line_items() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token("/api-docs/openapi.json").await;

    assert_eq!(res.status, 200);
    let schemas = &res.body["components"]["schemas"];
    assert!(schemas["HoursEntry"].is_object(), "missing HoursEntry schema");
    assert!(
        schemas["HoursEntry"]["properties"]["date"].is_object(),
        "HoursEntry schema lost its date field"
    );
    assert!(schemas["MaterialEntry"].is_object());
    assert!(schemas["DeliveryNoteDetail"].is_object());
}
