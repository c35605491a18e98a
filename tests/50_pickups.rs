mod common;

use anyhow::Result;
use axum::http::StatusCode;
use chrono::Duration;
use serde_json::json;

use foodsaving::database::models::{ConversationType, PickupDate};
use foodsaving::database::Datastore;

#[tokio::test]
async fn cancelling_posts_to_pickup_conversation() -> Result<()> {
    let app = common::TestApp::new();
    let group = app.ctx.create_group("Foodsavers").await?;
    let editor = app.ctx.next_user();
    app.ctx.add_editor(group.id, editor).await?;
    let store = app.ctx.create_store(group.id, "Bakery").await?;
    let pickup = app
        .ctx
        .datastore
        .insert_pickup(&PickupDate::new(store.id, app.ctx.now() + Duration::days(1)))
        .await?;

    let (status, body) = app
        .post(&format!("/api/pickups/{}/cancel", pickup.id), editor, json!({"message": "closed for holidays"}))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["cancelled_at"].is_string());

    let conversation = app
        .ctx
        .datastore
        .find_conversation(ConversationType::Pickup, pickup.id)
        .await?
        .expect("pickup conversation");
    let messages = app.ctx.messages_in(conversation.id).await?;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "closed for holidays");
    assert_eq!(messages[0].author_id, editor);

    let (status, _) = app
        .post(&format!("/api/pickups/{}/cancel", pickup.id), editor, json!({"message": "again"}))
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn past_pickups_cannot_be_cancelled() -> Result<()> {
    let app = common::TestApp::new();
    let group = app.ctx.create_group("Foodsavers").await?;
    let editor = app.ctx.next_user();
    app.ctx.add_editor(group.id, editor).await?;
    let store = app.ctx.create_store(group.id, "Bakery").await?;
    let pickup = app
        .ctx
        .datastore
        .insert_pickup(&PickupDate::new(store.id, app.ctx.now() - Duration::days(1)))
        .await?;

    let (status, body) = app
        .post(&format!("/api/pickups/{}/cancel", pickup.id), editor, json!({"message": "too late"}))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
    Ok(())
}
