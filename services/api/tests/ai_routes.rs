//! The LLM and image endpoints, driven through the router with scripted providers.

mod common;

use axum::http::{Method, StatusCode};
use bytes::Bytes;
use common::{json, seeded_store, send, TestApp, TestAppBuilder};
use recipe_finder_core::domain::{ImagePayload, PromptMessage};
use recipe_finder_core::fakes::{MemoryBlobStore, ScriptedImageProvider, ScriptedLlm};
use recipe_finder_core::ports::{DocumentStore, PortError};
use serde_json::json as j;
use std::time::Duration;

const TWO_RECIPES: &str = r#"```json
[
  {"name": "Shakshuka", "ingredients": ["eggs", "tomatoes"], "steps": ["Simmer the sauce.", "Poach the eggs."]},
  {"name": "Broken", "ingredients": [], "steps": ["Nothing to cook."]}
]
```"#;

async fn app_with(llm: ScriptedLlm) -> TestApp {
    TestAppBuilder::new(seeded_store(Vec::new()).await).llm(llm).build()
}

async fn app_with_images(images: ScriptedImageProvider) -> TestApp {
    TestAppBuilder::new(seeded_store(Vec::new()).await).images(images).build()
}

fn png() -> ImagePayload {
    ImagePayload {
        mime_type: "image/png".to_string(),
        data: Bytes::from_static(b"hello"),
    }
}

//=========================================================================================
// Text generation
//=========================================================================================

#[tokio::test]
async fn test_ai_recipes_returns_raw_text_and_normalized_recipes() {
    let app = app_with(ScriptedLlm::replying(TWO_RECIPES)).await;

    let (status, body) = send(
        &app.router,
        json(Method::POST, "/api/ai-recipes", j!({"prompt": "eggs please", "systemPrompt": "Be brief."})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], TWO_RECIPES);
    let recipes = body["recipes"].as_array().unwrap();
    assert_eq!(recipes.len(), 1);
    assert_eq!(recipes[0]["name"], "Shakshuka");
    assert_eq!(recipes[0]["ingredients"][0]["ingredient"], "eggs");

    assert_eq!(
        app.llm.received(),
        vec![vec![
            PromptMessage::System("Be brief.".to_string()),
            PromptMessage::User("eggs please".to_string()),
        ]]
    );
}

#[tokio::test]
async fn test_ai_recipes_rejects_missing_prompt_before_calling_the_llm() {
    let app = app_with(ScriptedLlm::replying(TWO_RECIPES)).await;

    let (status, body) = send(&app.router, json(Method::POST, "/api/ai-recipes", j!({"prompt": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, j!({"error": "Missing prompt"}));

    let (status, _) = send(&app.router, json(Method::POST, "/api/ai-recipes", j!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.llm.received().is_empty());
}

#[tokio::test]
async fn test_provider_errors_surface_verbatim() {
    let app = app_with(ScriptedLlm::failing(PortError::Upstream("quota exceeded".to_string()))).await;

    let (status, body) = send(&app.router, json(Method::POST, "/api/ai-recipes", j!({"prompt": "soup"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, j!({"error": "quota exceeded"}));
}

#[tokio::test]
async fn test_unparseable_output_is_an_empty_list_not_an_error() {
    let app = app_with(ScriptedLlm::replying("Sorry, I can't help with that.")).await;

    let (status, body) = send(&app.router, json(Method::POST, "/api/ai-search", j!({"q": "soup"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recipes"], j!([]));
}

#[tokio::test]
async fn test_ai_search_builds_prompt_from_filters_and_pantry() {
    let app = app_with(ScriptedLlm::replying("[]")).await;

    let request = j!({
        "q": "quick dinner",
        "diet": "vegan",
        "cuisine": "",
        "ingredients": ["chickpeas"],
        "pantry": ["rice", "garlic"]
    });
    let (status, _) = send(&app.router, json(Method::POST, "/api/ai-search", request)).await;
    assert_eq!(status, StatusCode::OK);

    let received = app.llm.received();
    let [PromptMessage::System(system), PromptMessage::User(user)] = received[0].as_slice() else {
        panic!("expected a system and a user message, got {:?}", received[0]);
    };
    assert!(system.contains(r#"["rice","garlic"]"#));
    assert!(user.starts_with("Pantry items available for substitution: rice, garlic\n\n"));
    assert!(user.contains("Create exactly 3 recipes that satisfy ALL of the following:"));
    assert!(user.contains("Diet: vegan"));
    assert!(user.contains("User-required ingredients: chickpeas"));
    assert!(user.contains("User query: quick dinner"));
    assert!(!user.contains("Cuisine:"));
}

#[tokio::test]
async fn test_ai_search_without_filters_asks_for_popular_recipes() {
    let app = app_with(ScriptedLlm::replying("[]")).await;

    send(&app.router, json(Method::POST, "/api/ai-search", j!({}))).await;
    let received = app.llm.received();
    let PromptMessage::User(user) = &received[0][1] else {
        panic!("second message should be the user prompt");
    };
    assert_eq!(
        user,
        "Pantry items available for substitution: (none)\n\nNo filters provided. Propose 3 popular recipes."
    );
}

#[tokio::test]
async fn test_a_single_recipe_object_is_returned_as_a_list() {
    let reply = r#"{"name": "Toast", "ingredients": [{"item": "bread"}], "instructions": "Toast it."}"#;
    let app = app_with(ScriptedLlm::replying(reply)).await;

    let (status, body) = send(&app.router, json(Method::POST, "/api/ai-recipes", j!({"prompt": "toast"}))).await;
    assert_eq!(status, StatusCode::OK);
    let recipes = body["recipes"].as_array().unwrap();
    assert_eq!(recipes.len(), 1);
    assert_eq!(recipes[0]["ingredients"][0]["ingredient"], "bread");
    assert_eq!(recipes[0]["steps"], j!(["Toast it."]));
}

#[tokio::test]
async fn test_ai_search_accepts_nulls_and_ingredient_objects() {
    let app = app_with(ScriptedLlm::replying("[]")).await;

    let request = j!({"q": null, "diet": null, "ingredients": [{"ingredient": "chickpeas", "quantity": 1}]});
    let (status, _) = send(&app.router, json(Method::POST, "/api/ai-search", request)).await;
    assert_eq!(status, StatusCode::OK);

    let received = app.llm.received();
    let PromptMessage::User(user) = &received[0][1] else {
        panic!("second message should be the user prompt");
    };
    assert!(user.contains("User-required ingredients: chickpeas"));
    assert!(!user.contains("Diet:"));
}

//=========================================================================================
// Image generation
//=========================================================================================

#[tokio::test]
async fn test_ai_image_retries_until_an_image_arrives() {
    let app = app_with_images(ScriptedImageProvider::new(vec![Ok(None), Ok(None), Ok(Some(png()))])).await;

    let (status, body) = send(
        &app.router,
        json(Method::POST, "/api/ai-image", j!({"name": "Pad Thai", "ingredients": ["noodles"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, j!({"image_url": "data:image/png;base64,aGVsbG8="}));
    assert_eq!(app.images.calls(), 3);
    assert_eq!(
        app.pause.recorded(),
        vec![Duration::from_millis(1000), Duration::from_millis(2000)]
    );
    assert!(app.images.prompts()[0].contains("Recipe name: \"Pad Thai\""));
}

#[tokio::test]
async fn test_ai_image_gives_up_after_three_attempts() {
    let app = app_with_images(ScriptedImageProvider::always_empty()).await;

    let (status, body) = send(&app.router, json(Method::POST, "/api/ai-image", j!({"name": "Soup"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, j!({"error": "No image data returned after 3 attempts"}));
    assert_eq!(app.images.calls(), 3);
}

#[tokio::test]
async fn test_ai_image_requires_name_or_ingredients() {
    let app = app_with_images(ScriptedImageProvider::returning(png())).await;

    let (status, body) = send(&app.router, json(Method::POST, "/api/ai-image", j!({"ingredients": "eggs"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, j!({"error": "name or ingredients required"}));
    assert_eq!(app.images.calls(), 0);

    let (status, _) = send(&app.router, json(Method::POST, "/api/ai-image", j!({"ingredients": []}))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_saved_image_uploads_and_records_the_url() {
    let app = app_with_images(ScriptedImageProvider::returning(png())).await;
    let row = app
        .docs
        .insert("favorites", vec![j!({"recipe_id": null, "is_ai_recipe": true, "name": "Pad Thai"})])
        .await
        .unwrap();
    let saved_id = row[0]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app.router,
        json(
            Method::POST,
            "/api/saved-image",
            j!({"saved_id": saved_id, "name": "Pad Thai", "ingredients": [{"ingredient": "noodles", "quantity": 200, "unit": "g"}]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let expected_url = format!("https://blobs.test/recipe-images/saved/{saved_id}.png");
    assert_eq!(body, j!({"image_url": expected_url}));

    assert_eq!(
        app.blobs.uploads(),
        vec![(format!("saved/{saved_id}.png"), "image/png".to_string())]
    );
    assert_eq!(app.docs.rows("favorites")[0]["image_url"], expected_url);
    assert!(app.images.prompts()[0].contains("Key ingredients: 200 g noodles"));
}

#[tokio::test]
async fn test_saved_image_requires_saved_id() {
    let app = app_with_images(ScriptedImageProvider::returning(png())).await;

    let (status, body) = send(&app.router, json(Method::POST, "/api/saved-image", j!({"name": "Soup"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, j!({"error": "saved_id required"}));
    assert_eq!(app.images.calls(), 0);
}

#[tokio::test]
async fn test_saved_image_storage_failure_is_a_server_error() {
    let app = TestAppBuilder::new(seeded_store(Vec::new()).await)
        .images(ScriptedImageProvider::returning(png()))
        .blobs(MemoryBlobStore::failing(PortError::Storage("bucket not found".to_string())))
        .build();

    let (status, body) = send(
        &app.router,
        json(Method::POST, "/api/saved-image", j!({"saved_id": "abc", "name": "Soup"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, j!({"error": "bucket not found"}));
}
