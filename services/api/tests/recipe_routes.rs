//! Search, recipe detail, facets and health against a real in-memory SQLite dataset.

mod common;

use axum::http::StatusCode;
use common::{get, seeded_store, send, Seed, TestAppBuilder};
use recipe_finder_core::fakes::MemoryRecipeStore;
use recipe_finder_core::ports::PortError;
use serde_json::{json, Value};
use std::sync::Arc;

fn pasta_dataset() -> Vec<Seed> {
    vec![
        Seed {
            id: 1,
            name: "Garlic Butter Pasta",
            minutes: 20,
            rating: 4.8,
            popularity: 300,
            cuisine: "Italian",
            diet: "vegetarian",
            description: "Pasta tossed in garlic butter.",
            steps: "Boil the pasta. Melt butter with garlic. Toss.",
            ingredients: &["pasta", "garlic", "butter"],
        },
        Seed {
            id: 2,
            name: "Pasta Bolognese",
            minutes: 90,
            rating: 4.5,
            popularity: 900,
            cuisine: "Italian",
            diet: "",
            description: "Slow cooked meat sauce over pasta.",
            steps: "Brown the beef. Simmer the sauce. Serve over pasta.",
            ingredients: &["pasta", "beef", "tomato"],
        },
        Seed {
            id: 3,
            name: "Pasta Salad",
            minutes: 15,
            rating: 3.9,
            popularity: 120,
            cuisine: "American",
            diet: "vegetarian",
            description: "A cold pasta salad.",
            steps: "Cook pasta. Chill. Mix with vegetables.",
            ingredients: &["pasta", "cucumber", "mayonnaise"],
        },
        Seed {
            id: 4,
            name: "Chicken Tacos",
            minutes: 30,
            rating: 4.2,
            popularity: 500,
            cuisine: "Mexican",
            diet: "",
            description: "Street-style tacos.",
            steps: "Grill the chicken. Warm the tortillas. Assemble.",
            ingredients: &["chicken", "tortilla", "lime"],
        },
    ]
}

fn ids(body: &Value) -> Vec<i64> {
    body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_search_matches_terms_and_reports_totals() {
    let app = TestAppBuilder::new(seeded_store(pasta_dataset()).await).build();

    let (status, body) = send(&app.router, get("/api/search?q=pasta")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    assert_eq!(body["page"], 1);
    assert_eq!(body["page_size"], 20);
    assert_eq!(body["pages"], 1);
    let mut found = ids(&body);
    found.sort();
    assert_eq!(found, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_multi_term_search_requires_every_term() {
    let app = TestAppBuilder::new(seeded_store(pasta_dataset()).await).build();

    let (status, body) = send(&app.router, get("/api/search?q=garlic%20pasta")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![1]);
}

#[tokio::test]
async fn test_filters_apply_with_and_without_text() {
    let app = TestAppBuilder::new(seeded_store(pasta_dataset()).await).build();

    let (_, body) = send(&app.router, get("/api/search?q=pasta&cuisine=Italian&max_minutes=30")).await;
    assert_eq!(ids(&body), vec![1]);

    let (_, body) = send(&app.router, get("/api/search?diet=vegetarian&sort=rating")).await;
    assert_eq!(body["total"], 2);
    assert_eq!(ids(&body), vec![1, 3]);

    let (_, body) = send(&app.router, get("/api/search?min_rating=4.4&sort=popularity")).await;
    assert_eq!(ids(&body), vec![2, 1]);
}

#[tokio::test]
async fn test_filter_values_are_never_interpreted_as_sql() {
    let app = TestAppBuilder::new(seeded_store(pasta_dataset()).await).build();

    let (status, body) = send(&app.router, get("/api/search?q=pasta&cuisine=Italian%27%20OR%201%3D1%20--")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
    assert_eq!(body["items"], json!([]));
}

#[tokio::test]
async fn test_empty_query_returns_an_empty_page() {
    let app = TestAppBuilder::new(seeded_store(pasta_dataset()).await).build();

    let (status, body) = send(&app.router, get("/api/search")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
    assert_eq!(body["pages"], 0);
    assert_eq!(body["items"], json!([]));
}

#[tokio::test]
async fn test_pages_partition_the_result_set() {
    let app = TestAppBuilder::new(seeded_store(pasta_dataset()).await).build();

    let mut seen = Vec::new();
    for page in 1..=2 {
        let uri = format!("/api/search?q=pasta&sort=minutes-asc&page_size=2&page={page}");
        let (_, body) = send(&app.router, get(&uri)).await;
        assert_eq!(body["total"], 3);
        assert_eq!(body["pages"], 2);
        seen.extend(ids(&body));
    }
    assert_eq!(seen, vec![3, 1, 2]);

    let (_, body) = send(&app.router, get("/api/search?q=pasta&page=9")).await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["items"], json!([]));
}

#[tokio::test]
async fn test_malformed_parameters_fall_back_to_defaults() {
    let app = TestAppBuilder::new(seeded_store(pasta_dataset()).await).build();

    let (status, body) = send(
        &app.router,
        get("/api/search?q=pasta&page=abc&page_size=500&min_rating=lots&sort=SPICY"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 1);
    assert_eq!(body["page_size"], 50);
    assert_eq!(body["total"], 3);
}

#[tokio::test]
async fn test_relevance_prefers_the_stronger_match() {
    // Filler rows keep "lemon" rare enough for bm25 to weigh it.
    let mut seeds: Vec<Seed> = (20..24)
        .map(|id| Seed {
            id,
            name: "Plain Rice",
            ingredients: &["rice"],
            ..Default::default()
        })
        .collect();
    seeds.extend([
        Seed {
            id: 10,
            name: "Weeknight Stew",
            description: "Hearty, with a hint of lemon.",
            steps: "Simmer everything for an hour.",
            ingredients: &["beef", "carrot"],
            ..Default::default()
        },
        Seed {
            id: 11,
            name: "Lemon Tart",
            description: "A bright lemon tart.",
            steps: "Make the lemon curd. Fill the shell with lemon curd.",
            ingredients: &["lemon", "sugar", "butter"],
            ..Default::default()
        },
    ]);
    let app = TestAppBuilder::new(seeded_store(seeds).await).build();

    let (_, body) = send(&app.router, get("/api/search?q=lemon")).await;
    assert_eq!(ids(&body), vec![11, 10]);
    let scores: Vec<f64> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["score"].as_f64().unwrap())
        .collect();
    assert!(scores[0] <= scores[1]);
}

#[tokio::test]
async fn test_recipe_detail_and_errors() {
    let app = TestAppBuilder::new(seeded_store(pasta_dataset()).await).build();

    let (status, body) = send(&app.router, get("/api/recipes/4")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Chicken Tacos");
    assert_eq!(body["ingredients"], json!(["chicken", "tortilla", "lime"]));
    assert_eq!(body["nutrition"], json!([250.0, 12.0, 3.5]));
    assert_eq!(body["n_ingredients"], 3);

    let (status, body) = send(&app.router, get("/api/recipes/999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Not found"}));

    let (status, body) = send(&app.router, get("/api/recipes/abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "invalid id"}));
}

#[tokio::test]
async fn test_facets_count_non_empty_values() {
    let mut seeds = Vec::new();
    for id in 1..=10 {
        let cuisine = match id {
            1..=5 => "Italian",
            6..=8 => "Mexican",
            _ => "",
        };
        seeds.push(Seed {
            id,
            name: "Dish",
            cuisine,
            diet: if id % 2 == 0 { "vegan" } else { "" },
            ..Default::default()
        });
    }
    let app = TestAppBuilder::new(seeded_store(seeds).await).build();

    let (status, body) = send(&app.router, get("/api/facets")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["cuisines"],
        json!([{"name": "Italian", "count": 5}, {"name": "Mexican", "count": 3}])
    );
    assert_eq!(body["diets"], json!([{"name": "vegan", "count": 5}]));
}

#[tokio::test]
async fn test_health_reports_the_database() {
    let app = TestAppBuilder::new(seeded_store(Vec::new()).await).build();
    let (status, body) = send(&app.router, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true, "db": "./recipes.db"}));

    let broken = Arc::new(MemoryRecipeStore::unavailable(PortError::Unexpected("disk I/O error".to_string())));
    let app = TestAppBuilder::new(broken).build();
    let (status, body) = send(&app.router, get("/api/health")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["ok"], false);
    assert!(body["error"].as_str().unwrap().contains("disk I/O error"));
}
