use std::sync::Arc;

use recipebox::{
    app::build_app,
    client::{ApiClient, Session},
    config::{AppConfig, JwtConfig},
    recipes::{
        dto::{CreateRecipeRequest, UpdateRecipeRequest},
        Category,
    },
    state::AppState,
};
use reqwest::StatusCode;

async fn spawn_app() -> ApiClient {
    let config = AppConfig {
        database_url: None,
        jwt: JwtConfig {
            secret: "integration-secret".into(),
            issuer: "recipebox-it".into(),
            audience: "recipebox-it-users".into(),
            ttl_minutes: 10,
        },
        conceal_foreign_recipes: false,
    };
    let app = build_app(AppState::in_memory(Arc::new(config)));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    ApiClient::new(format!("http://{addr}"))
}

fn soup(title: &str, ingredients: &str, category: Category) -> CreateRecipeRequest {
    CreateRecipeRequest {
        title: Some(title.into()),
        ingredients: Some(ingredients.into()),
        instructions: Some("simmer".into()),
        category: Some(category.to_string()),
        photo_url: Some("https://img.example/soup.jpg".into()),
        cooking_time: Some(40.0),
    }
}

async fn sign_up(client: &ApiClient, name: &str) -> Session {
    client
        .register(name, &format!("{name}@example.com"), "long-enough-pw")
        .await
        .unwrap()
}

#[tokio::test]
async fn two_sessions_share_one_client_without_leaking() {
    let client = spawn_app().await;
    let ana = sign_up(&client, "ana").await;
    let bo = sign_up(&client, "bo").await;

    assert_eq!(client.me(&ana).await.unwrap().username, "ana");
    assert_eq!(client.me(&bo).await.unwrap().username, "bo");

    let minestrone = client
        .create_recipe(&ana, &soup("Minestrone", "beans, pasta", Category::Lunch))
        .await
        .unwrap();
    assert_eq!(minestrone.owner, ana.user.id);

    let err = client.get_recipe(&bo, minestrone.id).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
    assert!(client.list_recipes(&bo, None).await.unwrap().is_empty());
    assert!(client.search_recipes(&bo, "bean").await.unwrap().is_empty());

    let hits = client.search_recipes(&ana, "BEAN").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, minestrone.id);
}

#[tokio::test]
async fn full_recipe_lifecycle() {
    let client = spawn_app().await;
    sign_up(&client, "ana").await;
    let ana = client.login("ana@example.com", "long-enough-pw").await.unwrap();

    let gazpacho = client
        .create_recipe(&ana, &soup("Gazpacho", "tomato, cucumber", Category::Lunch))
        .await
        .unwrap();
    client
        .create_recipe(&ana, &soup("Panna Cotta", "cream", Category::Dessert))
        .await
        .unwrap();

    let lunches = client.list_recipes(&ana, Some(Category::Lunch)).await.unwrap();
    assert_eq!(lunches.len(), 1);
    assert_eq!(lunches[0].id, gazpacho.id);

    let updated = client
        .update_recipe(
            &ana,
            gazpacho.id,
            &UpdateRecipeRequest {
                cooking_time: Some(15.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.cooking_time, 15);
    assert_eq!(updated.title, "Gazpacho");

    let deleted = client.delete_recipe(&ana, gazpacho.id).await.unwrap();
    assert_eq!(deleted.id, gazpacho.id);
    let err = client.delete_recipe(&ana, gazpacho.id).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
}

#[tokio::test]
async fn bad_credentials_and_missing_fields() {
    let client = spawn_app().await;
    let ana = sign_up(&client, "ana").await;

    let err = client.login("ana@example.com", "wrong-password").await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));

    let err = client
        .register("ana", "ana@example.com", "long-enough-pw")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::CONFLICT));

    let mut partial = soup("Broth", "bones", Category::Dinner);
    partial.photo_url = None;
    let err = client.create_recipe(&ana, &partial).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    assert!(client.list_recipes(&ana, None).await.unwrap().is_empty());

    let forged = Session {
        token: format!("{}x", ana.token),
        user: ana.user.clone(),
    };
    let err = client.me(&forged).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
}
