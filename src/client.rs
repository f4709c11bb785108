//! Typed HTTP client for the RecipeBox API.
//!
//! The bearer token is never stored on the client. `register` and `login`
//! return a [`Session`], and every authenticated call takes the session it
//! should act as, so one `ApiClient` can serve several users at once.

use reqwest::{Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    auth::dto::{AuthResponse, PublicUser},
    recipes::{
        dto::{CreateRecipeRequest, DeleteResponse, UpdateRecipeRequest},
        Category, Recipe,
    },
};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("{status}: {message}")]
    Api { status: StatusCode, message: String },
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status(),
        }
    }
}

/// Credentials of one signed-in user.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: PublicUser,
}

impl From<AuthResponse> for Session {
    fn from(r: AuthResponse) -> Self {
        Self {
            token: r.token,
            user: r.user,
        }
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, ClientError> {
        let res = self
            .http
            .post(self.url("/auth/register"))
            .json(&Credentials {
                username: Some(username),
                email,
                password,
            })
            .send()
            .await?;
        decode::<AuthResponse>(res).await.map(Session::from)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let res = self
            .http
            .post(self.url("/auth/login"))
            .json(&Credentials {
                username: None,
                email,
                password,
            })
            .send()
            .await?;
        decode::<AuthResponse>(res).await.map(Session::from)
    }

    pub async fn me(&self, session: &Session) -> Result<PublicUser, ClientError> {
        let res = self
            .http
            .get(self.url("/auth/me"))
            .bearer_auth(&session.token)
            .send()
            .await?;
        decode(res).await
    }

    pub async fn list_recipes(
        &self,
        session: &Session,
        category: Option<Category>,
    ) -> Result<Vec<Recipe>, ClientError> {
        let mut req = self.http.get(self.url("/recipes")).bearer_auth(&session.token);
        if let Some(c) = category {
            req = req.query(&[("category", c.as_str())]);
        }
        decode(req.send().await?).await
    }

    pub async fn search_recipes(
        &self,
        session: &Session,
        query: &str,
    ) -> Result<Vec<Recipe>, ClientError> {
        let res = self
            .http
            .get(self.url("/recipes/search"))
            .bearer_auth(&session.token)
            .query(&[("query", query)])
            .send()
            .await?;
        decode(res).await
    }

    pub async fn create_recipe(
        &self,
        session: &Session,
        body: &CreateRecipeRequest,
    ) -> Result<Recipe, ClientError> {
        let res = self
            .http
            .post(self.url("/recipes"))
            .bearer_auth(&session.token)
            .json(body)
            .send()
            .await?;
        decode(res).await
    }

    pub async fn get_recipe(&self, session: &Session, id: Uuid) -> Result<Recipe, ClientError> {
        let res = self
            .http
            .get(self.url(&format!("/recipes/{id}")))
            .bearer_auth(&session.token)
            .send()
            .await?;
        decode(res).await
    }

    pub async fn update_recipe(
        &self,
        session: &Session,
        id: Uuid,
        body: &UpdateRecipeRequest,
    ) -> Result<Recipe, ClientError> {
        let res = self
            .http
            .put(self.url(&format!("/recipes/{id}")))
            .bearer_auth(&session.token)
            .json(body)
            .send()
            .await?;
        decode(res).await
    }

    pub async fn delete_recipe(
        &self,
        session: &Session,
        id: Uuid,
    ) -> Result<DeleteResponse, ClientError> {
        let res = self
            .http
            .delete(self.url(&format!("/recipes/{id}")))
            .bearer_auth(&session.token)
            .send()
            .await?;
        decode(res).await
    }
}

async fn decode<T: DeserializeOwned>(res: Response) -> Result<T, ClientError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res.json::<T>().await?);
    }
    let message = match res.json::<ErrorBody>().await {
        Ok(body) => body.message,
        Err(_) => status.canonical_reason().unwrap_or("request failed").to_string(),
    };
    Err(ClientError::Api { status, message })
}
