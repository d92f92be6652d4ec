use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::api::channel::{self, ChannelHandle};
use crate::api::error::error_message;
use crate::api::models::{
    Conversation, CreateConversationRequest, HealthStatus, LoginRequest, Message, MessageQuery,
    RegisterRequest, TokenResponse, User,
};
use crate::api::transport::Transport;
use crate::api::ApiError;

/// Where the backend lives.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub api_url: String,
    pub ws_url: String,
    pub timeout: Duration,
}

pub struct ApiClient {
    http: HttpClient,
    api_url: String,
    ws_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(endpoints: &Endpoints) -> Result<Self, ApiError> {
        let http = HttpClient::builder().timeout(endpoints.timeout).build()?;
        Ok(Self {
            http,
            api_url: endpoints.api_url.trim_end_matches('/').to_string(),
            ws_url: endpoints.ws_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    fn with_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(t) => req.bearer_auth(t),
            None => req,
        }
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            let body = serde_json::from_slice::<Value>(&bytes).unwrap_or(Value::Null);
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let resp = self.with_auth(self.http.get(self.endpoint(path))).send().await?;
        Self::decode(resp).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: serde::Serialize,
        T: DeserializeOwned,
    {
        let req = self.http.post(self.endpoint(path)).json(body);
        let resp = self.with_auth(req).send().await?;
        Self::decode(resp).await
    }

    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.get("/health").await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse, ApiError> {
        log::info!("Login request for {username}");
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.post("/v1/users/login", &body).await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<User, ApiError> {
        request.validate()?;
        self.post("/v1/users/register", request).await
    }

    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.get("/v1/users/me").await
    }

    pub async fn users(&self) -> Result<Vec<User>, ApiError> {
        self.get("/v1/users").await
    }

    pub async fn conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        self.get("/v1/conversations").await
    }

    pub async fn create_conversation(
        &self,
        name: &str,
        member_ids: Vec<String>,
    ) -> Result<Conversation, ApiError> {
        let body = CreateConversationRequest {
            name: name.to_string(),
            member_ids,
        };
        self.post("/v1/conversations", &body).await
    }

    pub async fn messages(
        &self,
        conversation_id: &str,
        query: MessageQuery,
    ) -> Result<Vec<Message>, ApiError> {
        let path = format!("/v1/conversations/{conversation_id}/messages");
        let req = self.http.get(self.endpoint(&path)).query(&query);
        let resp = self.with_auth(req).send().await?;
        Self::decode(resp).await
    }

    /// `{ws_url}/ws/{conversation}?token={token}`
    pub fn channel_url(&self, conversation_id: &str) -> Result<Url, ApiError> {
        let token = self.token.as_deref().ok_or(ApiError::NotAuthenticated)?;
        let mut url = Url::parse(&format!("{}/ws/{}", self.ws_url, conversation_id))?;
        url.query_pairs_mut().append_pair("token", token);
        Ok(url)
    }
}

#[async_trait]
impl Transport for ApiClient {
    async fn fetch_messages(
        &self,
        conversation_id: &str,
        query: MessageQuery,
    ) -> Result<Vec<Message>, ApiError> {
        self.messages(conversation_id, query).await
    }

    async fn open_channel(&self, conversation_id: &str) -> Result<ChannelHandle, ApiError> {
        let url = self.channel_url(conversation_id)?;
        channel::connect(conversation_id, &url).await
    }
}
