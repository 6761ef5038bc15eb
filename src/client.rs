use crate::errors::{ApiError, ApiResult};
use crate::models::{ActivePatch, FieldErrors, LoginRequest, Member, MemberId, MemberPayload, MemberReplace, TokenPair};
use crate::session::SessionProvider;
use reqwest::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    Client, Method, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

pub const MEMBERS_PATH: &str = "/api/gyms/members/";
pub const TOKEN_PATH: &str = "/api/token/";

pub fn member_path(id: MemberId) -> String {
    format!("{MEMBERS_PATH}{id}/")
}

/// Authenticated JSON client for the gym backend.
///
/// Every request carries `Content-Type: application/json` and, when the
/// session holds one, `Authorization: Bearer <token>`. No timeout is set:
/// failures come only from HTTP status or transport errors.
#[derive(Clone)]
pub struct RemoteClient {
    http: Client,
    base_url: String,
    session: Arc<dyn SessionProvider>,
}

impl RemoteClient {
    pub fn new(base_url: impl Into<String>, session: Arc<dyn SessionProvider>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: Client::new(),
            base_url,
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.session.token().is_some()
    }

    /// Sends one request relative to the base URL and classifies the outcome.
    /// A 2xx with an empty body yields `Value::Null`.
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> ApiResult<Value> {
        self.dispatch(method, path, body, true).await
    }

    pub async fn get(&self, path: &str) -> ApiResult<Value> {
        self.send::<()>(Method::GET, path, None).await
    }

    async fn dispatch<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        authorize: bool,
    ) -> ApiResult<Value> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!(%method, path, "sending request");

        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, "application/json");
        if authorize {
            if let Some(token) = self.session.token() {
                request = request.header(AUTHORIZATION, format!("Bearer {token}"));
            }
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|err| {
            warn!(%method, path, "request could not be delivered: {err}");
            transport_error(err)
        })?;

        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        if status == StatusCode::UNAUTHORIZED {
            warn!(%method, path, "backend rejected the credentials");
            return Err(ApiError::Unauthorized);
        }

        if !status.is_success() {
            warn!(%method, path, status = status.as_u16(), "request failed");
            return Err(ApiError::RequestFailed {
                status: status.as_u16(),
                detail: parse_detail(&text),
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|err| ApiError::InvalidResponse(err.to_string()))
    }

    pub async fn list_members(&self) -> ApiResult<Vec<Member>> {
        decode(self.get(MEMBERS_PATH).await?)
    }

    pub async fn create_member(&self, payload: &MemberPayload) -> ApiResult<Member> {
        decode(self.send(Method::POST, MEMBERS_PATH, Some(payload)).await?)
    }

    pub async fn replace_member(&self, id: MemberId, payload: &MemberPayload) -> ApiResult<Member> {
        let body = MemberReplace { id, payload };
        decode(self.send(Method::PUT, &member_path(id), Some(&body)).await?)
    }

    pub async fn set_member_active(&self, id: MemberId, is_active: bool) -> ApiResult<Member> {
        let body = ActivePatch { is_active };
        decode(self.send(Method::PATCH, &member_path(id), Some(&body)).await?)
    }

    pub async fn delete_member(&self, id: MemberId) -> ApiResult<()> {
        self.send::<()>(Method::DELETE, &member_path(id), None).await?;
        Ok(())
    }

    /// Exchanges credentials for a token pair. The request goes out without
    /// a bearer header; a 401 means the credentials were wrong.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<TokenPair> {
        let mut errors = FieldErrors::default();
        if username.trim().is_empty() {
            errors.insert("username", "is required");
        }
        if password.trim().is_empty() {
            errors.insert("password", "is required");
        }
        errors.into_result().map_err(ApiError::ValidationFailed)?;

        let body = LoginRequest { username: username.trim(), password };
        let tokens: TokenPair = decode(self.dispatch(Method::POST, TOKEN_PATH, Some(&body), false).await?)?;
        if tokens.access.is_empty() {
            return Err(ApiError::InvalidResponse("token response without access token".into()));
        }
        Ok(tokens)
    }
}

pub fn decode<T: DeserializeOwned>(value: Value) -> ApiResult<T> {
    serde_json::from_value(value).map_err(|err| ApiError::InvalidResponse(err.to_string()))
}

fn transport_error(err: reqwest::Error) -> ApiError {
    if err.is_decode() {
        ApiError::InvalidResponse(err.to_string())
    } else {
        ApiError::ConnectionFailed(err.to_string())
    }
}

fn parse_detail(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string())))
}
