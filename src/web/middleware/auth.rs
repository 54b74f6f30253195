use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;

// Token verification happens at the gateway; here we only lift the already
// validated claims out of the access token so handlers can gate on them.

#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub id: String,
    pub role: String,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

#[derive(Deserialize)]
struct AccessTokenPayload {
    user_id: String,
    role: String,
}

pub async fn require_auth(mut request: Request, next: Next) -> Response {
    let token = bearer_token(&request).or_else(|| cookie_token(&request));

    if let Some(token) = token {
        // JWT payload is the middle segment
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() == 3 {
            if let Ok(payload_bytes) = general_purpose::URL_SAFE_NO_PAD.decode(parts[1]) {
                if let Ok(payload) = serde_json::from_slice::<AccessTokenPayload>(&payload_bytes) {
                    request.extensions_mut().insert(AuthenticatedUser {
                        id: payload.user_id,
                        role: payload.role,
                    });
                    return next.run(request).await;
                }
            }
        }
    }

    Response::builder()
        .status(401)
        .body(axum::body::Body::from("Unauthorized - Please login"))
        .unwrap()
}

fn bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|hv| hv.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn cookie_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(header::COOKIE)
        .and_then(|hv| hv.to_str().ok())
        .and_then(|cookies| {
            cookies
                .split("; ")
                .find(|c| c.starts_with("access_token="))
                .and_then(|c| c.strip_prefix("access_token="))
                .map(str::to_string)
        })
}
