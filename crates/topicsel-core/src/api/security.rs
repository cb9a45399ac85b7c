//! Authentication partition endpoints.

use anyhow::Result;

use crate::models::{Captcha, LoginParams};

use super::{Envelope, HttpClient};

pub const LOGIN_PATH: &str = "auth/login";
pub const CAPTCHA_PATH: &str = "auth/captcha";

/// Submit credentials. On success `data` holds the bearer token.
pub async fn login(http: &HttpClient, params: &LoginParams) -> Result<Envelope<String>> {
    http.post(LOGIN_PATH, params).await
}

pub async fn get_captcha(http: &HttpClient) -> Result<Envelope<Captcha>> {
    http.get(CAPTCHA_PATH).await
}
