//! Facade over the two service partitions.
//!
//! `ApiClient` owns one `HttpClient` for the authentication partition and
//! one for the business partition, both sharing the same session. It is the
//! only place that writes the session: `login` stores the token on a
//! successful reply and `logout` clears it.

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{info, warn};

use crate::auth::SharedSession;
use crate::config::Config;
use crate::models::{ApplySelectionParams, Captcha, LoginParams, Paper, SelectionDetail, Student};

use super::{intern, security, selection, thesis, ClientConfig, Envelope, HttpClient};

/// API client for the topic-selection backend.
/// Clone is cheap - both partitions share their connection pools.
#[derive(Clone, Debug)]
pub struct ApiClient {
    auth: HttpClient,
    business: HttpClient,
}

impl ApiClient {
    pub fn new(auth: ClientConfig, business: ClientConfig, session: SharedSession) -> Result<Self> {
        let auth = HttpClient::new(auth, session.clone())
            .context("Failed to configure auth partition")?;
        let business = HttpClient::new(business, session)
            .context("Failed to configure business partition")?;
        Ok(Self { auth, business })
    }

    /// Build both partitions from startup configuration.
    pub fn from_config(config: &Config, session: SharedSession) -> Result<Self> {
        Self::new(config.auth_partition(), config.business_partition(), session)
    }

    pub fn auth(&self) -> &HttpClient {
        &self.auth
    }

    pub fn business(&self) -> &HttpClient {
        &self.business
    }

    pub fn session(&self) -> &SharedSession {
        self.auth.session()
    }

    // ===== Authentication =====

    /// Log in and, if the backend accepts the credentials, persist the
    /// returned token. A rejected login is returned as-is for the caller to
    /// report; the session is left untouched in that case.
    pub async fn login(&self, params: &LoginParams) -> Result<Envelope<String>> {
        let envelope = security::login(&self.auth, params).await?;

        match envelope.data.as_deref() {
            Some(token) if envelope.is_success() && !token.is_empty() => {
                self.session()
                    .set(token)
                    .context("Failed to store session token")?;
                info!(identifier = %params.identifier, "Logged in");
            }
            _ => warn!(code = envelope.code, message = %envelope.message, "Login rejected"),
        }
        Ok(envelope)
    }

    pub fn logout(&self) -> Result<()> {
        self.session().clear().context("Failed to clear session token")?;
        info!("Logged out");
        Ok(())
    }

    pub async fn captcha(&self) -> Result<Envelope<Captcha>> {
        security::get_captcha(&self.auth).await
    }

    // ===== Business =====

    pub async fn thesis_list(&self) -> Result<Envelope<Vec<Paper>>> {
        thesis::get_thesis_list(&self.business).await
    }

    pub async fn unselected_students(&self) -> Result<Envelope<Vec<Student>>> {
        intern::get_unselected_students(&self.business).await
    }

    pub async fn apply_selection(&self, params: &ApplySelectionParams) -> Result<Envelope<Value>> {
        selection::apply_selection(&self.business, params).await
    }

    pub async fn selection_status(&self) -> Result<Envelope<bool>> {
        selection::check_selection_status(&self.business).await
    }

    pub async fn selection_detail(&self) -> Result<Envelope<SelectionDetail>> {
        selection::get_selection_detail(&self.business).await
    }
}
