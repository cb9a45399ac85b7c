use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginParams {
    /// Account kind, e.g. `STUDENT`
    pub user_type: String,
    pub identifier: String,
    pub password: String,
    pub captcha: String,
    pub captcha_key: String,
}

// Hand-written so the password never ends up in logs
impl fmt::Debug for LoginParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginParams")
            .field("user_type", &self.user_type)
            .field("identifier", &self.identifier)
            .field("password", &"***")
            .field("captcha", &self.captcha)
            .field("captcha_key", &self.captcha_key)
            .finish()
    }
}

/// CAPTCHA challenge. `data` is the image payload, usually a data URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Captcha {
    pub key: String,
    pub data: String,
}

impl Captcha {
    /// Split a `data:<mime>;base64,<payload>` URL into its mime type and
    /// payload. Returns `None` when `data` is not a data URL.
    pub fn data_url_parts(&self) -> Option<(&str, &str)> {
        let rest = self.data.strip_prefix("data:")?;
        let (meta, payload) = rest.split_once(',')?;
        let mime = meta.split(';').next().unwrap_or_default();
        Some((mime, payload))
    }
}
