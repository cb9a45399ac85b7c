use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Serialize};

use super::ApiError;

/// Envelope code the backend uses for a successful business operation.
pub const SUCCESS_CODE: i64 = 200;

/// The `{code, data, message}` wrapper every backend reply uses.
///
/// The HTTP layer never looks inside it: a business failure arrives as an
/// `Ok(Envelope)` with a non-success `code`, and it is up to the caller to
/// check `is_success` or call `into_result`.
///
/// `data` is `None` when the reply carries `"data": null` or no `data` at
/// all. Only a JSON object is accepted on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub code: i64,
    pub data: Option<T>,
    pub message: String,
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    /// Convert into the payload.
    ///
    /// A failure code becomes `ApiError::Application` with the code and
    /// message; a success code without data is `ApiError::InvalidResponse`.
    pub fn into_result(self) -> Result<T, ApiError> {
        if !self.is_success() {
            return Err(ApiError::Application {
                code: self.code,
                message: self.message,
            });
        }
        self.data.ok_or_else(|| {
            ApiError::InvalidResponse(format!(
                "Success reply carried no data (message: '{}')",
                self.message
            ))
        })
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        Envelope {
            code: self.code,
            data: self.data.map(f),
            message: self.message,
        }
    }
}

impl<'de, T> Deserialize<'de> for Envelope<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(field_identifier, rename_all = "lowercase")]
        enum Field {
            Code,
            Data,
            Message,
            #[serde(other)]
            Other,
        }

        struct EnvelopeVisitor<T>(PhantomData<T>);

        impl<'de, T> Visitor<'de> for EnvelopeVisitor<T>
        where
            T: Deserialize<'de>,
        {
            type Value = Envelope<T>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an object with code, data and message")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut code: Option<i64> = None;
                let mut data: Option<Option<T>> = None;
                let mut message: Option<Option<String>> = None;

                while let Some(key) = map.next_key::<Field>()? {
                    match key {
                        Field::Code => {
                            if code.is_some() {
                                return Err(de::Error::duplicate_field("code"));
                            }
                            code = Some(map.next_value()?);
                        }
                        Field::Data => {
                            if data.is_some() {
                                return Err(de::Error::duplicate_field("data"));
                            }
                            data = Some(map.next_value()?);
                        }
                        Field::Message => {
                            if message.is_some() {
                                return Err(de::Error::duplicate_field("message"));
                            }
                            message = Some(map.next_value()?);
                        }
                        Field::Other => {
                            map.next_value::<IgnoredAny>()?;
                        }
                    }
                }

                Ok(Envelope {
                    code: code.ok_or_else(|| de::Error::missing_field("code"))?,
                    data: data.flatten(),
                    message: message.flatten().unwrap_or_default(),
                })
            }
        }

        deserializer.deserialize_map(EnvelopeVisitor(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_parse_envelope_with_list() {
        let json = r#"{"code":200,"data":[1,2,3],"message":"ok"}"#;
        let env: Envelope<Vec<i32>> = serde_json::from_str(json).unwrap();
        assert!(env.is_success());
        assert_eq!(env.data, Some(vec![1, 2, 3]));
        assert_eq!(env.message, "ok");
    }

    #[test]
    fn test_missing_data_is_none() {
        // The apply endpoint answers without a data field
        let json = r#"{"code":200,"message":"submitted"}"#;
        let env: Envelope<Value> = serde_json::from_str(json).unwrap();
        assert_eq!(env.data, None);
        assert_eq!(env.message, "submitted");
    }

    #[test]
    fn test_null_data_on_failure() {
        let json = r#"{"code":401,"data":null,"message":"captcha mismatch"}"#;
        let env: Envelope<String> = serde_json::from_str(json).unwrap();
        assert!(!env.is_success());
        assert_eq!(env.data, None);
        assert_eq!(env.message, "captcha mismatch");

        let env: Envelope<Vec<i32>> = serde_json::from_str(r#"{"code":500}"#).unwrap();
        assert_eq!(env.data, None);
    }

    #[test]
    fn test_success_without_data_is_invalid_response() {
        #[derive(Debug, Deserialize)]
        struct Detail {
            #[allow(dead_code)]
            title: String,
        }

        for json in [
            r#"{"code":200,"data":null,"message":"ok"}"#,
            r#"{"code":200,"message":"ok"}"#,
        ] {
            let env: Envelope<Detail> = serde_json::from_str(json).unwrap();
            assert!(env.is_success());
            match env.into_result() {
                Err(ApiError::InvalidResponse(msg)) => assert!(msg.contains("no data")),
                other => panic!("unexpected result: {:?}", other),
            }
        }

        let env: Envelope<bool> =
            serde_json::from_str(r#"{"code":200,"data":null}"#).unwrap();
        assert!(matches!(env.into_result(), Err(ApiError::InvalidResponse(_))));
    }

    #[test]
    fn test_success_with_false_data_is_kept() {
        let env: Envelope<bool> =
            serde_json::from_str(r#"{"code":200,"data":false,"message":"ok"}"#).unwrap();
        assert_eq!(env.into_result().unwrap(), false);
    }

    #[test]
    fn test_missing_code_is_invalid() {
        assert!(serde_json::from_str::<Envelope<bool>>(r#"{"data":true}"#).is_err());
    }

    #[test]
    fn test_array_body_is_rejected() {
        assert!(serde_json::from_str::<Envelope<String>>(r#"[200,"tok","ok"]"#).is_err());
        assert!(serde_json::from_str::<Envelope<String>>(r#""ok""#).is_err());
    }

    #[test]
    fn test_duplicate_code_is_rejected() {
        assert!(serde_json::from_str::<Envelope<bool>>(r#"{"code":200,"code":500}"#).is_err());
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let env: Envelope<bool> =
            serde_json::from_str(r#"{"code":200,"data":true,"timestamp":1700000000}"#).unwrap();
        assert_eq!(env.data, Some(true));
    }

    #[test]
    fn test_missing_or_null_message_defaults_to_empty() {
        let env: Envelope<bool> = serde_json::from_str(r#"{"code":200,"data":true}"#).unwrap();
        assert_eq!(env.message, "");
        let env: Envelope<bool> =
            serde_json::from_str(r#"{"code":200,"data":true,"message":null}"#).unwrap();
        assert_eq!(env.message, "");
    }

    #[test]
    fn test_into_result_failure_keeps_code_and_message() {
        let env: Envelope<()> = Envelope {
            code: 4001,
            data: None,
            message: "thesis is full".to_string(),
        };
        assert!(!env.is_success());
        match env.into_result() {
            Err(ApiError::Application { code, message }) => {
                assert_eq!(code, 4001);
                assert_eq!(message, "thesis is full");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_map_preserves_code() {
        let env = Envelope {
            code: 200,
            data: Some(vec!["a", "b"]),
            message: String::new(),
        };
        let mapped = env.map(|v| v.len());
        assert_eq!(mapped.data, Some(2));
        assert_eq!(mapped.code, 200);
    }
}
