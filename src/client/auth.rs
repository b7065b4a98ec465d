use std::fmt;

use reqwest::header::HeaderValue;
use reqwest::RequestBuilder;

use crate::error::{ClientError, ClientResult};

pub const API_KEY_HEADER: &str = "X-API-Key";
pub const PUBLIC_KEY_HEADER: &str = "X-Public-Key";

/// Attaches the deployment's credential to every outgoing request.
pub trait AuthStrategy: Send + Sync + fmt::Debug {
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder;

    /// Short name for logs.
    fn scheme(&self) -> &'static str;
}

fn sensitive(value: String) -> ClientResult<HeaderValue> {
    let mut header = HeaderValue::from_str(&value)
        .map_err(|e| ClientError::InvalidCredential(e.to_string()))?;
    header.set_sensitive(true);
    Ok(header)
}

/// `X-API-Key: Bearer <key>`
#[derive(Debug, Clone)]
pub struct ApiKeyAuth {
    value: HeaderValue,
}

impl ApiKeyAuth {
    pub fn new(api_key: &str) -> ClientResult<Self> {
        if api_key.trim().is_empty() {
            return Err(ClientError::InvalidCredential("empty API key".into()));
        }
        Ok(Self { value: sensitive(format!("Bearer {}", api_key.trim()))? })
    }
}

impl AuthStrategy for ApiKeyAuth {
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(API_KEY_HEADER, self.value.clone())
    }

    fn scheme(&self) -> &'static str {
        "api-key"
    }
}

/// `X-Public-Key: <base64 DER public key>`
#[derive(Debug, Clone)]
pub struct PublicKeyAuth {
    value: HeaderValue,
}

impl PublicKeyAuth {
    pub fn new(public_key: &str) -> ClientResult<Self> {
        if public_key.trim().is_empty() {
            return Err(ClientError::InvalidCredential("empty public key".into()));
        }
        Ok(Self { value: sensitive(public_key.trim().to_string())? })
    }
}

impl AuthStrategy for PublicKeyAuth {
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(PUBLIC_KEY_HEADER, self.value.clone())
    }

    fn scheme(&self) -> &'static str {
        "public-key"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_of(auth: &dyn AuthStrategy, name: &str) -> Option<String> {
        let request = auth
            .authorize(reqwest::Client::new().get("http://localhost/"))
            .build()
            .unwrap();
        request.headers().get(name).map(|v| v.to_str().unwrap().to_string())
    }

    #[test]
    fn test_api_key_header() {
        let auth = ApiKeyAuth::new("abcdef12345").unwrap();
        assert_eq!(header_of(&auth, API_KEY_HEADER).as_deref(), Some("Bearer abcdef12345"));
        assert_eq!(header_of(&auth, PUBLIC_KEY_HEADER), None);
    }

    #[test]
    fn test_public_key_header() {
        let auth = PublicKeyAuth::new("MFYwEAYHKoZIzj0CAQYFK4EEAAoDQgAE").unwrap();
        assert_eq!(
            header_of(&auth, PUBLIC_KEY_HEADER).as_deref(),
            Some("MFYwEAYHKoZIzj0CAQYFK4EEAAoDQgAE")
        );
    }

    #[test]
    fn test_credentials_are_not_debug_printed() {
        let auth = ApiKeyAuth::new("topsecret").unwrap();
        assert!(!format!("{:?}", auth).contains("topsecret"));
    }

    #[test]
    fn test_rejects_unusable_values() {
        assert!(matches!(ApiKeyAuth::new("  "), Err(ClientError::InvalidCredential(_))));
        assert!(matches!(PublicKeyAuth::new("line\nbreak"), Err(ClientError::InvalidCredential(_))));
    }
}
