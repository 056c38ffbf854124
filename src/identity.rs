use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

// Set by the sign-in proxy in front of the service.
pub const EMAIL_HEADER: &str = "x-user-email";
pub const NAME_HEADER: &str = "x-user-name";
pub const PHOTO_HEADER: &str = "x-user-photo";

/// Authenticated user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl Identity {
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(String::from)
        };

        Some(Self {
            email: header(EMAIL_HEADER)?,
            display_name: header(NAME_HEADER),
            photo_url: header(PHOTO_HEADER),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_identity_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(Identity::from_headers(&headers), None);

        headers.insert(EMAIL_HEADER, HeaderValue::from_static("  "));
        assert_eq!(Identity::from_headers(&headers), None);

        headers.insert(EMAIL_HEADER, HeaderValue::from_static("admin@example.com"));
        headers.insert(NAME_HEADER, HeaderValue::from_static("Admin"));
        assert_eq!(
            Identity::from_headers(&headers),
            Some(Identity {
                email: "admin@example.com".into(),
                display_name: Some("Admin".into()),
                photo_url: None,
            })
        );
    }
}
