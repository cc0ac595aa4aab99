//! Federated sign-in
//!
//! A federated sign-in hands the app an ID token. The provider verifies it
//! and turns its claims into an [`AppUser`].

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AuthConfig;
use crate::models::AppUser;
use crate::utils::errors::{AuditError, Result};

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Exchange a federated credential for the account it identifies
    async fn verify_federated_token(&self, token: &str) -> Result<AppUser>;
}

/// Claims carried by a federated ID token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdTokenClaims {
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    pub exp: usize,
    #[serde(default)]
    pub iss: Option<String>,
}

/// Verifies HS256-signed ID tokens with a shared secret
pub struct JwtAuthProvider {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtAuthProvider {
    pub fn new(config: &AuthConfig) -> Result<Self> {
        if config.token_secret.is_empty() {
            return Err(AuditError::Config("Auth token secret is required".to_string()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer.as_str()]);
        }

        Ok(Self {
            decoding_key: DecodingKey::from_secret(config.token_secret.as_bytes()),
            validation,
        })
    }
}

#[async_trait]
impl AuthProvider for JwtAuthProvider {
    async fn verify_federated_token(&self, token: &str) -> Result<AppUser> {
        let decoded = decode::<IdTokenClaims>(token, &self.decoding_key, &self.validation);
        let data = decoded.map_err(|e| {
            warn!(error = %e, "Rejected federated token");
            AuditError::Authentication(format!("Invalid federated credential: {}", e))
        })?;
        let claims = data.claims;

        if claims.sub.is_empty() || claims.email.is_empty() {
            return Err(AuditError::Authentication(
                "Federated credential lacks subject or email".to_string(),
            ));
        }

        debug!(uid = %claims.sub, "Federated token verified");
        let display_name = claims
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| display_name_from_email(&claims.email));

        Ok(AppUser {
            uid: claims.sub,
            email: claims.email,
            display_name,
            photo_url: claims.picture,
            created_at: Utc::now(),
        })
    }
}

fn display_name_from_email(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn config() -> AuthConfig {
        AuthConfig {
            token_secret: "unit-secret".to_string(),
            issuer: None,
        }
    }

    fn token(secret: &str, name: Option<&str>) -> String {
        let claims = IdTokenClaims {
            sub: "uid-1".to_string(),
            email: "ayse@plant.example".to_string(),
            name: name.map(str::to_string),
            picture: None,
            exp: (Utc::now().timestamp() + 3600) as usize,
            iss: None,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[tokio::test]
    async fn test_valid_token_yields_user() {
        let provider = JwtAuthProvider::new(&config()).unwrap();
        let user = provider
            .verify_federated_token(&token("unit-secret", Some("Ayşe")))
            .await
            .unwrap();
        assert_eq!(user.uid, "uid-1");
        assert_eq!(user.display_name, "Ayşe");
    }

    #[tokio::test]
    async fn test_missing_name_falls_back_to_email() {
        let provider = JwtAuthProvider::new(&config()).unwrap();
        let user = provider.verify_federated_token(&token("unit-secret", None)).await.unwrap();
        assert_eq!(user.display_name, "ayse");
    }

    #[tokio::test]
    async fn test_wrong_secret_is_rejected() {
        let provider = JwtAuthProvider::new(&config()).unwrap();
        let result = provider.verify_federated_token(&token("other-secret", None)).await;
        assert!(matches!(result, Err(AuditError::Authentication(_))));
    }
}
