//! Signed-claims codec for session tokens.
//!
//! Tokens are HMAC-signed JWTs. Verification distinguishes an expired token
//! from an invalid one so the session strategy can renew the former.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::claims::Claims;
use crate::error::TokenError;

/// Outcome of verifying a token.
#[derive(Debug)]
pub enum Verification {
    /// Signature and every constraint check out.
    Valid(Claims),
    /// Signature is valid but the token has expired.
    Expired,
    /// Bad signature, malformed token, or constraint mismatch.
    Invalid(TokenError),
}

/// Codec configuration.
#[derive(Debug, Clone)]
pub struct CodecConfig {
    /// Signing algorithm.
    pub algorithm: Algorithm,

    /// Required audience (if any).
    pub audience: Option<String>,

    /// Required issuer (if any).
    pub issuer: Option<String>,

    /// Leeway in seconds for the expiration check.
    pub leeway_secs: u64,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::HS256,
            audience: None,
            issuer: None,
            leeway_secs: 0,
        }
    }
}

/// Signs and verifies session tokens with a server-held secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    config: CodecConfig,
}

impl TokenCodec {
    /// Create a codec with an HMAC secret.
    pub fn with_secret(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            config: CodecConfig::default(),
        }
    }

    /// Require the given audience when verifying.
    pub fn with_audience(mut self, audience: Option<String>) -> Self {
        self.config.audience = audience;
        self
    }

    /// Require the given issuer when verifying.
    pub fn with_issuer(mut self, issuer: Option<String>) -> Self {
        self.config.issuer = issuer;
        self
    }

    /// Set the leeway for the expiration check.
    pub fn with_leeway(mut self, secs: u64) -> Self {
        self.config.leeway_secs = secs;
        self
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Sign claims into a token.
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(self.config.algorithm), claims, &self.encoding_key)
            .map_err(TokenError::Encode)
    }

    /// Verify signature, expiry, audience and issuer.
    pub fn verify(&self, token: &str) -> Verification {
        match decode::<Claims>(token, &self.decoding_key, &self.validation(true)) {
            Ok(data) => Verification::Valid(data.claims),
            Err(err) => match TokenError::from(err) {
                TokenError::Expired => Verification::Expired,
                other => Verification::Invalid(other),
            },
        }
    }

    /// Verify everything except expiry.
    pub fn verify_ignoring_expiry(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation(false))
            .map(|data| data.claims)
            .map_err(TokenError::from)
    }

    /// Read claims without checking the signature or any constraint.
    ///
    /// Only for revocation, where the worst a forged token can do is name a
    /// token identifier to delete.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.config.algorithm);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }

    fn validation(&self, validate_exp: bool) -> Validation {
        let mut validation = Validation::new(self.config.algorithm);
        validation.leeway = self.config.leeway_secs;
        validation.validate_exp = validate_exp;

        match self.config.audience {
            Some(ref aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        if let Some(ref iss) = self.config.issuer {
            validation.set_issuer(&[iss]);
        }

        validation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::get_current_timestamp;

    fn claims_expiring_at(exp: u64) -> Claims {
        let mut claims = Claims::new("test-user");
        claims.iat = get_current_timestamp();
        claims.exp = exp;
        claims
    }

    fn valid_claims() -> Claims {
        claims_expiring_at(get_current_timestamp() + 3600)
    }

    #[test]
    fn test_sign_and_verify() {
        let codec = TokenCodec::with_secret(b"test-secret");
        let claims = valid_claims();
        let token = codec.sign(&claims).unwrap();

        match codec.verify(&token) {
            Verification::Valid(verified) => {
                assert_eq!(verified.sub, "test-user");
                assert_eq!(verified.jti, claims.jti);
            }
            other => panic!("expected valid token, got {other:?}"),
        }
    }

    #[test]
    fn test_expired_token_is_distinguished() {
        let codec = TokenCodec::with_secret(b"test-secret");
        let token = codec
            .sign(&claims_expiring_at(get_current_timestamp() - 3600))
            .unwrap();

        assert!(matches!(codec.verify(&token), Verification::Expired));

        let claims = codec.verify_ignoring_expiry(&token).unwrap();
        assert_eq!(claims.sub, "test-user");
    }

    #[test]
    fn test_expiry_is_exact_unless_leeway_is_set() {
        let claims = claims_expiring_at(get_current_timestamp() - 30);
        let strict = TokenCodec::with_secret(b"test-secret");
        let token = strict.sign(&claims).unwrap();
        assert!(matches!(strict.verify(&token), Verification::Expired));

        let lenient = TokenCodec::with_secret(b"test-secret").with_leeway(60);
        assert!(matches!(lenient.verify(&token), Verification::Valid(_)));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let signer = TokenCodec::with_secret(b"wrong-secret");
        let codec = TokenCodec::with_secret(b"correct-secret");
        let token = signer.sign(&valid_claims()).unwrap();

        assert!(matches!(codec.verify(&token), Verification::Invalid(_)));
        assert!(codec.verify_ignoring_expiry(&token).is_err());
    }

    #[test]
    fn test_expired_token_with_wrong_secret_is_invalid() {
        let signer = TokenCodec::with_secret(b"wrong-secret");
        let codec = TokenCodec::with_secret(b"correct-secret");
        let token = signer
            .sign(&claims_expiring_at(get_current_timestamp() - 3600))
            .unwrap();

        assert!(matches!(codec.verify(&token), Verification::Invalid(_)));
    }

    #[test]
    fn test_malformed_token_is_invalid() {
        let codec = TokenCodec::with_secret(b"test-secret");
        assert!(matches!(codec.verify("not-a-token"), Verification::Invalid(_)));
        assert!(codec.decode("not-a-token").is_err());
    }

    #[test]
    fn test_issuer_and_audience_constraints() {
        let codec = TokenCodec::with_secret(b"test-secret")
            .with_issuer(Some("passgate".into()))
            .with_audience(Some("web".into()));

        let mut claims = valid_claims();
        claims.iss = Some("passgate".into());
        claims.aud = Some("web".into());
        let good = codec.sign(&claims).unwrap();
        assert!(matches!(codec.verify(&good), Verification::Valid(_)));

        claims.iss = Some("someone-else".into());
        let bad_issuer = codec.sign(&claims).unwrap();
        assert!(matches!(codec.verify(&bad_issuer), Verification::Invalid(_)));

        claims.iss = Some("passgate".into());
        claims.aud = Some("mobile".into());
        let bad_audience = codec.sign(&claims).unwrap();
        assert!(matches!(codec.verify(&bad_audience), Verification::Invalid(_)));
    }

    #[test]
    fn test_decode_skips_signature() {
        let signer = TokenCodec::with_secret(b"other-secret");
        let codec = TokenCodec::with_secret(b"test-secret");
        let claims = claims_expiring_at(1);
        let token = signer.sign(&claims).unwrap();

        let decoded = codec.decode(&token).unwrap();
        assert_eq!(decoded.jti, claims.jti);
    }
}
