use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::Error as JsonWebTokenError;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use serde::Deserialize;
use serde::Serialize;

use super::errors::JwtError;

/// JWT token handler for encoding and decoding tokens.
///
/// Generic over the claims type. Signs with HS256 only and refuses any token
/// whose header declares another algorithm, so an attacker cannot pick the
/// verification method.
///
/// The handler verifies structure and signature. Expiry and claim semantics
/// are left to the caller, which gets a fixed validation order that way.
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    previous_decoding_key: Option<DecodingKey>,
    algorithm: Algorithm,
}

impl JwtHandler {
    /// Create a new JWT handler with a secret key.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens (should be stored securely)
    ///
    /// # Returns
    /// JwtHandler instance configured with HS256 algorithm
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes) for HS256
    /// - Store secrets in environment variables or secure vaults, never in code
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            previous_decoding_key: None,
            algorithm: Algorithm::HS256,
        }
    }

    /// Also accept tokens signed with a retired secret.
    ///
    /// The previous secret is only used for verification, never for signing.
    pub fn with_previous_secret(mut self, secret: &[u8]) -> Self {
        self.previous_decoding_key = Some(DecodingKey::from_secret(secret));
        self
    }

    /// Encode claims into a JWT token.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        let header = Header::new(self.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Decode a JWT token and verify its signature.
    ///
    /// # Errors
    /// * `Malformed` - Token is not three base64url segments of valid JSON,
    ///   or the payload does not deserialize into `T`
    /// * `SignatureInvalid` - Signature does not match, or the header declares
    ///   an algorithm other than HS256
    pub fn decode<T: for<'de> Deserialize<'de>>(&self, token: &str) -> Result<T, JwtError> {
        let validation = self.validation();

        match decode::<T>(token, &self.decoding_key, &validation) {
            Ok(token_data) => Ok(token_data.claims),
            Err(e) => {
                let err = map_decode_error(e);
                match (&err, &self.previous_decoding_key) {
                    (JwtError::SignatureInvalid(_), Some(previous)) => {
                        decode::<T>(token, previous, &validation)
                            .map(|token_data| token_data.claims)
                            .map_err(map_decode_error)
                    }
                    _ => Err(err),
                }
            }
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.algorithm);
        // Expiry and required claims are enforced by the token engine
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();
        validation
    }
}

fn map_decode_error(e: JsonWebTokenError) -> JwtError {
    match e.kind() {
        ErrorKind::InvalidSignature => JwtError::SignatureInvalid(e.to_string()),
        ErrorKind::InvalidAlgorithm | ErrorKind::MissingAlgorithm => {
            JwtError::SignatureInvalid(format!("unexpected signing algorithm: {}", e))
        }
        _ => JwtError::Malformed(e.to_string()),
    }
}
