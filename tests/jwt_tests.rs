use alumni_backend::config::JwtConfig;
use alumni_backend::util::jwt::*;
use chrono::Utc;
use std::collections::HashSet;

// TEST_JWT_* variables win when set, otherwise the built-in test config
fn create_test_jwt_utils() -> JwtTokenUtilsImpl {
    JwtTokenUtilsImpl::new(JwtConfig::from_test_env().unwrap_or_default())
}

const USER_ID: &str = "65f1c0a2b3d4e5f601234567";
const EMAIL: &str = "amina@example.com";

#[test]
fn test_token_type_as_str() {
    assert_eq!(TokenType::Access.as_str(), "access");
    assert_eq!(TokenType::Refresh.as_str(), "refresh");
}

#[test]
fn test_generate_token_pair_success() {
    let jwt = create_test_jwt_utils();
    let pair = jwt.generate_token_pair(USER_ID, EMAIL, "alumni").unwrap();

    assert_eq!(pair.token_type, "Bearer");
    assert_eq!(pair.expires_in, jwt.jwt_config.access_token_expiration * 60);
    assert_ne!(pair.access_token, pair.refresh_token);

    let access = jwt.validate_access_token(&pair.access_token).unwrap();
    assert_eq!(access.sub, USER_ID);
    assert_eq!(access.email, EMAIL);
    assert_eq!(access.role, "alumni");
    assert_eq!(access.token_type, "access");

    let refresh = jwt.validate_refresh_token(&pair.refresh_token).unwrap();
    assert_eq!(refresh.token_type, "refresh");
    assert_ne!(access.jti, refresh.jti);
}

#[test]
fn test_token_timestamps() {
    let jwt = create_test_jwt_utils();
    let before = Utc::now().timestamp();
    let pair = jwt.generate_token_pair(USER_ID, EMAIL, "admin").unwrap();
    let claims = jwt.validate_access_token(&pair.access_token).unwrap();

    assert!(claims.iat >= before);
    assert_eq!(claims.exp - claims.iat, jwt.jwt_config.access_token_expiration * 60);

    let refresh = jwt.validate_refresh_token(&pair.refresh_token).unwrap();
    assert_eq!(refresh.exp - refresh.iat, jwt.jwt_config.refresh_token_expiration * 60);
}

#[test]
fn test_token_pair_serialization() {
    let jwt = create_test_jwt_utils();
    let pair = jwt.generate_token_pair(USER_ID, EMAIL, "alumni").unwrap();
    let json = serde_json::to_value(&pair).unwrap();

    assert!(json["accessToken"].is_string());
    assert!(json["refreshToken"].is_string());
    assert_eq!(json["tokenType"], "Bearer");
    assert_eq!(json["expiresIn"], jwt.jwt_config.access_token_expiration * 60);
}

#[test]
fn test_validate_wrong_token_type() {
    let jwt = create_test_jwt_utils();
    let pair = jwt.generate_token_pair(USER_ID, EMAIL, "alumni").unwrap();

    match jwt.validate_refresh_token(&pair.access_token) {
        Err(JwtError::InvalidTokenType { expected, actual }) => {
            assert_eq!(expected, "refresh");
            assert_eq!(actual, "access");
        }
        other => panic!("expected InvalidTokenType, got {:?}", other),
    }
    assert!(matches!(
        jwt.validate_access_token(&pair.refresh_token),
        Err(JwtError::InvalidTokenType { .. })
    ));

    // Untyped validation accepts either.
    assert!(jwt.validate_token(&pair.refresh_token, None).is_ok());
}

#[test]
fn test_validate_token_with_invalid_secret() {
    let jwt = create_test_jwt_utils();
    let pair = jwt.generate_token_pair(USER_ID, EMAIL, "alumni").unwrap();

    let mut other_config = JwtConfig::default();
    other_config.jwt_secret = "a_completely_different_secret_that_is_long_enough".to_string();
    let other = JwtTokenUtilsImpl::new(other_config);

    assert!(matches!(
        other.validate_access_token(&pair.access_token),
        Err(JwtError::DecodingFailed(_))
    ));
}

#[test]
fn test_expired_token_rejected() {
    let mut config = JwtConfig::default();
    config.access_token_expiration = -5;
    let jwt = JwtTokenUtilsImpl::new(config);
    let pair = jwt.generate_token_pair(USER_ID, EMAIL, "alumni").unwrap();

    assert!(matches!(
        jwt.validate_access_token(&pair.access_token),
        Err(JwtError::TokenExpired)
    ));
}

#[test]
fn test_validate_malformed_token() {
    let jwt = create_test_jwt_utils();
    for token in ["", "not.a.token", "garbage", "a.b"] {
        assert!(jwt.validate_access_token(token).is_err(), "{token:?}");
    }
}

#[test]
fn test_jwt_token_tamper_detection() {
    let jwt = create_test_jwt_utils();
    let pair = jwt.generate_token_pair(USER_ID, EMAIL, "alumni").unwrap();

    let mut parts: Vec<String> = pair.access_token.split('.').map(String::from).collect();
    let forged = jwt.generate_token_pair(USER_ID, EMAIL, "admin").unwrap();
    parts[1] = forged.access_token.split('.').nth(1).unwrap().to_string();
    let tampered = parts.join(".");

    assert!(jwt.validate_access_token(&tampered).is_err());
}

#[test]
fn test_extract_token_from_header() {
    let jwt = create_test_jwt_utils();
    assert_eq!(jwt.extract_token_from_header("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
    assert_eq!(jwt.extract_token_from_header("Bearer   padded  ").unwrap(), "padded");

    for header in ["abc.def.ghi", "Basic dXNlcjpwYXNz", "bearer abc", "Bearer ", "Bearer    "] {
        assert!(
            matches!(jwt.extract_token_from_header(header), Err(JwtError::InvalidToken)),
            "{header:?}"
        );
    }
}

#[test]
fn test_jwt_jti_uniqueness() {
    let jwt = create_test_jwt_utils();
    let ids: HashSet<String> = (0..20)
        .map(|_| {
            let pair = jwt.generate_token_pair(USER_ID, EMAIL, "alumni").unwrap();
            jwt.validate_access_token(&pair.access_token).unwrap().jti
        })
        .collect();
    assert_eq!(ids.len(), 20);
}

#[test]
fn test_jwt_error_display() {
    assert_eq!(JwtError::TokenExpired.to_string(), "Token has expired");
    assert_eq!(JwtError::InvalidToken.to_string(), "Invalid token format");
    assert_eq!(
        JwtError::InvalidTokenType { expected: "access".into(), actual: "refresh".into() }.to_string(),
        "Invalid token type: expected access, got refresh"
    );
}
