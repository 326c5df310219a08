//! Shared fixtures: a fake Cognito pool with real RS256 keys
#![allow(dead_code)]

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const REGION: &str = "eu-west-2";
pub const POOL_ID: &str = "eu-west-2_TestPool";
pub const CLIENT_ID: &str = "test-app-client";

pub const SIGNING_KID: &str = "signing-key-1";
pub const SIGNING_KEY_PEM: &str = include_str!("../fixtures/signing_key.pem");
pub const SIGNING_KEY_N: &str = "urm4Zfw4S89ycGW8rDMttf_NqQdLDRtQnOdXPwaVNG9OvimyBvL41Pkf2ey-tvT0Kf2qYTwGd5bDmMkJeecB7Hj8411-Nxmzb2I1_UPvKXoraGGemLxEJBxZRz39uRDQPzNGZU_6SKgOlmEEGEnjZlWRgOEWheMZcLbYLsay0wAJuGfc-Ahv_EEeunMSYq63nGFYK1pTLJnS6EpD1B3U0AoOfes9qwUzeZSkXLZI_WcoBniA4SPdIejATLOHZctewuwhMdSCSTl13Aa-snMS1PW7tbdDfJmtxPHnJFZX5bnAa7USPA8xbZCn4u1E4vWarTIQaOkYXLSHVHnAAelp8w";

/// A second key pair, unknown to the pool unless a test publishes it
pub const ROGUE_KID: &str = "rotated-key-2";
pub const ROGUE_KEY_PEM: &str = include_str!("../fixtures/rogue_key.pem");
pub const ROGUE_KEY_N: &str = "sd15LsRwGIKNCbbflu1yfqgali8rVg45oSxmEOaJYOoFWkBcADB-3eyOmK8vsFxnv2mPbdIwKlacwr5LHYK6RnM1rcWMNfgS1RP5PEhazYf-YbDES7Z-tOe9xWFmCe5Jfvd2EIHE-GQUDoSfAthi4B1R886VtCCtzhdhRBqYLf_Bj-azlfkubkhvpEznYEzGy0ZqHKAfXdkys1mchMD2MRgZnTWT_K6glcGsANheAZC4Ex5tlvHyxP0ahBmZtEPpEYXUqgfj0075_PQIBugc28HXb6KUmHzL7uvt4UwQCrkcNUlc7YqaRxbP6N_kAR8jDw0X2ugxYF_AkFfIwPwsRw";

pub fn issuer() -> String {
    format!("https://cognito-idp.{}.amazonaws.com/{}", REGION, POOL_ID)
}

pub fn jwks_path() -> String {
    format!("/{}/.well-known/jwks.json", POOL_ID)
}

pub fn jwk(kid: &str, n: &str) -> Value {
    json!({ "kid": kid, "kty": "RSA", "alg": "RS256", "use": "sig", "n": n, "e": "AQAB" })
}

pub fn jwks(keys: &[Value]) -> Value {
    json!({ "keys": keys })
}

/// Claims of a fresh, valid Cognito access token
pub fn access_claims() -> Value {
    let now = Utc::now();
    json!({
        "sub": "8f1c2d3e-0000-4000-8000-000000000001",
        "iss": issuer(),
        "client_id": CLIENT_ID,
        "token_use": "access",
        "scope": "aws.cognito.signin.user.admin",
        "auth_time": now.timestamp(),
        "iat": now.timestamp(),
        "exp": (now + Duration::hours(1)).timestamp(),
        "jti": "7c4f0e1a",
        "username": "alice"
    })
}

/// Claims with a set of fields overridden (a `null` removes the field)
pub fn claims_with(overrides: Value) -> Value {
    let mut claims = access_claims();
    if let (Some(target), Some(patch)) = (claims.as_object_mut(), overrides.as_object()) {
        for (key, value) in patch {
            if value.is_null() {
                target.remove(key);
            } else {
                target.insert(key.clone(), value.clone());
            }
        }
    }
    claims
}

pub fn mint_with(claims: &Value, kid: &str, pem: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).expect("fixture key must parse");
    encode(&header, claims, &key).expect("token must encode")
}

/// Sign with the pool's published key
pub fn mint(claims: &Value) -> String {
    mint_with(claims, SIGNING_KID, SIGNING_KEY_PEM)
}

/// Start a server publishing the pool's signing key
pub async fn pool_server() -> MockServer {
    let server = MockServer::start().await;
    mount_jwks(&server, jwks(&[jwk(SIGNING_KID, SIGNING_KEY_N)])).await;
    server
}

pub async fn mount_jwks(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path(jwks_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}
