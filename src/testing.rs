use bson::oid::ObjectId;
use jsonwebtoken::{encode as encode_jwt, EncodingKey, Header as JwtHeader};
use rocket::http::{ContentType, Cookie, Header};
use rocket::local::asynchronous::{Client, LocalResponse};
use serde_json::Value;

use crate::config::{Config, Storage};
use crate::data::store::{MemoryStore, Store};
use crate::permission::Permissions;
use crate::resp::jwt::{Identity, AUTH_COOKIE_NAME};
use crate::security::Security;

pub const SECRET: &str = "coursework-test-secret";

pub fn encode(identity: &Identity) -> String {
    encode_jwt(
        &JwtHeader::default(),
        identity,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("unable to encode test token")
}

pub fn token(admin: bool) -> String {
    encode(&Identity {
        user: Some(ObjectId::new().to_hex()),
        permissions: Some(Permissions { admin }),
        exp: None,
    })
}

/// Server backed by an empty in-memory store.
pub struct TestClient {
    client: Client,
}

impl TestClient {
    pub async fn new() -> TestClient {
        let mut config = Config::default();
        config.storage = Storage::Memory;
        config.api_prefix = "/api".to_string();

        let rocket = crate::build(config, Store::new(MemoryStore::new()), Security::new(SECRET))
            .expect("unable to build server");
        let client = Client::tracked(rocket)
            .await
            .expect("valid rocket instance");

        TestClient { client }
    }

    fn bearer(token: &str) -> Header<'static> {
        Header::new("Authorization", format!("Bearer {}", token))
    }

    pub async fn get(&self, uri: impl Into<String>, token: &str) -> LocalResponse<'_> {
        self.client
            .get(uri.into())
            .header(Self::bearer(token))
            .dispatch()
            .await
    }

    pub async fn get_anonymous(&self, uri: impl Into<String>) -> LocalResponse<'_> {
        self.client.get(uri.into()).dispatch().await
    }

    pub async fn get_with_cookie(&self, uri: impl Into<String>, token: &str) -> LocalResponse<'_> {
        self.client
            .get(uri.into())
            .cookie(Cookie::new(AUTH_COOKIE_NAME, token.to_string()))
            .dispatch()
            .await
    }

    pub async fn post(&self, uri: impl Into<String>, token: &str, body: &Value) -> LocalResponse<'_> {
        self.client
            .post(uri.into())
            .header(Self::bearer(token))
            .json(body)
            .dispatch()
            .await
    }

    pub async fn put(&self, uri: impl Into<String>, token: &str, body: &Value) -> LocalResponse<'_> {
        self.client
            .put(uri.into())
            .header(Self::bearer(token))
            .json(body)
            .dispatch()
            .await
    }

    /// Sends `body` verbatim, with a JSON content type only when `json` is set.
    pub async fn post_raw(&self, uri: impl Into<String>, token: &str, json: bool, body: &str) -> LocalResponse<'_> {
        let mut request = self
            .client
            .post(uri.into())
            .header(Self::bearer(token))
            .body(body);
        if json {
            request = request.header(ContentType::JSON);
        }
        request.dispatch().await
    }

    pub async fn put_raw(&self, uri: impl Into<String>, token: &str, body: &str) -> LocalResponse<'_> {
        self.client
            .put(uri.into())
            .header(Self::bearer(token))
            .header(ContentType::JSON)
            .body(body)
            .dispatch()
            .await
    }

    pub async fn delete(&self, uri: impl Into<String>, token: &str) -> LocalResponse<'_> {
        self.client
            .delete(uri.into())
            .header(Self::bearer(token))
            .dispatch()
            .await
    }
}
