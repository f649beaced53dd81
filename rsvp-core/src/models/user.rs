use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The user returned by the login endpoint.
///
/// The client never interprets the profile beyond requiring it to be a JSON
/// object; the accessors below only exist for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct UserProfile(Map<String, Value>);

impl UserProfile {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn name(&self) -> Option<&str> {
        self.get("name").and_then(Value::as_str)
    }

    pub fn email(&self) -> Option<&str> {
        self.get("email").and_then(Value::as_str)
    }

    /// Best human-readable label: name, then email, then id.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name() {
            return name.to_string();
        }
        if let Some(email) = self.email() {
            return email.to_string();
        }
        match self.get("id") {
            Some(Value::String(id)) => format!("user {id}"),
            Some(id @ Value::Number(_)) => format!("user {id}"),
            _ => "unknown user".to_string(),
        }
    }
}

impl TryFrom<Value> for UserProfile {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(format!("user profile must be an object, got {}", kind(&other))),
        }
    }
}

impl From<UserProfile> for Value {
    fn from(profile: UserProfile) -> Self {
        Value::Object(profile.0)
    }
}

/// Body of a successful `POST /login`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLoginResponse")]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Deserialize)]
struct RawLoginResponse {
    token: String,
    user: UserProfile,
}

impl TryFrom<RawLoginResponse> for LoginResponse {
    type Error = String;

    fn try_from(raw: RawLoginResponse) -> Result<Self, Self::Error> {
        if raw.token.is_empty() {
            return Err("login response carries an empty token".to_string());
        }
        Ok(Self {
            token: raw.token,
            user: raw.user,
        })
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
