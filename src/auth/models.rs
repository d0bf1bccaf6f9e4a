use serde::{Deserialize, Serialize};

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response body. The token is also set as the session cookie; API
/// clients send it back as a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub admin: AdminUser,
    pub token: String,
}

/// The authenticated admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_shape() {
        let response = LoginResponse {
            message: "Logged in".to_string(),
            admin: AdminUser {
                email: "office@consultancy.example".to_string(),
            },
            token: "abc".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["admin"]["email"], "office@consultancy.example");
        assert_eq!(json["token"], "abc");
    }
}
