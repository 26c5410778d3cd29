//! JWT Token 生成和验证模块

use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Role;

/// 默认有效期：7天
pub const DEFAULT_EXPIRY_SECS: i64 = 7 * 24 * 3600;

/// JWT Claims（字段名与前端约定的载荷一致）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub email: String,
    /// 用户类型（角色）：BUYER | SELLER | ADMIN
    #[serde(rename = "type")]
    pub user_type: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, email: String, role: Role, expires_in_secs: i64) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            email,
            user_type: role.as_str().to_string(),
            exp: (now + Duration::seconds(expires_in_secs)).timestamp(),
            iat: now.timestamp(),
        }
    }

    /// 解析角色；载荷中的未知角色视为无效令牌
    pub fn role(&self) -> Result<Role> {
        Role::from_str(&self.user_type)
            .ok_or_else(|| anyhow!("Unknown role in token: {}", self.user_type))
    }
}

/// 生成JWT Token（JWT_EXPIRY_SECS可覆盖默认7天）
pub fn generate_token(user_id: Uuid, email: &str, role: Role) -> Result<String> {
    let expires_in_secs = std::env::var("JWT_EXPIRY_SECS")
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(DEFAULT_EXPIRY_SECS);

    generate_token_with_expiry(user_id, email, role, expires_in_secs)
}

/// 生成JWT Token（指定过期时间）
pub fn generate_token_with_expiry(
    user_id: Uuid,
    email: &str,
    role: Role,
    expires_in_secs: i64,
) -> Result<String> {
    let secret = get_jwt_secret()?;
    let claims = Claims::new(user_id, email.to_string(), role, expires_in_secs);

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| anyhow!("Failed to encode token: {}", e))
}

/// 验证JWT Token
pub fn verify_token(token: &str) -> Result<Claims> {
    let secret = get_jwt_secret()?;

    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.leeway = 10; // 允许10秒时钟偏差
    validation.set_required_spec_claims(&["exp"]);

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::warn!("JWT: token verification failed: {}", e);
        anyhow!("Token verification failed: {}", e)
    })?;

    let claims = token_data.claims;

    // 角色必须是已知值
    claims.role()?;

    Ok(claims)
}

/// 从环境变量获取JWT密钥
fn get_jwt_secret() -> Result<String> {
    std::env::var("JWT_SECRET").map_err(|_| anyhow!("JWT_SECRET environment variable not set"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_roundtrip() {
        std::env::set_var("JWT_SECRET", "test_secret_key_for_jwt_signing_0123456789");

        let user_id = Uuid::new_v4();
        let token = generate_token(user_id, "ana@example.com", Role::Seller).unwrap();
        let claims = verify_token(&token).unwrap();

        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.email, "ana@example.com");
        assert_eq!(claims.user_type, "SELLER");
        assert_eq!(claims.role().unwrap(), Role::Seller);
    }

    #[test]
    fn test_jwt_wire_format_uses_agreed_field_names() {
        std::env::set_var("JWT_SECRET", "test_secret_key_for_jwt_signing_0123456789");

        let token = generate_token(Uuid::new_v4(), "b@example.com", Role::Buyer).unwrap();
        // 载荷是token的第二段
        let payload_b64 = token.split('.').nth(1).unwrap();
        use base64::Engine;
        let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(payload_b64)
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        assert!(value.get("userId").is_some());
        assert!(value.get("email").is_some());
        assert_eq!(value["type"], "BUYER");
    }

    #[test]
    fn test_expired_token_rejected() {
        std::env::set_var("JWT_SECRET", "test_secret_key_for_jwt_signing_0123456789");

        let token =
            generate_token_with_expiry(Uuid::new_v4(), "c@example.com", Role::Buyer, -7200)
                .unwrap();
        assert!(verify_token(&token).is_err());
    }
}
