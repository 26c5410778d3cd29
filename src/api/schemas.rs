//! 跨资源共享的对外数据形态

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::repository::users::User;

/// 用户对外形态：绝不携带 password_hash
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserPublic {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserPublic {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
            role: u.role.clone(),
            is_active: u.is_active,
            is_verified: u.is_verified,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

impl From<User> for UserPublic {
    fn from(u: User) -> Self {
        Self::from(&u)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_public_never_exposes_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Maria".into(),
            email: "maria@example.com".into(),
            password_hash: "$2b$12$secret".into(),
            role: "BUYER".into(),
            is_active: true,
            is_verified: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let public = UserPublic::from(&user);
        let json = serde_json::to_value(&public).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "maria@example.com");
        assert_eq!(json["isActive"], true);
    }
}
