//! 认证服务层
//! 注册/登录的业务逻辑；限流和CSRF在中间件层处理

use crate::{
    domain::Role,
    error::AppError,
    infrastructure::{
        db::PgPool,
        jwt::generate_token,
        password::{hash_password, verify_password, Password},
        validation::{validate_email, validate_name, validate_password_strength},
    },
    repository::users::{self, CreateUserInput, User},
};

/// 注册账户类型："seller"开通卖家，其余默认买家
pub fn role_for_account_type(account_type: Option<&str>) -> Role {
    match account_type {
        Some(t) if t.eq_ignore_ascii_case("seller") => Role::Seller,
        _ => Role::Buyer,
    }
}

/// 用户注册：返回新用户和7天有效期的JWT
pub async fn register(
    pool: &PgPool,
    name: String,
    email: String,
    password: String,
    account_type: Option<String>,
) -> Result<(User, String), AppError> {
    // 1. 入参校验
    validate_name(&name).map_err(|e| AppError::bad_request(e.to_string()))?;
    validate_email(&email).map_err(|e| AppError::bad_request(e.to_string()))?;
    validate_password_strength(&password).map_err(|e| AppError::bad_request(e.to_string()))?;

    let role = role_for_account_type(account_type.as_deref());

    // 2. 哈希密码并落库；明文离开作用域即被清零，邮箱唯一约束冲突映射为409
    let password = Password::new(password);
    let password_hash = hash_password(password.as_str())
        .map_err(|_| AppError::internal("falha ao gerar hash de senha"))?;

    let user = users::create(
        pool,
        CreateUserInput {
            name,
            email: email.to_lowercase(),
            password_hash,
            role: role.as_str().to_string(),
        },
    )
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            AppError::conflict("Email já cadastrado")
        }
        _ => AppError::from(e),
    })?;

    // 3. 签发token
    let token = generate_token(user.id, &user.email, role)
        .map_err(|_| AppError::internal("falha ao gerar token"))?;

    tracing::info!(user_id = %user.id, role = %user.role, "novo usuário registrado");
    Ok((user, token))
}

/// 用户登录：凭证错误和账户停用都不区分提示细节
pub async fn login(
    pool: &PgPool,
    email: &str,
    password: String,
) -> Result<(User, String), AppError> {
    if email.is_empty() || password.is_empty() {
        return Err(AppError::bad_request("Email e senha são obrigatórios"));
    }
    let password = Password::new(password);

    let user = users::get_by_email(pool, &email.to_lowercase())
        .await?
        .ok_or_else(|| AppError::invalid_credentials("Credenciais inválidas"))?;

    let valid = verify_password(password.as_str(), &user.password_hash).unwrap_or(false);
    if !valid {
        tracing::warn!(user_id = %user.id, "tentativa de login com senha incorreta");
        return Err(AppError::invalid_credentials("Credenciais inválidas"));
    }

    if !user.is_active {
        return Err(AppError::user_inactive("Usuário inativo ou não encontrado"));
    }

    let role = Role::from_str(&user.role)
        .ok_or_else(|| AppError::internal("papel de usuário desconhecido"))?;
    let token = generate_token(user.id, &user.email, role)
        .map_err(|_| AppError::internal("falha ao gerar token"))?;

    Ok((user, token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_for_account_type() {
        assert_eq!(role_for_account_type(Some("seller")), Role::Seller);
        assert_eq!(role_for_account_type(Some("SELLER")), Role::Seller);
        assert_eq!(role_for_account_type(Some("buyer")), Role::Buyer);
        assert_eq!(role_for_account_type(Some("admin")), Role::Buyer);
        assert_eq!(role_for_account_type(None), Role::Buyer);
    }
}
