//! 输入验证和清理模块
//! 校验失败的消息直接面向客户端（葡萄牙语）

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    // 足够严格的实用邮箱格式，完整RFC校验交给邮件投递环节
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("email regex")
});

/// 验证邮箱格式
pub fn validate_email(email: &str) -> Result<()> {
    if email.is_empty() {
        return Err(anyhow!("E-mail é obrigatório"));
    }
    if email.len() > 254 {
        return Err(anyhow!("E-mail muito longo"));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(anyhow!("E-mail inválido"));
    }
    Ok(())
}

/// 验证密码强度
pub fn validate_password_strength(password: &str) -> Result<()> {
    if password.len() < 8 {
        return Err(anyhow!("A senha deve ter pelo menos 8 caracteres"));
    }
    if password.len() > 128 {
        return Err(anyhow!("Senha muito longa (máximo 128 caracteres)"));
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(anyhow!("A senha deve conter pelo menos um número"));
    }

    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err(anyhow!("A senha deve conter pelo menos uma letra"));
    }

    Ok(())
}

/// 验证展示名称（用户名、商店名、商品名等）
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(anyhow!("Nome é obrigatório"));
    }
    if name.len() > 200 {
        return Err(anyhow!("Nome muito longo (máximo 200 caracteres)"));
    }
    Ok(())
}

/// 验证价格为正数
pub fn validate_price(price: Decimal) -> Result<()> {
    if price <= Decimal::ZERO {
        return Err(anyhow!("Preço deve ser maior que zero"));
    }
    Ok(())
}

/// 验证数量为正数
pub fn validate_quantity(quantity: i32) -> Result<()> {
    if quantity <= 0 {
        return Err(anyhow!("Quantidade deve ser maior que zero"));
    }
    Ok(())
}

/// 验证评分范围 1-5
pub fn validate_rating(rating: i32) -> Result<()> {
    if !(1..=5).contains(&rating) {
        return Err(anyhow!("Avaliação deve estar entre 1 e 5"));
    }
    Ok(())
}

/// 验证图片URL（banner等）
pub fn validate_image_url(url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(anyhow!("URL da imagem é obrigatória"));
    }
    if url.len() > 2000 {
        return Err(anyhow!("URL da imagem muito longa"));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(anyhow!("URL da imagem inválida"));
    }
    Ok(())
}

/// 清理字符串输入（移除控制字符，防止日志注入/XSS前置）
pub fn sanitize_string(input: &str, max_length: usize) -> Result<String> {
    if input.len() > max_length {
        return Err(anyhow!(
            "Texto muito longo (máximo {} caracteres)",
            max_length
        ));
    }

    // 保留换行和制表符
    let cleaned: String = input
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();

    Ok(cleaned)
}

/// 由名称生成URL slug：小写、空白转连字符、丢弃其余符号
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_hyphen = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_hyphen = false;
        } else if (c.is_whitespace() || c == '-' || c == '_') && !last_hyphen {
            slug.push('-');
            last_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ana@example.com").is_ok());
        assert!(validate_email("a.b+tag@sub.example.com.br").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("sem-arroba").is_err());
        assert!(validate_email("x@y").is_err());
    }

    #[test]
    fn test_validate_password_strength() {
        assert!(validate_password_strength("abc12345").is_ok());
        assert!(validate_password_strength("curta1").is_err());
        assert!(validate_password_strength("somenteletras").is_err());
        assert!(validate_password_strength("123456789").is_err());
    }

    #[test]
    fn test_validate_rating_range() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
    }

    #[test]
    fn test_sanitize_string_strips_control_chars() {
        let cleaned = sanitize_string("abc\u{0000}def\nok", 100).unwrap();
        assert_eq!(cleaned, "abcdef\nok");
        assert!(sanitize_string("x".repeat(10).as_str(), 5).is_err());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Loja da Maria"), "loja-da-maria");
        assert_eq!(slugify("  Café & Cia!  "), "caf-cia");
        assert_eq!(slugify("produto_novo-2024"), "produto-novo-2024");
        // 不产生首尾或连续的连字符
        assert_eq!(slugify("--Minha   Loja--"), "minha-loja");
    }
}
