//! URL 与短码验证模块
//!
//! - 目标 URL：阻止危险协议，补全 scheme，规范化末尾斜杠
//! - 自定义别名：长度、字符集、保留字
//! - 重定向路径中的短码：字符集与长度

use url::{Position, Url};

/// URL 验证错误
#[derive(Debug, PartialEq, Eq)]
pub enum UrlValidationError {
    EmptyUrl,
    InvalidProtocol(String),
    DangerousProtocol(String),
    MissingHost,
    InvalidFormat(String),
}

impl std::fmt::Display for UrlValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUrl => write!(f, "URL cannot be empty"),
            Self::InvalidProtocol(proto) => write!(
                f,
                "Invalid protocol: {}. Only http:// and https:// are allowed",
                proto
            ),
            Self::DangerousProtocol(proto) => {
                write!(f, "Dangerous protocol blocked: {}", proto)
            }
            Self::MissingHost => write!(f, "URL must have a host"),
            Self::InvalidFormat(msg) => write!(f, "Invalid URL format: {}", msg),
        }
    }
}

impl std::error::Error for UrlValidationError {}

/// 别名验证错误
#[derive(Debug, PartialEq, Eq)]
pub enum AliasValidationError {
    InvalidLength(usize),
    InvalidCharacter(char),
    Reserved(String),
}

impl std::fmt::Display for AliasValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLength(len) => write!(
                f,
                "Alias must be {}-{} characters long, got {}",
                ALIAS_MIN_LEN, ALIAS_MAX_LEN, len
            ),
            Self::InvalidCharacter(c) => write!(
                f,
                "Alias contains invalid character {:?}; only letters, digits, '_' and '-' are allowed",
                c
            ),
            Self::Reserved(word) => write!(f, "Alias '{}' is reserved", word),
        }
    }
}

impl std::error::Error for AliasValidationError {}

/// 危险协议列表（任意位置出现即拒绝）
const DANGEROUS_PROTOCOLS: &[&str] = &["javascript:", "data:", "file:", "ftp:"];

pub const ALIAS_MIN_LEN: usize = 3;
pub const ALIAS_MAX_LEN: usize = 20;

/// 重定向路径允许的最大短码长度
pub const SHORT_CODE_MAX_LEN: usize = 20;

/// 保留字：不可作为自定义别名（大小写不敏感）
pub const RESERVED_ALIASES: &[&str] = &[
    "api", "health", "admin", "www", "app", "short", "url", "shorten", "urls", "metrics",
];

fn is_code_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// 验证并规范化目标 URL
///
/// 1. 去除首尾空白，不能为空
/// 2. 任意位置包含危险协议即拒绝
/// 3. 没有 `://` 时补全 `https://`
/// 4. 只允许 http / https，host 不能为空
/// 5. 去掉路径末尾的一个 `/`，query 与 fragment 保持不变
pub fn normalize_url(raw: &str) -> Result<String, UrlValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UrlValidationError::EmptyUrl);
    }

    let lower = trimmed.to_lowercase();
    for proto in DANGEROUS_PROTOCOLS {
        if lower.contains(proto) {
            return Err(UrlValidationError::DangerousProtocol(proto.to_string()));
        }
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&candidate).map_err(|e| match e {
        url::ParseError::EmptyHost => UrlValidationError::MissingHost,
        other => UrlValidationError::InvalidFormat(other.to_string()),
    })?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(UrlValidationError::InvalidProtocol(format!("{}:", other))),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    let path = url.path();
    let path = path.strip_suffix('/').unwrap_or(path);

    Ok(format!(
        "{}{}{}",
        &url[..Position::BeforePath],
        path,
        &url[Position::AfterPath..]
    ))
}

/// 验证自定义别名
pub fn validate_custom_alias(alias: &str) -> Result<(), AliasValidationError> {
    let len = alias.chars().count();
    if !(ALIAS_MIN_LEN..=ALIAS_MAX_LEN).contains(&len) {
        return Err(AliasValidationError::InvalidLength(len));
    }

    if let Some(c) = alias.chars().find(|c| !is_code_char(*c)) {
        return Err(AliasValidationError::InvalidCharacter(c));
    }

    if let Some(word) = RESERVED_ALIASES
        .iter()
        .find(|w| w.eq_ignore_ascii_case(alias))
    {
        return Err(AliasValidationError::Reserved(word.to_string()));
    }

    Ok(())
}

/// 判断重定向路径中的短码是否合法（`[A-Za-z0-9_-]{1,20}`）
pub fn is_valid_short_code(code: &str) -> bool {
    !code.is_empty() && code.len() <= SHORT_CODE_MAX_LEN && code.chars().all(is_code_char)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_adds_https() {
        assert_eq!(normalize_url("example.com").unwrap(), "https://example.com");
        assert_eq!(
            normalize_url("  example.com/path  ").unwrap(),
            "https://example.com/path"
        );
    }

    #[test]
    fn test_normalize_strips_single_trailing_slash() {
        assert_eq!(
            normalize_url("https://example.com/").unwrap(),
            "https://example.com"
        );
        assert_eq!(
            normalize_url("https://example.com/a/b/").unwrap(),
            "https://example.com/a/b"
        );
        assert_eq!(
            normalize_url("http://example.com:8080/x/?q=1#top").unwrap(),
            "http://example.com:8080/x?q=1#top"
        );
    }

    #[test]
    fn test_normalize_keeps_query_and_fragment() {
        assert_eq!(
            normalize_url("https://example.com/search?q=rust&page=2#results").unwrap(),
            "https://example.com/search?q=rust&page=2#results"
        );
    }

    #[test]
    fn test_dangerous_protocols() {
        assert!(matches!(
            normalize_url("javascript:alert(1)"),
            Err(UrlValidationError::DangerousProtocol(_))
        ));
        assert!(matches!(
            normalize_url("DATA:text/html,<script>alert(1)</script>"),
            Err(UrlValidationError::DangerousProtocol(_))
        ));
        assert!(matches!(
            normalize_url("file:///etc/passwd"),
            Err(UrlValidationError::DangerousProtocol(_))
        ));
        assert!(matches!(
            normalize_url("ftp://files.example.com"),
            Err(UrlValidationError::DangerousProtocol(_))
        ));
        assert!(matches!(
            normalize_url("https://example.com/?next=javascript:void(0)"),
            Err(UrlValidationError::DangerousProtocol(_))
        ));
    }

    #[test]
    fn test_rejects_other_schemes_and_empty() {
        assert_eq!(normalize_url("   "), Err(UrlValidationError::EmptyUrl));
        assert!(matches!(
            normalize_url("ws://example.com"),
            Err(UrlValidationError::InvalidProtocol(_))
        ));
        assert!(normalize_url("https://").is_err());
    }

    #[test]
    fn test_alias_validation() {
        assert!(validate_custom_alias("promo").is_ok());
        assert!(validate_custom_alias("my_link-2024").is_ok());
        assert_eq!(
            validate_custom_alias("ab"),
            Err(AliasValidationError::InvalidLength(2))
        );
        assert_eq!(
            validate_custom_alias("a".repeat(21).as_str()),
            Err(AliasValidationError::InvalidLength(21))
        );
        assert_eq!(
            validate_custom_alias("bad alias"),
            Err(AliasValidationError::InvalidCharacter(' '))
        );
        assert_eq!(
            validate_custom_alias("API"),
            Err(AliasValidationError::Reserved("api".into()))
        );
        assert!(validate_custom_alias("shorten").is_err());
        assert!(validate_custom_alias("Health").is_err());
    }

    #[test]
    fn test_short_code_path_validation() {
        assert!(is_valid_short_code("1"));
        assert!(is_valid_short_code("aB9_-"));
        assert!(!is_valid_short_code(""));
        assert!(!is_valid_short_code(&"a".repeat(21)));
        assert!(!is_valid_short_code("a/b"));
        assert!(!is_valid_short_code("a.b"));
    }
}
