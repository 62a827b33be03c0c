//! 点击事件字段清洗

use std::net::IpAddr;

pub const UNKNOWN: &str = "unknown";

/// 用户代理最大保留字符数
pub const MAX_USER_AGENT_CHARS: usize = 500;

/// 含逗号时取第一段，去除空白后必须是合法 IPv4/IPv6 地址
pub fn sanitize_ip(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return UNKNOWN.to_string();
    };

    let candidate = raw.split(',').next().unwrap_or_default().trim();
    match candidate.parse::<IpAddr>() {
        Ok(_) => candidate.to_string(),
        Err(_) => UNKNOWN.to_string(),
    }
}

/// 去除空白并截断到 500 个字符（按字符边界），空串记为 "unknown"
pub fn sanitize_user_agent(raw: Option<&str>) -> String {
    let trimmed = raw.unwrap_or_default().trim();
    if trimmed.is_empty() {
        return UNKNOWN.to_string();
    }

    match trimmed.char_indices().nth(MAX_USER_AGENT_CHARS) {
        Some((cut, _)) => trimmed[..cut].to_string(),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_ip() {
        assert_eq!(sanitize_ip(Some("203.0.113.7")), "203.0.113.7");
        assert_eq!(sanitize_ip(Some("203.0.113.7, 10.0.0.1")), "203.0.113.7");
        assert_eq!(sanitize_ip(Some("  2001:db8::1 ")), "2001:db8::1");
        assert_eq!(sanitize_ip(Some("not-an-ip")), "unknown");
        assert_eq!(sanitize_ip(Some("")), "unknown");
        assert_eq!(sanitize_ip(Some("203.0.113.7:8080")), "unknown");
        assert_eq!(sanitize_ip(None), "unknown");
    }

    #[test]
    fn test_sanitize_user_agent() {
        assert_eq!(sanitize_user_agent(Some(" curl/8.0 ")), "curl/8.0");
        assert_eq!(sanitize_user_agent(Some("   ")), "unknown");
        assert_eq!(sanitize_user_agent(None), "unknown");
    }

    #[test]
    fn test_user_agent_is_capped_on_char_boundary() {
        let long = "é".repeat(600);
        let cleaned = sanitize_user_agent(Some(&long));
        assert_eq!(cleaned.chars().count(), MAX_USER_AGENT_CHARS);

        let exact = "a".repeat(MAX_USER_AGENT_CHARS);
        assert_eq!(sanitize_user_agent(Some(&exact)), exact);
    }
}
