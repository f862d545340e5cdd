//! Проверка и нормализация ссылок на приватные серверы.
//!
//! Поддерживается единственный формат: `https://www.roblox.com/share?code=CODE&type=Server`.

use once_cell::sync::Lazy;
use regex::Regex;

const SHARE_MARKER: &str = "roblox.com/share";
const TYPE_MARKER: &str = "type=server";
const CODE_MARKER: &str = "code=";
const DOMAIN: &str = "roblox.com";
const SECURE_PREFIX: &str = "https://";
const KNOWN_SCHEMES: [&str; 3] = ["http://", "https://", "roblox://"];

static SHARE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[?&]code=([^&#]+)").expect("корректное регулярное выражение"));

/// Ссылка имеет форму приватного сервера (регистронезависимо)
pub fn is_valid_link(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }

    let url_lower = url.to_lowercase();
    url_lower.contains(SHARE_MARKER) && url_lower.contains(TYPE_MARKER) && url_lower.contains(CODE_MARKER)
}

/// Дописывает https:// к частичным ссылкам. Идемпотентна.
pub fn normalize_link(url: &str) -> String {
    if url.is_empty() {
        return url.to_string();
    }

    if url.starts_with("www.roblox.com") || url.starts_with(DOMAIN) {
        return format!("{}{}", SECURE_PREFIX, url);
    }

    let has_scheme = KNOWN_SCHEMES.iter().any(|scheme| url.starts_with(scheme));
    if !has_scheme && url.contains(DOMAIN) {
        return format!("{}{}", SECURE_PREFIX, url);
    }

    url.to_string()
}

/// Код приглашения из параметра `code=`
pub fn share_code(url: &str) -> Option<&str> {
    SHARE_CODE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Старый формат ссылок с `privateServerLinkCode=`
pub fn has_private_server_link_code(url: &str) -> bool {
    url.contains("privateServerLinkCode=")
}
