//! One-shot notices carried across a redirect in a cookie.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

pub const FLASH_COOKIE: &str = "flash";

/// Queue a notice for the next page view. A newer notice replaces an
/// older unread one.
pub fn push(jar: CookieJar, message: &str) -> CookieJar {
    jar.add(
        Cookie::build((FLASH_COOKIE, message.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax),
    )
}

/// Read and clear pending notices.
pub fn take(jar: CookieJar) -> (CookieJar, Vec<String>) {
    let messages: Vec<String> = jar
        .get(FLASH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .into_iter()
        .collect();

    if messages.is_empty() {
        return (jar, messages);
    }

    let jar = jar.remove(Cookie::build((FLASH_COOKIE, "")).path("/"));
    (jar, messages)
}
