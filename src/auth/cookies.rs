use axum::http::{header, HeaderMap, HeaderValue};
use cookie::{Cookie, SameSite};
use time::Duration;

/// Cookie holding the identity token.
pub const TOKEN_COOKIE: &str = "token";

fn base(value: String, production: bool) -> cookie::CookieBuilder<'static> {
    let same_site = if production {
        SameSite::None
    } else {
        SameSite::Strict
    };
    Cookie::build((TOKEN_COOKIE, value))
        .http_only(true)
        .secure(production)
        .same_site(same_site)
        .path("/")
}

pub fn token_cookie(token: String, ttl: Duration, production: bool) -> anyhow::Result<HeaderValue> {
    let cookie = base(token, production).max_age(ttl).build();
    Ok(HeaderValue::from_str(&cookie.to_string())?)
}

/// Empty `token` with zero lifetime; browsers drop it immediately.
pub fn cleared_token_cookie(production: bool) -> anyhow::Result<HeaderValue> {
    let cookie = base(String::new(), production)
        .max_age(Duration::ZERO)
        .build();
    Ok(HeaderValue::from_str(&cookie.to_string())?)
}

/// Reads the identity token from the request's `Cookie` headers.
///
/// An empty value counts as absent.
pub fn read_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}
