/**
 * Preference Routes
 * Theme toggle persisted in a cookie
 */
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{AppError, Result};

const THEME_COOKIE: &str = "theme";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl FromStr for Theme {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(AppError::BadRequest(format!("Unknown theme: {}", other))),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ThemeResponse {
    pub theme: Theme,
}

#[derive(Debug, Deserialize)]
pub struct ThemeRequest {
    pub theme: String,
}

/// GET /api/preferences/theme - Unknown or missing cookie reads as light
pub async fn get_theme(jar: CookieJar) -> Json<ThemeResponse> {
    let theme = jar
        .get(THEME_COOKIE)
        .and_then(|c| c.value().parse().ok())
        .unwrap_or_default();
    Json(ThemeResponse { theme })
}

/// PUT /api/preferences/theme
pub async fn set_theme(
    jar: CookieJar,
    Json(payload): Json<ThemeRequest>,
) -> Result<(CookieJar, Json<ThemeResponse>)> {
    let theme: Theme = payload.theme.parse()?;

    let cookie = Cookie::build((THEME_COOKIE, theme.as_str()))
        .path("/")
        .same_site(SameSite::Lax)
        .permanent();

    Ok((jar.add(cookie), Json(ThemeResponse { theme })))
}
