use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};

use crate::config::SiteConfig;
use crate::listing::{self, SortKey};
use crate::models::Blog;
use crate::AppState;

const FEED_ITEMS: usize = 50;
const DESCRIPTION_CHARS: usize = 300;

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn rfc822(dt: &DateTime<Utc>) -> String {
    dt.format("%a, %d %b %Y %H:%M:%S +0000").to_string()
}

fn render_feed(site: &SiteConfig, blogs: &[Blog]) -> String {
    let mut items = String::new();
    for blog in blogs {
        let post_url = format!("{}/blog/{}", site.url, blog.id);
        let pub_date = blog
            .created_at
            .map(|dt| format!("      <pubDate>{}</pubDate>\n", rfc822(&dt)))
            .unwrap_or_default();
        let categories: String = blog
            .category
            .names()
            .iter()
            .map(|c| format!("      <category>{}</category>\n", escape_xml(c)))
            .collect();

        items.push_str(&format!(
            "    <item>\n\
             \x20     <title>{}</title>\n\
             \x20     <link>{}</link>\n\
             \x20     <description>{}</description>\n\
             {}{}\
             \x20     <guid isPermaLink=\"true\">{}</guid>\n\
             \x20   </item>\n",
            escape_xml(&blog.title),
            escape_xml(&post_url),
            escape_xml(&listing::excerpt(&blog.content, DESCRIPTION_CHARS)),
            pub_date,
            categories,
            escape_xml(&post_url),
        ));
    }

    let feed_url = format!("{}/rss.xml", site.url);
    let blog_url = format!("{}/all-blogs", site.url);
    let last_build = blogs
        .iter()
        .find_map(|b| b.created_at)
        .map(|dt| rfc822(&dt))
        .unwrap_or_default();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">
  <channel>
    <title>{}</title>
    <link>{}</link>
    <description>{}</description>
    <language>en-us</language>
    <atom:link href="{}" rel="self" type="application/rss+xml"/>
    <lastBuildDate>{}</lastBuildDate>
{}  </channel>
</rss>"#,
        escape_xml(&site.title),
        escape_xml(&blog_url),
        escape_xml(&site.description),
        escape_xml(&feed_url),
        last_build,
        items,
    )
}

/// GET /rss.xml - The newest posts as RSS 2.0
pub async fn rss_feed(State(state): State<AppState>) -> Response {
    let blogs = match state.store.blogs().await {
        Ok(blogs) => blogs,
        Err(e) => {
            tracing::error!(error = %e, "failed to load blogs for rss feed");
            return (StatusCode::SERVICE_UNAVAILABLE, "Service unavailable").into_response();
        }
    };

    let mut newest = blogs.to_vec();
    listing::sort_blogs(&mut newest, SortKey::Newest, Utc::now(), &state.config.ranking);
    newest.truncate(FEED_ITEMS);

    let xml = render_feed(&state.config.site, &newest);

    (
        [
            (header::CONTENT_TYPE, "application/rss+xml; charset=utf-8"),
            (
                header::CACHE_CONTROL,
                "public, max-age=3600, stale-while-revalidate=600",
            ),
        ],
        Body::from(xml),
    )
        .into_response()
}
