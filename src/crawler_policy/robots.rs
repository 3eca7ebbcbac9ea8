//! Dynamic robots.txt
//!
//! Generates a robots.txt that:
//! - Blocks AI training/assistant crawlers and aggressive SEO bots
//! - Blocks archivers and scraper crawlers
//! - Allows the major search engines
//! - Keeps every crawler out of admin and build paths

use chrono::{DateTime, Utc};
use spin_sdk::http::Response;

use crate::config::GateConfig;

/// AI/ML and SEO crawlers blocked site-wide.
pub const BLOCKED_AI_CRAWLERS: &[&str] = &[
    "GPTBot",
    "ChatGPT-User",
    "CCBot",
    "anthropic-ai",
    "Claude-Web",
    "PerplexityBot",
    "YouBot",
    "BingBot/2.0",
    "facebookexternalhit",
    "Twitterbot",
    "LinkedInBot",
    "WhatsApp",
    "TelegramBot",
    "DataForSeoBot",
    "PetalBot",
    "MegaIndex.ru",
    "YandexBot",
    "SeznamBot",
    "BaiduSpider",
];

/// Search engine crawlers explicitly allowed.
pub const ALLOWED_SEARCH_ENGINES: &[&str] = &["Googlebot", "Bingbot", "Slurp"];

/// Archivers and scrapers blocked site-wide.
pub const BLOCKED_SCRAPERS: &[&str] = &[
    "ia_archiver",
    "Wayback",
    "SemrushBot",
    "AhrefsBot",
    "MJ12bot",
    "DotBot",
];

/// Paths no crawler should index.
pub const DISALLOWED_PATHS: &[&str] = &[
    "/admin/",
    "/.git/",
    "/node_modules/",
    "/dist/",
    "/.env",
    "/wrangler.toml",
    "/functions/",
];

fn push_group(lines: &mut Vec<String>, agent: &str, directive: &str) {
    lines.push(format!("User-agent: {}", agent));
    lines.push(directive.to_string());
    lines.push(String::new());
}

pub fn generate_robots_txt(cfg: &GateConfig, generated_at: DateTime<Utc>) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push("# robots.txt with AI crawler protection".to_string());
    lines.push("# Generated dynamically by the edge bot gate".to_string());
    lines.push(String::new());

    for bot in BLOCKED_AI_CRAWLERS {
        push_group(&mut lines, bot, "Disallow: /");
    }

    lines.push("# Allow legitimate search engines".to_string());
    for bot in ALLOWED_SEARCH_ENGINES {
        push_group(&mut lines, bot, "Allow: /");
    }

    lines.push("# Block aggressive crawlers and scrapers".to_string());
    for bot in BLOCKED_SCRAPERS {
        push_group(&mut lines, bot, "Disallow: /");
    }

    lines.push("# Default policy for other bots".to_string());
    lines.push("User-agent: *".to_string());
    lines.push("Allow: /".to_string());
    for path in DISALLOWED_PATHS {
        lines.push(format!("Disallow: {}", path));
    }
    if cfg.robots_crawl_delay > 0 {
        lines.push(format!("Crawl-delay: {}", cfg.robots_crawl_delay));
    }

    if let Some(sitemap) = &cfg.sitemap_url {
        lines.push(String::new());
        lines.push(format!("Sitemap: {}", sitemap));
    }

    lines.push(String::new());
    lines.push(format!("# Last updated: {}", crate::iso_timestamp(generated_at)));
    lines.push(String::new());

    lines.join("\n")
}

pub fn robots_response(cfg: &GateConfig, user_agent: &str) -> Response {
    if !cfg.robots_enabled {
        return Response::new(404, "Not Found");
    }
    crate::log_line(&format!("[robots] robots.txt accessed by: {}", user_agent));
    Response::builder()
        .status(200)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("Cache-Control", "public, max-age=3600")
        .header("X-Robots-Tag", "noindex, nofollow")
        .body(generate_robots_txt(cfg, Utc::now()))
        .build()
}
