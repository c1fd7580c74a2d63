//! Development server with live rebuild.
//!
//! A lightweight HTTP server built on `tiny_http` that answers requests
//! straight from the in-memory output index of the current [`Site`]. The
//! watcher thread rebuilds a whole new site on file changes and swaps it
//! in atomically, so a request always sees either the old complete site
//! or the new complete site, never a half-rebuilt one.

use crate::build::build_site;
use crate::config::SiteConfig;
use crate::log;
use crate::site::{OutputRef, Site};
use crate::watch::watch_for_changes_blocking;
use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use std::fs;
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;
use tiny_http::{Header, Request, Response, Server, StatusCode};

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

/// Build the site, then serve it until Ctrl+C.
///
/// 1. Binds the configured interface and port (auto-retry on conflict)
/// 2. Spawns the file watcher thread (if enabled)
/// 3. Handles requests on the main thread against the swappable site
pub fn serve_site(config: &'static SiteConfig) -> Result<()> {
    let site = Arc::new(ArcSwap::from(build_site(config)?));

    let interface: std::net::IpAddr = config
        .serve
        .interface
        .parse()
        .context("invalid serve interface")?;
    let (server, addr) = try_bind_port(interface, config.serve.port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);

    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        server_for_signal.unblock();
    })
    .context("failed to set Ctrl+C handler")?;

    log!("serve"; "http://{addr}");

    if config.serve.watch {
        let site_for_watch = Arc::clone(&site);
        std::thread::spawn(move || {
            if let Err(err) = watch_for_changes_blocking(config, site_for_watch) {
                log!("watch"; "{err}");
            }
        });
    }

    for request in server.incoming_requests() {
        let current = site.load_full();
        if let Err(err) = handle_request(request, &current) {
            log!("serve"; "request error: {err}");
        }
    }

    Ok(())
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(
    interface: std::net::IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(Server, SocketAddr)> {
    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {base_port} in use, using {port} instead");
                }
                return Ok((server, addr));
            }
            Err(_) if offset + 1 < max_retries => continue,
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "failed to bind after {max_retries} attempts (ports {base_port}-{port}): {e}"
                ));
            }
        }
    }
    unreachable!()
}

/// Answer one request from the site's output index.
///
/// Resolution order: exact permalink or alias or resource URL, then the
/// same with a trailing slash stripped, then 404.
fn handle_request(request: Request, site: &Site) -> Result<()> {
    let url_path = urlencoding::decode(request.url())
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();

    // Strip query string (e.g. cache busters) before lookup.
    let path = url_path.split('?').next().unwrap_or(&url_path);
    let normalized = normalize_request_path(path);

    match resolve_output(site, &normalized) {
        Some(OutputRef::Page(id)) => {
            let Some(page) = site.page(id) else {
                return serve_not_found(request);
            };
            let content_type = format!("{}; charset=utf-8", page.format.media_type);
            let response = Response::from_string(page.complete_content(site))
                .with_header(header("Content-Type", &content_type));
            request.respond(response)?;
            Ok(())
        }
        Some(OutputRef::Resource(resource)) => {
            let path = site.config.build.content.join(&resource.rel_path);
            let content =
                fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
            let response = Response::from_data(content)
                .with_header(header("Content-Type", guess_content_type(&resource.name)));
            request.respond(response)?;
            Ok(())
        }
        None => serve_not_found(request),
    }
}

/// Look up a normalized request path in the output index.
///
/// With ugly URLs the home page registers only under its file name, so a
/// bare `/` request falls back to `/index.html`.
fn resolve_output(site: &Site, normalized: &str) -> Option<OutputRef> {
    if let Some(output) = site.lookup_output(normalized) {
        return Some(output);
    }
    if normalized == "/" {
        return site.lookup_output("/index.html");
    }
    None
}

/// Map a raw request path onto an output-index key: rooted, no trailing
/// slash except for the root itself.
fn normalize_request_path(path: &str) -> String {
    let mut trimmed = path.trim_matches('/');
    // Pretty permalinks are registered without their index file name.
    if trimmed == "index.html" {
        trimmed = "";
    } else {
        trimmed = trimmed.strip_suffix("/index.html").unwrap_or(trimmed);
    }
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn serve_not_found(request: Request) -> Result<()> {
    let response = Response::new(
        StatusCode(404),
        vec![header("Content-Type", "text/plain")],
        Cursor::new("404 Not Found"),
        Some(13),
        None,
    );
    request.respond(response)?;
    Ok(())
}

fn header(field: &str, value: &str) -> Header {
    // Both inputs are valid header text by construction.
    Header::from_bytes(field.as_bytes(), value.as_bytes()).unwrap_or_else(|_| unreachable!())
}

/// Guess MIME content type for a resource file name.
fn guess_content_type(name: &str) -> &'static str {
    match name.rsplit_once('.').map(|(_, ext)| ext) {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain; charset=utf-8",
        Some("md") => "text/markdown; charset=utf-8",
        _ => "application/octet-stream",
    }
}
