//! HTTP response handlers.

use std::{fs, path::Path};

use anyhow::{Context, Result, anyhow};
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::embed::serve::{reload_js, reload_script_tag};
use crate::utils::mime::{self, types};

/// Respond with a static file, injecting the reload script into HTML.
pub fn respond_file(request: Request, path: &Path) -> Result<()> {
    let content_type = mime::from_path(path);
    reply(request, 200, content_type, || {
        let body =
            fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(if mime::is_html(content_type) {
            inject_reload_script(&body)
        } else {
            body
        })
    })
}

/// Respond with the live reload client, pointed at `ws_port`.
pub fn respond_reload_js(request: Request, ws_port: u16) -> Result<()> {
    reply(request, 200, types::JAVASCRIPT, || {
        Ok(reload_js(ws_port).into_bytes())
    })
}

pub fn respond_not_found(request: Request) -> Result<()> {
    reply(request, 404, types::PLAIN, || Ok(b"404 Not Found".to_vec()))
}

/// Shutdown has begun.
pub fn respond_unavailable(request: Request) -> Result<()> {
    reply(request, 503, types::PLAIN, || {
        Ok(b"503 Service Unavailable".to_vec())
    })
}

/// Insert the reload `<script>` before the last `</body>`, or append it
/// when the document has none.
pub fn inject_reload_script(content: &[u8]) -> Vec<u8> {
    const BODY_CLOSE: &[u8] = b"</body>";
    let tag = reload_script_tag();

    let at = content
        .windows(BODY_CLOSE.len())
        .rposition(|w| w.eq_ignore_ascii_case(BODY_CLOSE))
        .unwrap_or(content.len());

    let (head, tail) = content.split_at(at);
    [head, tag.as_bytes(), tail].concat()
}

/// Send `status` with headers; the body is only produced for non-HEAD
/// requests.
fn reply(
    request: Request,
    status: u16,
    content_type: &'static str,
    body: impl FnOnce() -> Result<Vec<u8>>,
) -> Result<()> {
    let headers = [
        header("Content-Type", content_type)?,
        header("Cache-Control", "no-store")?,
    ];

    if request.method() == &Method::Head {
        let mut response = Response::empty(StatusCode(status));
        for h in headers {
            response.add_header(h);
        }
        request.respond(response)?;
    } else {
        let mut response = Response::from_data(body()?).with_status_code(StatusCode(status));
        for h in headers {
            response.add_header(h);
        }
        request.respond(response)?;
    }
    Ok(())
}

fn header(key: &'static str, value: &'static str) -> Result<Header> {
    Header::from_bytes(key, value).map_err(|()| anyhow!("invalid header {key}: {value}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inject_before_last_body_close() {
        let html = b"<html><body><p></body></p></BODY></html>";
        let injected = String::from_utf8(inject_reload_script(html)).unwrap();
        let tag = reload_script_tag();

        assert!(injected.contains(&format!("</p>{tag}</BODY>")));
        assert_eq!(injected.matches(&tag).count(), 1);
    }

    #[test]
    fn test_inject_appends_without_body() {
        let injected = String::from_utf8(inject_reload_script(b"<p>hi</p>")).unwrap();
        assert!(injected.starts_with("<p>hi</p>"));
        assert!(injected.ends_with(&reload_script_tag()));
    }
}
