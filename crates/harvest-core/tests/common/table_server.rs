//! Minimal HTTP/1.1 server that serves a paginated HTML table for integration tests.
//!
//! `GET /list?page=N` answers with a data page when the request carries the
//! expected session cookie and redirects to `/login` otherwise. Pages listed
//! in `challenge_pages` answer with a verification interstitial instead.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone, Default)]
pub struct TableServerOptions {
    /// `name=value` that must appear in the Cookie header.
    pub session_cookie: String,
    /// Page number → body rows as (rank, domain, ip, owner).
    pub pages: HashMap<usize, Vec<(String, String, String, String)>>,
    /// Page numbers served as a challenge page.
    pub challenge_pages: Vec<usize>,
}

/// Starts a server in a background thread. Returns the base URL
/// (e.g. "http://127.0.0.1:12345/"). The server runs until the process exits.
pub fn start(opts: TableServerOptions) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let opts = Arc::new(opts);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let opts = Arc::clone(&opts);
            thread::spawn(move || handle(stream, &opts));
        }
    });
    format!("http://127.0.0.1:{}/", port)
}

fn handle(mut stream: std::net::TcpStream, opts: &TableServerOptions) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let (path, cookie) = parse_request(request);

    if path.starts_with("/login") {
        respond(&mut stream, "200 OK", "", &page("Sign in", "<form><input name=user></form>"));
        return;
    }
    let Some(page_no) = path
        .strip_prefix("/list?page=")
        .and_then(|p| p.parse::<usize>().ok())
    else {
        respond(&mut stream, "404 Not Found", "", &page("Not Found", ""));
        return;
    };
    if !cookie.split(';').any(|c| c.trim() == opts.session_cookie) {
        respond(&mut stream, "302 Found", "Location: /login?next=%2Flist\r\n", "");
        return;
    }
    if opts.challenge_pages.contains(&page_no) {
        let body = page("Security Check", "<p>Please confirm you are human.</p>");
        respond(&mut stream, "200 OK", "", &body);
        return;
    }
    match opts.pages.get(&page_no) {
        Some(rows) => respond(&mut stream, "200 OK", "", &table_page(page_no, rows)),
        None => respond(&mut stream, "200 OK", "", &page("Top Domains", "<p>Nothing here.</p>")),
    }
}

fn respond(stream: &mut std::net::TcpStream, status: &str, extra_headers: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n{}\r\n",
        status,
        body.len(),
        extra_headers
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.write_all(body.as_bytes());
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>{}</title></head><body>{}</body></html>",
        title, body
    )
}

fn table_page(page_no: usize, rows: &[(String, String, String, String)]) -> String {
    let mut html = String::from(
        "<table id=\"ranking\"><thead><tr><th>#</th><th>Domain</th><th>IP</th>\
         <th>Location</th><th>Owner</th><th>Updated</th></tr></thead><tbody>",
    );
    for (rank, domain, ip, owner) in rows {
        html.push_str(&format!(
            "<tr><td>{rank}</td><td><a href=\"/domain/{domain}\">{domain}</a></td>\
             <td><a href=\"/ip/{ip}\">{ip}</a></td><td>Frankfurt, DE</td>\
             <td><a href=\"/owner/{owner}\">{owner}</a></td><td>2026-10-01</td></tr>",
            rank = rank,
            domain = domain,
            ip = ip,
            owner = owner
        ));
    }
    html.push_str("</tbody></table>");
    page(&format!("Top Domains - Page {}", page_no), &html)
}

/// Returns (request target, Cookie header value).
fn parse_request(request: &str) -> (&str, &str) {
    let mut target = "";
    let mut cookie = "";
    for line in request.lines() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if target.is_empty() {
            target = line.split_whitespace().nth(1).unwrap_or("");
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("cookie") {
                cookie = value.trim();
            }
        }
    }
    (target, cookie)
}
