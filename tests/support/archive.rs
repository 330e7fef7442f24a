//! Builders for a fake paper archive served by wiremock.
//!
//! Paths follow the default site layout: collections under
//! `/paper_files/paper/<year>`, detail pages ending in
//! `Abstract-Conference.html`, artifacts ending in `Paper-Conference.pdf`.

#![allow(dead_code)]

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub fn collection_path(year: u32) -> String {
    format!("/paper_files/paper/{year}")
}

pub fn detail_path(year: u32, id: &str) -> String {
    format!("/paper_files/paper/{year}/hash/{id}-Abstract-Conference.html")
}

pub fn artifact_path(year: u32, id: &str) -> String {
    format!("/paper_files/paper/{year}/file/{id}-Paper-Conference.pdf")
}

pub fn root_html(collections: &[String]) -> String {
    let links: String = collections
        .iter()
        .map(|href| format!(r#"<li><a href="{href}">{href}</a></li>"#))
        .collect();
    format!("<html><head><title>Archive</title></head><body><ul>{links}</ul></body></html>")
}

pub fn collection_html(items: &[String]) -> String {
    let links: String = items
        .iter()
        .map(|href| format!(r#"<li><a href="{href}">paper</a></li>"#))
        .collect();
    format!(r#"<html><body><ul class="paper-list">{links}</ul></body></html>"#)
}

pub fn detail_html(title: &str, artifact_href: Option<&str>) -> String {
    let link = artifact_href
        .map(|href| format!(r#"<a class="btn" href="{href}">Paper</a>"#))
        .unwrap_or_default();
    format!("<html><head><title>{title}</title></head><body><h4>Abstract</h4>{link}</body></html>")
}

pub async fn mount_html(server: &MockServer, page_path: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(page_path.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/html; charset=utf-8")
                .set_body_string(html),
        )
        .mount(server)
        .await;
}

pub async fn mount_bytes(server: &MockServer, file_path: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(file_path.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

pub async fn mount_status(server: &MockServer, any_path: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(any_path.to_string()))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Mounts one item: its detail page and its artifact body.
pub async fn mount_item(server: &MockServer, year: u32, id: &str, title: &str, body: &[u8]) {
    let artifact = artifact_path(year, id);
    mount_html(server, &detail_path(year, id), detail_html(title, Some(&artifact))).await;
    mount_bytes(server, &artifact, body).await;
}
