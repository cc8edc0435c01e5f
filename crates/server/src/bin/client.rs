//! Walks a running server through the basic comment lifecycle.

use anyhow::{bail, Context};
use serde::Serialize;
use serde_json::Value;

const BASE_URL: &str = "http://127.0.0.1:3000";
const PAGE_URL: &str = "https://demo.example/hello";
const USER_HEADER: &str = "x-user-id";

#[derive(Serialize)]
struct CreateCommentRequest<'a> {
    page_url: &'a str,
    body: &'a str,
    pos_x: &'a str,
    pos_y: &'a str,
    parent_id: i64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let base = std::env::var("MARGINALIA_CLIENT_URL").unwrap_or_else(|_| BASE_URL.to_string());
    let client = reqwest::Client::new();
    println!("Starting comment test client against {}...", base);

    println!("\n[1/5] user 42 pins a comment...");
    let resp = client
        .post(format!("{}/api/comments", base))
        .header(USER_HEADER, "42")
        .json(&CreateCommentRequest {
            page_url: PAGE_URL,
            body: "Looks great",
            pos_x: "120px",
            pos_y: "340px",
            parent_id: 0,
        })
        .send()
        .await
        .context("Is the server running?")?;
    let created: Value = resp.json().await?;
    let id = created["id"].as_i64().context("Missing id in response")?;
    println!("   -> id {}", id);

    println!("\n[2/5] user 7 replies...");
    let resp = client
        .post(format!("{}/api/comments", base))
        .header(USER_HEADER, "7")
        .json(&CreateCommentRequest {
            page_url: PAGE_URL,
            body: "Agreed",
            pos_x: "120px",
            pos_y: "340px",
            parent_id: id,
        })
        .send()
        .await?;
    println!("   -> {}", resp.status());

    println!("\n[3/5] listing threads...");
    let threads: Value = client
        .get(format!("{}/api/threads", base))
        .query(&[("page_url", PAGE_URL)])
        .header(USER_HEADER, "42")
        .send()
        .await?
        .json()
        .await?;
    println!("{}", serde_json::to_string_pretty(&threads)?);

    println!("\n[4/5] user 7 tries to delete the thread...");
    let resp = client
        .delete(format!("{}/api/comments/{}", base, id))
        .header(USER_HEADER, "7")
        .send()
        .await?;
    if resp.status().is_success() {
        bail!("Foreign delete unexpectedly succeeded");
    }
    println!("   -> refused: {}", resp.text().await?);

    println!("\n[5/5] user 42 deletes it...");
    let resp = client
        .delete(format!("{}/api/comments/{}", base, id))
        .header(USER_HEADER, "42")
        .send()
        .await?;
    println!("   -> {}", resp.status());

    let left: Value = client
        .get(format!("{}/api/comments", base))
        .query(&[("page_url", PAGE_URL)])
        .header(USER_HEADER, "42")
        .send()
        .await?
        .json()
        .await?;
    println!("\nRemaining comments: {}", left);
    Ok(())
}
