use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value;

/// Manage articles, projects, events and courses of a research site.
#[derive(Parser)]
#[command(name = "research-site-admin", version, about)]
struct Cli {
    /// Base URL of the site.
    #[arg(long, env = "RESEARCH_SITE_URL", default_value = "http://localhost:3000", global = true)]
    server: String,

    /// Admin email, needed for create/update/delete.
    #[arg(long, env = "SITE_ADMIN_EMAIL", global = true)]
    email: Option<String>,

    /// Admin password, needed for create/update/delete.
    #[arg(long, env = "SITE_ADMIN_PASSWORD", global = true, hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the records of a collection, newest first.
    List {
        collection: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print one record as JSON.
    Show { collection: String, id: String },
    /// Create a record.
    Create {
        collection: String,
        #[command(flatten)]
        content: ContentArgs,
    },
    /// Edit a record. Existing gallery images are kept unless `--keep` or
    /// `--clear-gallery` is given.
    Update {
        collection: String,
        id: String,
        #[command(flatten)]
        content: ContentArgs,
        /// Gallery URL to keep, in display order. Repeatable.
        #[arg(long = "keep", value_name = "URL")]
        keep: Vec<String>,
        /// Drop every existing gallery image.
        #[arg(long, conflicts_with = "keep")]
        clear_gallery: bool,
    },
    /// Delete a record and its images.
    Delete { collection: String, id: String },
}

#[derive(Args)]
struct ContentArgs {
    /// Field value as `name=value`. Repeatable.
    #[arg(long = "field", short = 'f', value_name = "NAME=VALUE", value_parser = parse_field)]
    fields: Vec<(String, String)>,
    /// `YYYY-MM-DD` or RFC 3339.
    #[arg(long)]
    published_at: Option<String>,
    #[arg(long)]
    thumbnail: Option<PathBuf>,
    /// Gallery image, in display order. Repeatable.
    #[arg(long = "gallery", value_name = "PATH")]
    gallery: Vec<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing field name in '{raw}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

fn file_part(path: &Path) -> Result<Part> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    let mime = mime_guess::from_path(path).first_or_octet_stream();

    Part::bytes(data)
        .file_name(file_name)
        .mime_str(mime.essence_str())
        .map_err(|e| anyhow!("Invalid content type for {}: {}", path.display(), e))
}

fn content_form(content: ContentArgs, retained: &[String], clear_gallery: bool) -> Result<Form> {
    let mut form = Form::new();
    for (name, value) in content.fields {
        form = form.text(name, value);
    }
    if let Some(published_at) = content.published_at {
        form = form.text("published_at", published_at);
    }
    for url in retained {
        form = form.text("retained_gallery", url.clone());
    }
    if clear_gallery {
        form = form.text("clear_gallery", "true");
    }
    if let Some(thumbnail) = &content.thumbnail {
        form = form.part("thumbnail", file_part(thumbnail)?);
    }
    for path in &content.gallery {
        form = form.part("gallery", file_part(path)?);
    }
    Ok(form)
}

/// The user-visible text of an API response body.
fn message_of(body: &Value) -> Option<&str> {
    body.get("message")
        .or_else(|| body.get("error"))
        .and_then(Value::as_str)
}

struct Client {
    http: reqwest::Client,
    base: String,
}

impl Client {
    fn new(server: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: server.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn login(&self, email: Option<String>, password: Option<String>) -> Result<String> {
        let email = email.ok_or_else(|| anyhow!("--email (or SITE_ADMIN_EMAIL) is required"))?;
        let password = password.ok_or_else(|| anyhow!("--password (or SITE_ADMIN_PASSWORD) is required"))?;

        let response = self
            .http
            .post(self.url("/api/auth/login"))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .context("Failed to reach the server")?;
        let body = outcome(response).await?;
        let login: LoginResponse = serde_json::from_value(body).context("Unexpected login response")?;
        Ok(login.token)
    }

    async fn get(&self, path: &str) -> Result<Value> {
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .context("Failed to reach the server")?;
        outcome(response).await
    }
}

async fn outcome(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    if status.is_success() {
        Ok(body)
    } else {
        bail!("{}", message_of(&body).unwrap_or(status.as_str()))
    }
}

async fn run(cli: Cli) -> Result<()> {
    let client = Client::new(&cli.server);

    match cli.command {
        Commands::List { collection, limit } => {
            let mut path = format!("/api/v1/{collection}");
            if let Some(limit) = limit {
                path.push_str(&format!("?limit={limit}"));
            }
            let records = client.get(&path).await?;
            for record in records.as_array().into_iter().flatten() {
                println!(
                    "{}  {}  {}",
                    record["id"].as_str().unwrap_or("?"),
                    record["published_at"].as_str().unwrap_or("?"),
                    record["fields"]["title"].as_str().unwrap_or("")
                );
            }
        }
        Commands::Show { collection, id } => {
            let record = client.get(&format!("/api/v1/{collection}/{id}")).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Create { collection, content } => {
            let token = client.login(cli.email, cli.password).await?;
            let form = content_form(content, &[], false)?;
            println!("Creating {collection}...");
            let response = client
                .http
                .post(client.url(&format!("/api/v1/admin/{collection}")))
                .bearer_auth(&token)
                .multipart(form)
                .send()
                .await
                .context("Failed to reach the server")?;
            let body = outcome(response).await?;
            println!("{}", message_of(&body).unwrap_or("Created"));
        }
        Commands::Update {
            collection,
            id,
            content,
            keep,
            clear_gallery,
        } => {
            let token = client.login(cli.email, cli.password).await?;
            let form = content_form(content, &keep, clear_gallery)?;
            println!("Updating {collection}/{id}...");
            let response = client
                .http
                .put(client.url(&format!("/api/v1/admin/{collection}/{id}")))
                .bearer_auth(&token)
                .multipart(form)
                .send()
                .await
                .context("Failed to reach the server")?;
            let body = outcome(response).await?;
            println!("{}", message_of(&body).unwrap_or("Updated"));
        }
        Commands::Delete { collection, id } => {
            let token = client.login(cli.email, cli.password).await?;
            println!("Deleting {collection}/{id}...");
            let response = client
                .http
                .delete(client.url(&format!("/api/v1/admin/{collection}/{id}")))
                .bearer_auth(&token)
                .send()
                .await
                .context("Failed to reach the server")?;
            let body = outcome(response).await?;
            println!("{}", message_of(&body).unwrap_or("Deleted"));
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("[ERROR] {:#}", e);
        std::process::exit(1);
    }
}
