#![allow(dead_code)]

use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use vidquery::db::QueryExecutor;
use vidquery::llm::CompletionProvider;
use vidquery::{AcceptedSql, PipelineError, Result};

pub const CREATOR_A: &str = "cd87be38b50b4fdd8342bb3c383f3c7d";
pub const CREATOR_B: &str = "8b76e572635b400c9052286a56176e03";

/// A SQLite file with both tables and a small, known dataset.
pub struct Fixture {
    pub path: PathBuf,
}

impl Fixture {
    pub fn create() -> Fixture {
        let path = std::env::temp_dir().join(format!("vidquery-fixture-{}.db", uuid::Uuid::new_v4()));
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE videos (
                id TEXT PRIMARY KEY,
                creator_id TEXT NOT NULL,
                video_created_at TEXT NOT NULL,
                views_count INTEGER NOT NULL,
                likes_count INTEGER NOT NULL,
                comments_count INTEGER NOT NULL,
                reports_count INTEGER NOT NULL
            );
            CREATE TABLE video_snapshots (
                id TEXT PRIMARY KEY,
                video_id TEXT NOT NULL REFERENCES videos(id),
                views_count INTEGER NOT NULL,
                likes_count INTEGER NOT NULL,
                comments_count INTEGER NOT NULL,
                reports_count INTEGER NOT NULL,
                delta_views_count INTEGER NOT NULL,
                delta_likes_count INTEGER NOT NULL,
                delta_comments_count INTEGER NOT NULL,
                delta_reports_count INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .unwrap();

        let videos = [
            ("v1", CREATOR_A, "2025-11-26 09:15:00+00", 1200),
            ("v2", CREATOR_A, "2025-11-27 20:00:00+00", 300),
            ("v3", CREATOR_B, "2025-11-01 12:00:00+00", 150_000),
        ];
        for (id, creator, published, views) in videos {
            conn.execute(
                "INSERT INTO videos VALUES (?1, ?2, ?3, ?4, 0, 0, 0)",
                params![id, creator, published, views],
            )
            .unwrap();
        }

        // (id, video, captured at, delta views)
        let snapshots = [
            ("s1", "v1", "2025-11-28 09:00:00+00", 999),
            ("s2", "v1", "2025-11-28 10:00:00+00", 100),
            ("s3", "v1", "2025-11-28 12:00:00+00", 50),
            ("s4", "v2", "2025-11-28 14:00:00+00", -5),
            ("s5", "v2", "2025-11-28 15:00:00+00", 700),
            ("s6", "v3", "2025-11-28 11:00:00+00", 40),
        ];
        for (id, video, captured, delta) in snapshots {
            conn.execute(
                "INSERT INTO video_snapshots VALUES (?1, ?2, 0, 0, 0, 0, ?3, 0, 0, 0, ?4)",
                params![id, video, delta, captured],
            )
            .unwrap();
        }

        Fixture { path }
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Replies with a fixed completion, or a fixed failure.
pub struct ScriptedProvider {
    reply: std::result::Result<String, String>,
    pub calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self { reply: Ok(text.to_string()), calls: AtomicUsize::new(0) })
    }

    pub fn failing(detail: &str) -> Arc<Self> {
        Arc::new(Self { reply: Err(detail.to_string()), calls: AtomicUsize::new(0) })
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply
            .clone()
            .map_err(PipelineError::UpstreamUnavailable)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Wraps another executor and records every statement it is handed.
pub struct CountingExecutor {
    inner: Option<Arc<dyn QueryExecutor>>,
    pub statements: Mutex<Vec<String>>,
}

impl CountingExecutor {
    pub fn wrapping(inner: Arc<dyn QueryExecutor>) -> Arc<Self> {
        Arc::new(Self { inner: Some(inner), statements: Mutex::new(Vec::new()) })
    }

    /// Answers 0 for anything without touching a store.
    pub fn detached() -> Arc<Self> {
        Arc::new(Self { inner: None, statements: Mutex::new(Vec::new()) })
    }

    pub fn call_count(&self) -> usize {
        self.statements.lock().unwrap().len()
    }
}

#[async_trait]
impl QueryExecutor for CountingExecutor {
    async fn fetch_scalar(&self, sql: &AcceptedSql) -> Result<i64> {
        self.statements.lock().unwrap().push(sql.as_str().to_string());
        match &self.inner {
            Some(inner) => inner.fetch_scalar(sql).await,
            None => Ok(0),
        }
    }

    fn name(&self) -> &str {
        "counting"
    }
}

/// Minimal HTTP/1.1 responder. Returns the base URL and the request bodies
/// it has seen.
pub async fn spawn_http_responder(status_line: &'static str, body: String) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&seen);

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let request_body = read_request_body(&mut stream).await;
            recorded.lock().unwrap().push(request_body);
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    (format!("http://{}", addr), seen)
}

/// Accepts connections, reads the request and never answers.
pub async fn spawn_hanging_responder() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let _ = read_request_body(&mut stream).await;
            held.push(stream);
        }
    });

    format!("http://{}", addr)
}

async fn read_request_body(stream: &mut TcpStream) -> String {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buffer.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buffer);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (key, value) = line.split_once(':')?;
                    key.trim()
                        .eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            let body_start = header_end + 4;
            if buffer.len() >= body_start + content_length {
                return String::from_utf8_lossy(&buffer[body_start..body_start + content_length]).into_owned();
            }
        }
    }

    String::new()
}
