use crate::models::{NewTask, Task, TaskPatch};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{}", status_message(.status, .body))]
    Status { status: u16, body: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response: {0}")]
    Decode(String),
}

// The server's text when it sent any, otherwise the bare status.
fn status_message(status: &u16, body: &str) -> String {
    if body.trim().is_empty() {
        format!("server returned status {}", status)
    } else {
        body.to_string()
    }
}

/// The four calls the task list needs from the server.
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list_tasks(&self) -> Result<Vec<Task>, ApiError>;
    async fn create_task(&self, task: &NewTask) -> Result<(), ApiError>;
    async fn update_task(&self, id: u64, patch: &TaskPatch) -> Result<(), ApiError>;
    async fn delete_task(&self, id: u64) -> Result<(), ApiError>;
}

pub struct HttpTaskApi {
    client: Client,
    base_url: String,
}

impl HttpTaskApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(HttpTaskApi {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/api/todos", self.base_url)
    }

    fn task_url(&self, id: u64) -> String {
        format!("{}/api/todos/{}", self.base_url, id)
    }
}

// Non-2xx responses carry the server's text as the error.
async fn check_status(res: Response) -> Result<Response, ApiError> {
    if res.status().is_success() {
        Ok(res)
    } else {
        let status = res.status().as_u16();
        let body = res.text().await.unwrap_or_default();
        warn!(status, %body, "server rejected request");
        Err(ApiError::Status { status, body })
    }
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
        let url = self.collection_url();
        debug!(%url, "GET");
        let res = check_status(self.client.get(&url).send().await?).await?;
        let body = res.text().await?;
        serde_json::from_str(&body).map_err(|err| ApiError::Decode(err.to_string()))
    }

    async fn create_task(&self, task: &NewTask) -> Result<(), ApiError> {
        let url = self.collection_url();
        debug!(%url, title = %task.title, "POST");
        check_status(self.client.post(&url).json(task).send().await?).await?;
        Ok(())
    }

    async fn update_task(&self, id: u64, patch: &TaskPatch) -> Result<(), ApiError> {
        let url = self.task_url(id);
        debug!(%url, ?patch, "PUT");
        check_status(self.client.put(&url).json(patch).send().await?).await?;
        Ok(())
    }

    async fn delete_task(&self, id: u64) -> Result<(), ApiError> {
        let url = self.task_url(id);
        debug!(%url, "DELETE");
        check_status(self.client.delete(&url).send().await?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    // One-shot HTTP server: answers a single request with `response` and
    // hands back the raw request it received.
    async fn serve_once(response: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            request
        });
        (base_url, handle)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(head_end) = text.find("\r\n\r\n") {
                let content_length = text[..head_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= head_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    fn http_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
    }

    fn request_body(request: &str) -> serde_json::Value {
        let (_, body) = request.split_once("\r\n\r\n").unwrap();
        serde_json::from_str(body).unwrap()
    }

    fn api(base_url: &str) -> HttpTaskApi {
        HttpTaskApi::new(base_url, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_urls_ignore_trailing_slash() {
        let api = HttpTaskApi::new("http://localhost:3000/", Duration::from_secs(1)).unwrap();
        assert_eq!(api.collection_url(), "http://localhost:3000/api/todos");
        assert_eq!(api.task_url(7), "http://localhost:3000/api/todos/7");
    }

    #[test]
    fn test_status_error_displays_server_text() {
        let err = ApiError::Status {
            status: 400,
            body: "title too long".to_string(),
        };
        assert_eq!(err.to_string(), "title too long");
    }

    #[test]
    fn test_status_error_without_body_names_status() {
        let err = ApiError::Status {
            status: 503,
            body: "  \n".to_string(),
        };
        assert_eq!(err.to_string(), "server returned status 503");
    }

    #[tokio::test]
    async fn test_list_decodes_task_array() {
        let body = r#"[{"id":1,"title":"Buy milk","completed":false,"createdAt":"2024-05-01T10:00:00Z"}]"#;
        let (base_url, server) = serve_once(http_response("200 OK", body)).await;

        let tasks = api(&base_url).list_tasks().await.unwrap();
        let request = server.await.unwrap();

        assert!(request.starts_with("GET /api/todos HTTP/1.1"));
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Buy milk");
        assert!(!tasks[0].completed);
    }

    #[tokio::test]
    async fn test_list_with_bad_json_is_decode_error() {
        let (base_url, server) = serve_once(http_response("200 OK", "<html>oops</html>")).await;

        let err = api(&base_url).list_tasks().await.unwrap_err();
        server.await.unwrap();

        assert!(matches!(err, ApiError::Decode(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_create_failure_carries_server_text() {
        let (base_url, server) =
            serve_once(http_response("400 Bad Request", "title is required")).await;

        let new = NewTask {
            title: "A".to_string(),
            description: "first".to_string(),
        };
        let err = api(&base_url).create_task(&new).await.unwrap_err();
        let request = server.await.unwrap();

        assert!(request.starts_with("POST /api/todos HTTP/1.1"));
        assert_eq!(request_body(&request), json!({"title": "A", "description": "first"}));
        match err {
            ApiError::Status { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "title is required");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_sends_partial_patch() {
        let (base_url, server) = serve_once(http_response("200 OK", "{}")).await;

        api(&base_url)
            .update_task(4, &TaskPatch::completed(true))
            .await
            .unwrap();
        let request = server.await.unwrap();

        assert!(request.starts_with("PUT /api/todos/4 HTTP/1.1"));
        assert_eq!(request_body(&request), json!({"completed": true}));
    }

    #[tokio::test]
    async fn test_delete_with_empty_error_body_keeps_status() {
        let (base_url, server) = serve_once(http_response("404 Not Found", "")).await;

        let err = api(&base_url).delete_task(9).await.unwrap_err();
        let request = server.await.unwrap();

        assert!(request.starts_with("DELETE /api/todos/9 HTTP/1.1"));
        assert!(matches!(err, ApiError::Status { status: 404, .. }));
        assert_eq!(err.to_string(), "server returned status 404");
    }

    #[tokio::test]
    async fn test_stalled_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });

        let api = HttpTaskApi::new(&base_url, Duration::from_millis(200)).unwrap();
        let err = api.list_tasks().await.unwrap_err();
        server.abort();

        match err {
            ApiError::Transport(err) => assert!(err.is_timeout()),
            other => panic!("expected transport error, got {:?}", other),
        }
    }
}
