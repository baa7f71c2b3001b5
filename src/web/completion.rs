//! Chat-completion client for the hosted script generator.
//!
//! One blocking POST per job to `<base_url>/chat/completions`, a single user
//! message carrying the prompt, and the first choice's content handed back
//! untouched. No retries.
use std::time::Duration;

use label_forge_config::{ApiKey, AppConfig};
use label_forge_types::GeneratedScript;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sys_debug;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("completion API unreachable: {0}")]
    Transport(String),
    #[error("failed to read completion response: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse completion response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("completion response contained no choices")]
    NoChoices,
}

/// Anything that turns a prompt into script text.
pub trait CompletionClient: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<GeneratedScript, CompletionError>;
}

#[derive(Serialize, Debug)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize, Debug)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn request_body(model: &str, prompt: &str) -> Result<String, serde_json::Error> {
    serde_json::to_string(&ChatRequest {
        model,
        messages: vec![ChatMessage {
            role: "user",
            content: prompt,
        }],
    })
}

fn parse_response(body: &str) -> Result<GeneratedScript, CompletionError> {
    let response: ChatResponse = serde_json::from_str(body)?;
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| GeneratedScript(choice.message.content.unwrap_or_default()))
        .ok_or(CompletionError::NoChoices)
}

/// OpenAI-compatible endpoint over `ureq`.
pub struct OpenAiClient {
    agent: ureq::Agent,
    endpoint: String,
    model: String,
    api_key: ApiKey,
}

impl OpenAiClient {
    pub fn new(base_url: &str, model: &str, api_key: ApiKey, timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self {
            agent: builder.build(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.to_string(),
            api_key,
        }
    }

    pub fn from_config(config: &AppConfig, api_key: ApiKey) -> Self {
        Self::new(
            &config.completion_base_url,
            &config.completion_model,
            api_key,
            config.request_timeout(),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl CompletionClient for OpenAiClient {
    fn complete(&self, prompt: &str) -> Result<GeneratedScript, CompletionError> {
        let body = request_body(&self.model, prompt)?;
        sys_debug!("POST {} ({} prompt chars)", self.endpoint, prompt.len());

        let response = self
            .agent
            .post(&self.endpoint)
            .set("Authorization", &format!("Bearer {}", self.api_key.expose()))
            .set("Content-Type", "application/json")
            .send_string(&body)
            .map_err(|e| match e {
                ureq::Error::Status(status, resp) => CompletionError::Status {
                    status,
                    body: resp.into_string().unwrap_or_default(),
                },
                ureq::Error::Transport(t) => CompletionError::Transport(t.to_string()),
            })?;

        let text = response.into_string()?;
        parse_response(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread::{self, JoinHandle};

    #[test]
    fn test_request_body_single_user_message() {
        let body: Value = serde_json::from_str(&request_body("gpt-4", "Write a script").unwrap()).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "gpt-4",
                "messages": [{"role": "user", "content": "Write a script"}]
            })
        );
    }

    #[test]
    fn test_parse_first_choice() {
        let body = r#"{"id":"x","choices":[
            {"index":0,"message":{"role":"assistant","content":"import bpy\n"}},
            {"index":1,"message":{"role":"assistant","content":"ignored"}}
        ]}"#;
        assert_eq!(parse_response(body).unwrap().as_str(), "import bpy\n");
    }

    #[test]
    fn test_parse_no_choices() {
        assert!(matches!(
            parse_response(r#"{"choices":[]}"#),
            Err(CompletionError::NoChoices)
        ));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(parse_response("<html>"), Err(CompletionError::Decode(_))));
    }

    // Answers one request with `status_line` and `body`, handing back the raw request text.
    fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}/v1", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream);
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
            request
        });
        (base_url, handle)
    }

    fn read_request(stream: &mut TcpStream) -> String {
        let mut data = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            data.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&data).into_owned();
            if let Some(head_end) = text.find("\r\n\r\n") {
                let content_length = text[..head_end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if data.len() >= head_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&data).into_owned()
    }

    fn client(base_url: &str) -> OpenAiClient {
        OpenAiClient::new(base_url, "gpt-4", ApiKey::new("sk-x"), Some(Duration::from_secs(5)))
    }

    #[test]
    fn test_complete_sends_bearer_and_single_message() {
        let (base_url, server) = serve_once(
            "200 OK",
            r#"{"choices":[{"message":{"role":"assistant","content":"import bpy\n"}}]}"#,
        );

        let script = client(&base_url).complete("Write a script").unwrap();
        assert_eq!(script.as_str(), "import bpy\n");

        let request = server.join().unwrap();
        let (head, body) = request.split_once("\r\n\r\n").unwrap();
        assert!(head.starts_with("POST /v1/chat/completions "));
        assert!(head
            .lines()
            .any(|line| line.eq_ignore_ascii_case("authorization: Bearer sk-x")));
        let body: Value = serde_json::from_str(body).unwrap();
        assert_eq!(body["messages"], json!([{"role": "user", "content": "Write a script"}]));
    }

    #[test]
    fn test_complete_maps_error_status() {
        let (base_url, server) = serve_once("401 Unauthorized", "no auth");

        let err = client(&base_url).complete("Write a script").unwrap_err();
        match err {
            CompletionError::Status { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "no auth");
            }
            other => panic!("expected status error, got {other:?}"),
        }
        server.join().unwrap();
    }

    #[test]
    fn test_complete_maps_unreachable_server() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let err = client(&format!("http://127.0.0.1:{port}/v1"))
            .complete("Write a script")
            .unwrap_err();
        assert!(matches!(err, CompletionError::Transport(_)), "got {err:?}");
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let client = OpenAiClient::new("https://api.example.com/v1/", "gpt-4", ApiKey::new("k"), None);
        assert_eq!(client.endpoint(), "https://api.example.com/v1/chat/completions");
    }
}
