use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use once_cell::sync::{Lazy, OnceCell};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;

use crate::logging::Logger;

/// A singleton instance of the reqwest client.
static CLIENT: OnceCell<Client> = OnceCell::new();

static LOGGER: Lazy<Logger> = Lazy::new(|| Logger::new("http"));

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Returns the reqwest client singleton instance or creates one if it doesn't exist.
fn get_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        // reqwest 使用 rustls-no-provider，需先指定加密實作；已經安裝過時會回傳 Err，忽略即可
        let _ = rustls::crypto::ring::default_provider().install_default();

        Client::builder()
            // ===== 壓縮 =====
            .brotli(true)
            .gzip(true)
            .zstd(true)
            // ===== 超時設置 =====
            .connect_timeout(Duration::from_secs(8))
            .timeout(Duration::from_secs(15))
            .tcp_nodelay(true)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| anyhow!("Failed to create reqwest client: {:?}", e))
    })
}

/// Performs an HTTP GET request and deserializes the JSON response into the specified type.
///
/// A response with a non-success HTTP status is returned as an error without reading the body.
pub async fn get_json<RES: DeserializeOwned>(url: &str) -> Result<RES> {
    get_response(url)
        .await?
        .error_for_status()
        .map_err(|e| {
            anyhow!(
                "Unexpected HTTP status from {}: {}",
                redact_api_key(url),
                e.without_url()
            )
        })?
        .json::<RES>()
        .await
        .map_err(|e| anyhow!("Error parsing response JSON: {}", e.without_url()))
}

pub async fn get_response(url: &str) -> Result<Response> {
    send(Method::GET, url).await
}

/// Sends a single HTTP request. Failures are logged and returned, never retried.
async fn send(method: Method, url: &str) -> Result<Response> {
    let visit_log = format!("{}:{}", method, redact_api_key(url));
    let client = get_client()?;
    let start = Instant::now();
    let res = client.request(method, url).send().await;
    let elapsed = start.elapsed().as_millis();

    match res {
        Ok(response) => {
            LOGGER.info(format!(
                "{} {} {} ms",
                visit_log,
                response.status(),
                elapsed
            ));
            Ok(response)
        }
        Err(why) => {
            let why = why.without_url();
            LOGGER.error(format!("{} failed because {:?}. {} ms", visit_log, why, elapsed));
            Err(anyhow!(
                "Failed to send request to {}: {}",
                redact_api_key(url),
                why
            ))
        }
    }
}

/// 把網址中的 apikey 參數值遮蔽後再寫入日誌
pub fn redact_api_key(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };

    let params: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if key.eq_ignore_ascii_case("apikey") => format!("{}=***", key),
            _ => pair.to_string(),
        })
        .collect();

    format!("{}?{}", base, params.join("&"))
}

/// 在本機隨機埠啟動只會回傳固定狀態列的 HTTP 服務，回傳其位址
#[cfg(test)]
pub(crate) async fn spawn_status_server(status: &'static str) -> std::net::SocketAddr {
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut request: Vec<u8> = Vec::new();
                let mut buf = [0u8; 1024];
                // 讀到標頭結束為止，GET 沒有 body
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{{}}",
                    status
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    addr
}
