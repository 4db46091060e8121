use crate::config::PublicIpConfig;
use reqwest::Client;
use std::net::IpAddr;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

pub const UNAVAILABLE: &str = "Unavailable";

#[derive(Debug, Error)]
pub enum PublicIpError {
    #[error("ошибка HTTP-запроса: {0}")]
    Request(#[from] reqwest::Error),
    #[error("ответ не является IP-адресом: {0:?}")]
    Malformed(String),
}

/// Public address as seen by `cfg.url`, or [`UNAVAILABLE`] when the lookup fails.
pub async fn lookup_public_ip(client: &Client, cfg: &PublicIpConfig) -> String {
    match fetch_public_ip(client, cfg).await {
        Ok(ip) => ip.to_string(),
        Err(err) => {
            warn!(url = %cfg.url, error = %err, "не удалось получить публичный IP");
            UNAVAILABLE.to_string()
        }
    }
}

async fn fetch_public_ip(
    client: &Client,
    cfg: &PublicIpConfig,
) -> Result<IpAddr, PublicIpError> {
    let body = client
        .get(&cfg.url)
        .timeout(Duration::from_millis(cfg.timeout_ms))
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let trimmed = body.trim();
    trimmed
        .parse::<IpAddr>()
        .map_err(|_| PublicIpError::Malformed(trimmed.chars().take(64).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            if let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = [0_u8; 1024];
                let _ = stream.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });
        format!("http://{addr}/")
    }

    fn cfg_for(url: String) -> PublicIpConfig {
        PublicIpConfig {
            enabled: true,
            url,
            timeout_ms: 2000,
            refresh_secs: 60,
        }
    }

    #[tokio::test]
    async fn returns_address_from_plain_text_body() {
        let url = serve_once("200 OK", "203.0.113.7\n").await;
        let ip = lookup_public_ip(&Client::new(), &cfg_for(url)).await;
        assert_eq!(ip, "203.0.113.7");
    }

    #[tokio::test]
    async fn non_ip_body_is_unavailable() {
        let url = serve_once("200 OK", "<html>captive portal</html>").await;
        let ip = lookup_public_ip(&Client::new(), &cfg_for(url)).await;
        assert_eq!(ip, UNAVAILABLE);
    }

    #[tokio::test]
    async fn http_error_is_unavailable() {
        let url = serve_once("503 Service Unavailable", "").await;
        let ip = lookup_public_ip(&Client::new(), &cfg_for(url)).await;
        assert_eq!(ip, UNAVAILABLE);
    }

    #[tokio::test]
    async fn refused_connection_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);
        let ip = lookup_public_ip(&Client::new(), &cfg_for(format!("http://{addr}/"))).await;
        assert_eq!(ip, UNAVAILABLE);
    }
}
