use async_trait::async_trait;

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use super::EmbeddingProvider;

// ── OpenAI-compatible embedding provider ─────────────────────

pub struct OpenAiEmbedding {
    client: reqwest::Client,
    cached_embeddings_url: String,
    cached_auth_header: String,
    model: String,
    dims: usize,
}

#[derive(Copy, Clone, Debug)]
pub(super) struct CustomBaseUrlPolicy {
    pub(super) allow_http: bool,
}

fn is_ssrf_blocked_ipv4(ip: Ipv4Addr) -> bool {
    ip.is_loopback() || ip.is_private() || ip.is_link_local() || ip.is_unspecified()
}

fn is_ssrf_blocked_ipv6(ip: Ipv6Addr) -> bool {
    if ip.is_loopback() || ip.is_unspecified() {
        return true;
    }

    let seg0 = ip.segments()[0];
    let is_link_local = (seg0 & 0xffc0) == 0xfe80;
    let is_unique_local = (seg0 & 0xfe00) == 0xfc00;

    is_link_local || is_unique_local
}

fn is_ssrf_blocked_host(host: &str) -> bool {
    let host = host.trim_end_matches('.');
    let host = host.trim_start_matches('[').trim_end_matches(']');

    if host.eq_ignore_ascii_case("metadata.google.internal")
        || host.eq_ignore_ascii_case("localhost")
    {
        return true;
    }

    match host.to_ascii_lowercase().parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => is_ssrf_blocked_ipv4(v4),
        Ok(IpAddr::V6(v6)) => is_ssrf_blocked_ipv6(v6),
        Err(_) => false,
    }
}

pub(super) fn validate_custom_base_url(
    raw: &str,
    policy: CustomBaseUrlPolicy,
) -> anyhow::Result<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        anyhow::bail!("custom embedding base URL is empty");
    }

    let url = reqwest::Url::parse(raw)
        .map_err(|_| anyhow::anyhow!("invalid custom embedding base URL"))?;

    match url.scheme() {
        "https" => {}
        "http" if policy.allow_http => {}
        "http" => anyhow::bail!("custom embedding base URL must use https"),
        _ => anyhow::bail!("custom embedding base URL must use http(s)"),
    }

    if !url.username().is_empty() || url.password().is_some() {
        anyhow::bail!("custom embedding base URL must not include userinfo");
    }

    if url.query().is_some() || url.fragment().is_some() {
        anyhow::bail!("custom embedding base URL must not include query or fragment");
    }

    let host = url
        .host_str()
        .ok_or_else(|| anyhow::anyhow!("custom embedding base URL missing host"))?;

    if is_ssrf_blocked_host(host) {
        anyhow::bail!("custom embedding base URL host is blocked");
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

impl OpenAiEmbedding {
    pub fn new(base_url: &str, api_key: &str, model: &str, dims: usize) -> Self {
        let base = base_url.trim_end_matches('/');
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(3))
            .timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            cached_embeddings_url: format!("{base}/v1/embeddings"),
            cached_auth_header: format!("Bearer {api_key}"),
            model: model.to_string(),
            dims,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedding {
    fn name(&self) -> &str {
        "openai"
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    async fn embed(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let resp = self
            .client
            .post(&self.cached_embeddings_url)
            .header("Authorization", &self.cached_auth_header)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Embedding HTTP request failed: {e}"))?;

        if !resp.status().is_success() {
            let status = resp.status();
            anyhow::bail!("Embedding API error {status}");
        }

        let json: serde_json::Value = resp.json().await?;
        let data = json
            .get("data")
            .and_then(|d| d.as_array())
            .ok_or_else(|| anyhow::anyhow!("Invalid embedding response: missing 'data'"))?;

        let mut indexed = Vec::with_capacity(data.len());
        for (position, item) in data.iter().enumerate() {
            let embedding = item
                .get("embedding")
                .and_then(|e| e.as_array())
                .ok_or_else(|| anyhow::anyhow!("Invalid embedding item"))?;

            #[allow(clippy::cast_possible_truncation)]
            let vec = embedding
                .iter()
                .map(|v| {
                    v.as_f64()
                        .map(|f| f as f32)
                        .ok_or_else(|| anyhow::anyhow!("Non-numeric embedding component"))
                })
                .collect::<anyhow::Result<Vec<f32>>>()?;

            let index = item
                .get("index")
                .and_then(serde_json::Value::as_u64)
                .and_then(|i| usize::try_from(i).ok())
                .unwrap_or(position);
            indexed.push((index, vec));
        }

        // The API documents `index`; order by it rather than trusting array order.
        indexed.sort_by_key(|(index, _)| *index);
        Ok(indexed.into_iter().map(|(_, v)| v).collect())
    }
}
