//! Headless-render edge for script-driven sources. The render backend is a
//! black box ("render URL, get HTML"); this module owns the client contract
//! and the lazily-started, explicitly-disposed shared handle.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::warn;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("render service returned status {status} for {url}")]
    HttpStatus { status: u16, url: String },
    #[error("{0}")]
    Unavailable(String),
}

#[async_trait]
pub trait Renderer: Send + Sync {
    /// Renders `url` and returns the settled HTML. A missing `wait_selector`
    /// is never fatal; implementations degrade to whatever loaded.
    async fn render(&self, url: &str, wait_selector: Option<&str>) -> Result<String, RenderError>;

    /// Releases browser resources. Called once per refresh run.
    async fn shutdown(&self) -> Result<(), RenderError> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Content endpoint of the headless-browser service.
    pub endpoint: String,
    pub navigation_timeout: Duration,
    /// Fixed delay after navigation for client-side scripts to run.
    pub settle_delay: Duration,
    pub selector_timeout: Duration,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3000/content".to_string(),
            navigation_timeout: Duration::from_secs(30),
            settle_delay: Duration::from_secs(2),
            selector_timeout: Duration::from_secs(10),
        }
    }
}

/// Client for a browserless-style render service.
#[derive(Debug)]
pub struct HttpRenderer {
    client: reqwest::Client,
    config: RendererConfig,
}

impl HttpRenderer {
    pub fn new(config: RendererConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            // Navigation timeout plus settle and selector waits, with headroom.
            .timeout(config.navigation_timeout + config.settle_delay + config.selector_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    async fn render_once(
        &self,
        url: &str,
        wait_until: &str,
        wait_selector: Option<&str>,
    ) -> Result<String, RenderError> {
        let mut body = json!({
            "url": url,
            "gotoOptions": {
                "waitUntil": wait_until,
                "timeout": self.config.navigation_timeout.as_millis() as u64,
            },
            "waitForTimeout": self.config.settle_delay.as_millis() as u64,
        });
        if let Some(selector) = wait_selector {
            body["waitForSelector"] = json!({
                "selector": selector,
                "timeout": self.config.selector_timeout.as_millis() as u64,
            });
        }

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn render(&self, url: &str, wait_selector: Option<&str>) -> Result<String, RenderError> {
        // Lenient completion: DOM-ready with the selector wait, then a full
        // "load" pass without it when the first attempt fails or times out.
        match self.render_once(url, "domcontentloaded", wait_selector).await {
            Ok(html) => Ok(html),
            Err(err) => {
                warn!(url, error = %err, "DOM-ready render failed, retrying with load event");
                self.render_once(url, "load", None).await
            }
        }
    }
}

/// Process-wide render handle: the browser behind it is expensive, so it is
/// created on first need and torn down once after a refresh run, regardless
/// of per-source failures.
pub struct RenderService {
    factory: Box<dyn Fn() -> anyhow::Result<Arc<dyn Renderer>> + Send + Sync>,
    active: Mutex<Option<Arc<dyn Renderer>>>,
}

impl RenderService {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> anyhow::Result<Arc<dyn Renderer>> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            active: Mutex::new(None),
        }
    }

    pub fn from_config(config: RendererConfig) -> Self {
        Self::new(move || Ok(Arc::new(HttpRenderer::new(config.clone())?) as Arc<dyn Renderer>))
    }

    pub async fn acquire(&self) -> Result<Arc<dyn Renderer>, RenderError> {
        let mut active = self.active.lock().await;
        if let Some(renderer) = active.as_ref() {
            return Ok(Arc::clone(renderer));
        }
        let renderer =
            (self.factory)().map_err(|err| RenderError::Unavailable(err.to_string()))?;
        *active = Some(Arc::clone(&renderer));
        Ok(renderer)
    }

    /// Disposes the live renderer if one was started. Safe to call when no
    /// rendering happened this run; a later `acquire` starts a fresh one.
    pub async fn shutdown(&self) {
        let renderer = self.active.lock().await.take();
        if let Some(renderer) = renderer {
            if let Err(err) = renderer.shutdown().await {
                warn!(error = %err, "render service shutdown failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingRenderer {
        shutdowns: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Renderer for CountingRenderer {
        async fn render(
            &self,
            _url: &str,
            _wait_selector: Option<&str>,
        ) -> Result<String, RenderError> {
            Ok("<html></html>".to_string())
        }

        async fn shutdown(&self) -> Result<(), RenderError> {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn render_service_is_lazy_and_shared() {
        let created = Arc::new(AtomicUsize::new(0));
        let shutdowns = Arc::new(AtomicUsize::new(0));
        let created_in_factory = Arc::clone(&created);
        let shutdowns_in_factory = Arc::clone(&shutdowns);

        let service = RenderService::new(move || {
            created_in_factory.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(CountingRenderer {
                shutdowns: Arc::clone(&shutdowns_in_factory),
            }) as Arc<dyn Renderer>)
        });

        assert_eq!(created.load(Ordering::SeqCst), 0);
        let first = service.acquire().await.unwrap();
        let second = service.acquire().await.unwrap();
        first.render("http://x", None).await.unwrap();
        second.render("http://y", None).await.unwrap();
        assert_eq!(created.load(Ordering::SeqCst), 1);

        service.shutdown().await;
        assert_eq!(shutdowns.load(Ordering::SeqCst), 1);

        // Shutdown without a live renderer is a no-op.
        service.shutdown().await;
        assert_eq!(shutdowns.load(Ordering::SeqCst), 1);

        // A later acquire starts a fresh instance.
        let _ = service.acquire().await.unwrap();
        assert_eq!(created.load(Ordering::SeqCst), 2);
    }
}
