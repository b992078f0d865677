use crate::traits::StatSink;
use async_trait::async_trait;
use domain::StatEvent;
use tracing::warn;

// 聚合计数器是外部服务：上报失败只告警，绝不反灌给调用方
pub struct HttpStatSink {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpStatSink {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl StatSink for HttpStatSink {
    async fn emit(&self, event: StatEvent) {
        let res = self.client.post(&self.endpoint).json(&event).send().await;
        match res {
            Ok(resp) if !resp.status().is_success() => {
                warn!("Stat counter rejected event ({}): {:?}", resp.status(), event);
            }
            Err(e) => {
                warn!("Stat counter unreachable: {}", e);
            }
            _ => {}
        }
    }
}

// 未配置计数器端点时的空实现
pub struct NoopStatSink;

#[async_trait]
impl StatSink for NoopStatSink {
    async fn emit(&self, _event: StatEvent) {}
}
