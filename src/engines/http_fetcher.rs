// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::classifier;
use crate::domain::models::FetchResult;
use crate::domain::session::CrawlSession;
use crate::engines::identity::{Identity, IdentityRotator};
use crate::engines::traits::{FetchError, PageFetcher};
use crate::utils::retry_policy::RetryPolicy;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::sync::Mutex;
use std::time::Duration;

/// HTTP页面抓取引擎
///
/// 在会话共享的cookie客户端上发起GET请求。每次尝试前
/// 插入抖动礼貌延迟，以低概率轮换身份头；传输失败或
/// 非200状态按重试策略退避重试，重试耗尽后返回跳过信号。
pub struct HttpFetcher {
    rotator: IdentityRotator,
    current: Mutex<Identity>,
    retry: RetryPolicy,
    request_delay: (Duration, Duration),
    rotate_probability: f64,
}

impl HttpFetcher {
    /// 创建新的抓取引擎
    ///
    /// # 参数
    ///
    /// * `rotator` - 身份轮换器
    /// * `retry` - 重试策略（最大尝试次数与退避区间）
    /// * `request_delay` - 请求前礼貌延迟区间
    /// * `rotate_probability` - 每次尝试轮换身份的概率
    pub fn new(
        rotator: IdentityRotator,
        retry: RetryPolicy,
        request_delay: (Duration, Duration),
        rotate_probability: f64,
    ) -> Self {
        let current = Mutex::new(rotator.pick());
        Self {
            rotator,
            current,
            retry,
            request_delay,
            rotate_probability,
        }
    }

    fn jitter_delay(&self) -> Duration {
        let (min, max) = self.request_delay;
        if max <= min {
            return min;
        }
        Duration::from_millis(rand::random_range(
            min.as_millis() as u64..max.as_millis() as u64,
        ))
    }

    fn current_identity(&self) -> Identity {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if rand::random_range(0.0..1.0) < self.rotate_probability {
            *current = self.rotator.pick();
            tracing::debug!(user_agent = %current.user_agent, "identity rotated");
        }
        current.clone()
    }

    async fn attempt(
        &self,
        session: &CrawlSession,
        url: &str,
        identity: &Identity,
    ) -> Result<String, FetchError> {
        let mut headers = HeaderMap::new();
        for (k, v) in &identity.headers {
            if let (Ok(k), Ok(v)) = (HeaderName::from_bytes(k.as_bytes()), HeaderValue::from_str(v))
            {
                headers.insert(k, v);
            }
        }

        let response = session
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &identity.user_agent)
            .headers(headers)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::BadStatus(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    /// 抓取一个列表页
    ///
    /// # 参数
    ///
    /// * `session` - 爬取会话，提供共享cookie客户端
    /// * `url` - 目标URL
    ///
    /// # 返回值
    ///
    /// 抓取结果，重试耗尽时为空HTML加 `UnknownBlock` 的跳过信号
    async fn fetch(&self, session: &CrawlSession, url: &str) -> FetchResult {
        let mut attempt = 0;
        let mut last_status = 0u16;

        loop {
            tokio::time::sleep(self.jitter_delay()).await;

            let identity = self.current_identity();
            attempt += 1;

            match self.attempt(session, url, &identity).await {
                Ok(html) => {
                    let classification = classifier::classify(&html);
                    tracing::debug!(url, ?classification, attempt, "page fetched");
                    return FetchResult {
                        url: url.to_string(),
                        status_code: 200,
                        html,
                        classification,
                    };
                }
                Err(err) => {
                    if let FetchError::BadStatus(code) = err {
                        last_status = code;
                    }
                    tracing::warn!(url, attempt, error = %err, "fetch attempt failed");
                    if !err.is_retryable() || !self.retry.should_retry(attempt) {
                        break;
                    }
                    tokio::time::sleep(self.retry.backoff()).await;
                }
            }
        }

        tracing::warn!(url, "retry budget exhausted, skipping page");
        FetchResult::skipped(url, last_status)
    }
}
