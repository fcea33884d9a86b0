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

use crate::domain::models::{BlockVerdict, FetchResult};
use crate::domain::session::CrawlSession;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// 抓取传输错误类型
#[derive(Error, Debug)]
pub enum FetchError {
    /// 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 非200状态码
    #[error("Unexpected status code: {0}")]
    BadStatus(u16),
}

impl FetchError {
    /// 判断错误是否可重试
    ///
    /// 超时、连接失败与服务端错误可重试，客户端错误不可
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::RequestFailed(e) => {
                e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
            }
            FetchError::BadStatus(code) => *code >= 500,
        }
    }
}

/// 验证处理错误类型
#[derive(Error, Debug)]
pub enum ResolveError {
    /// 浏览器启动失败
    #[error("Browser launch failed: {0}")]
    Launch(String),
    /// 浏览器操作失败
    #[error("Browser operation failed: {0}")]
    Browser(String),
    /// 人工确认通道已关闭
    #[error("Human gate closed")]
    GateClosed,
}

/// 验证处理结果
///
/// `resolved` 为真时 `html` 携带干净的列表页内容
#[derive(Debug, Clone)]
pub struct ResolutionOutcome {
    /// 是否成功解除拦截
    pub resolved: bool,
    /// 成功时的干净HTML
    pub html: Option<String>,
    /// 本次处理耗时
    pub elapsed: Duration,
}

impl ResolutionOutcome {
    /// 构造超时/失败结果
    pub fn timed_out(elapsed: Duration) -> Self {
        Self {
            resolved: false,
            html: None,
            elapsed,
        }
    }

    /// 构造成功结果
    pub fn resolved(html: String, elapsed: Duration) -> Self {
        Self {
            resolved: true,
            html: Some(html),
            elapsed,
        }
    }
}

/// 页面抓取特质
///
/// 抓取失败在类型层面不可见：重试耗尽后返回分类为
/// `UnknownBlock` 的跳过信号，由编排器按失败页计数
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// 抓取一个列表页，cookie随会话共享
    async fn fetch(&self, session: &CrawlSession, url: &str) -> FetchResult;
}

/// 拦截处理特质
///
/// 仅在判定为非正常页时进入
#[async_trait]
pub trait ChallengeResolver: Send + Sync {
    /// 针对被拦截的URL发起一次浏览器处理
    async fn resolve(&self, url: &str, verdict: BlockVerdict) -> ResolutionOutcome;
}

/// 人工确认通道特质
///
/// 登录墙等需要人工介入的场景通过该通道阻塞等待确认，
/// 测试中可注入立即返回的假通道
#[async_trait]
pub trait HumanGate: Send + Sync {
    /// 阻塞等待人工确认
    async fn await_acknowledgement(&self, prompt: &str) -> Result<(), ResolveError>;

    /// 显示无需等待的提示信息
    fn notify(&self, message: &str);
}
