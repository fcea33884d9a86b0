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
use crate::domain::models::BlockVerdict;
use crate::engines::browser::{BrowserLauncher, BrowserSession};
use crate::engines::traits::{ChallengeResolver, HumanGate, ResolutionOutcome, ResolveError};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

/// 点击验证的三种交互策略，依序尝试，首个成功者生效
const CLICK_BUTTON_ID: &str = "#btnSubmit";
const CLICK_BUTTON_CLASS: &str = ".btn_tj";
const CLICK_SCRIPT: &str =
    "var btn = document.getElementById('btnSubmit'); if (btn) { btn.click(); }";

/// 验证处理器配置
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// 点击验证总超时
    pub click_timeout: Duration,
    /// 登录验证总超时
    pub login_timeout: Duration,
    /// 轮询间隔
    pub poll_interval: Duration,
    /// 正常列表页URL应包含的路径段
    pub listing_path_marker: String,
    /// 反爬跳转页URL特征
    pub antibot_url_marker: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            click_timeout: Duration::from_secs(120),
            login_timeout: Duration::from_secs(300),
            poll_interval: Duration::from_secs(2),
            listing_path_marker: "ershoufang".to_string(),
            antibot_url_marker: "antibot".to_string(),
        }
    }
}

/// 验证码处理器
///
/// 仅在页面判定为非正常时进入。独占一个浏览器会话完成一次处理：
/// 启动 -> 浏览器内重新判定 -> 自动点击或等待人工登录 -> 轮询 ->
/// 成功后重新导航取干净页面。浏览器在所有退出路径上都被释放。
pub struct CaptchaResolver<L, G> {
    launcher: L,
    gate: G,
    config: ResolverConfig,
}

impl<L, G> CaptchaResolver<L, G>
where
    L: BrowserLauncher,
    G: HumanGate,
{
    pub fn new(launcher: L, gate: G, config: ResolverConfig) -> Self {
        Self {
            launcher,
            gate,
            config,
        }
    }

    // 一次完整的处理流程，浏览器释放由调用方保证
    async fn drive(
        &self,
        session: &mut L::Session,
        url: &str,
    ) -> Result<Option<String>, ResolveError> {
        let html = session.content().await?;
        // 浏览器渲染后的页面可能已不再被拦截
        let verdict = classifier::classify(&html);
        if !verdict.is_blocked() {
            return Ok(Some(html));
        }

        let timeout = match verdict {
            BlockVerdict::ClickChallenge => {
                self.auto_click(session).await;
                self.gate
                    .notify("请在浏览器中完成滑块/图形验证，完成后自动继续");
                self.config.click_timeout
            }
            _ => {
                // 登录墙与未知拦截都交由人工处理
                self.gate
                    .await_acknowledgement("请在浏览器中完成登录，完成后回车继续")
                    .await?;
                self.config.login_timeout
            }
        };

        if !self.poll_until_clear(session, timeout).await? {
            return Ok(None);
        }

        // 重新导航取一份干净页面
        session.navigate(url).await?;
        let clean = session.content().await?;
        if classifier::classify(&clean) == BlockVerdict::Normal {
            return Ok(Some(clean));
        }

        // 重载后仍被拦截，做一次有界复查
        tracing::warn!(url, "page still blocked after reload, re-checking once");
        if self
            .poll_until_clear(session, Duration::from_secs(60))
            .await?
        {
            let html = session.content().await?;
            if classifier::classify(&html) == BlockVerdict::Normal {
                return Ok(Some(html));
            }
        }
        Ok(None)
    }

    // 依序尝试三种点击策略；全部失败仅提示人工，不视为错误
    async fn auto_click(&self, session: &mut L::Session) {
        // 等页面完全加载再点
        tokio::time::sleep(Duration::from_secs(2)).await;

        let strategies: [(&str, &str); 2] = [
            ("element id", CLICK_BUTTON_ID),
            ("class selector", CLICK_BUTTON_CLASS),
        ];
        for (how, selector) in strategies {
            if session.click(selector).await.is_ok() {
                tracing::info!(strategy = how, "challenge button clicked");
                tokio::time::sleep(Duration::from_secs(1)).await;
                return;
            }
        }
        if session.evaluate(CLICK_SCRIPT).await.is_ok() {
            tracing::info!(strategy = "script dispatch", "challenge button clicked");
            tokio::time::sleep(Duration::from_secs(1)).await;
            return;
        }
        self.gate.notify("未找到验证按钮，请手动点击");
    }

    // 固定间隔轮询，三个独立成功判据任一命中即视为解除
    async fn poll_until_clear(
        &self,
        session: &mut L::Session,
        timeout: Duration,
    ) -> Result<bool, ResolveError> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(self.config.poll_interval).await;

            let html = session.content().await?;
            if classifier::classify(&html) == BlockVerdict::Normal {
                return Ok(true);
            }

            let current = session.current_url().await?;
            if current.contains(&self.config.listing_path_marker)
                && !current.contains(&self.config.antibot_url_marker)
            {
                return Ok(true);
            }

            if classifier::has_listing_markers(&html) {
                return Ok(true);
            }
        }
    }
}

#[async_trait]
impl<L, G> ChallengeResolver for CaptchaResolver<L, G>
where
    L: BrowserLauncher,
    G: HumanGate,
{
    /// 针对被拦截的URL发起一次浏览器处理
    ///
    /// # 参数
    ///
    /// * `url` - 被拦截的列表页URL
    /// * `verdict` - 触发处理的拦截判定
    ///
    /// # 返回值
    ///
    /// 处理结果；浏览器会话在成功、超时与异常路径上都被关闭
    async fn resolve(&self, url: &str, verdict: BlockVerdict) -> ResolutionOutcome {
        let started = Instant::now();
        tracing::info!(url, ?verdict, "starting captcha resolution");

        let mut session = match self.launcher.launch(url).await {
            Ok(session) => session,
            Err(err) => {
                tracing::error!(url, error = %err, "browser launch failed");
                return ResolutionOutcome::timed_out(started.elapsed());
            }
        };

        let driven = self.drive(&mut session, url).await;

        // 所有退出路径统一释放浏览器
        if let Err(err) = session.close().await {
            tracing::warn!(error = %err, "browser close reported an error");
        }

        let elapsed = started.elapsed();
        match driven {
            Ok(Some(html)) => {
                tracing::info!(url, elapsed_secs = elapsed.as_secs(), "block resolved");
                ResolutionOutcome::resolved(html, elapsed)
            }
            Ok(None) => {
                tracing::warn!(url, elapsed_secs = elapsed.as_secs(), "resolution timed out");
                ResolutionOutcome::timed_out(elapsed)
            }
            Err(err) => {
                tracing::error!(url, error = %err, "resolution aborted");
                ResolutionOutcome::timed_out(elapsed)
            }
        }
    }
}

/// 控制台人工确认通道
///
/// 在终端打印醒目提示并阻塞等待操作员回车
pub struct ConsoleGate;

#[async_trait]
impl HumanGate for ConsoleGate {
    async fn await_acknowledgement(&self, prompt: &str) -> Result<(), ResolveError> {
        println!("\n{}", "=".repeat(60));
        println!("  [!!!] {}", prompt);
        println!("{}\n", "=".repeat(60));

        tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            std::io::stdin().read_line(&mut line).map(|_| ())
        })
        .await
        .map_err(|_| ResolveError::GateClosed)?
        .map_err(|_| ResolveError::GateClosed)
    }

    fn notify(&self, message: &str) {
        println!("\n{}", "=".repeat(60));
        println!("  [!!!] {}", message);
        println!("{}\n", "=".repeat(60));
    }
}
