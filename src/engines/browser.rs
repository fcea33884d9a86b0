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

use crate::engines::identity::IdentityRotator;
use crate::engines::traits::ResolveError;
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::time::Duration;

/// 浏览器会话特质
///
/// 验证处理所需的最小浏览器能力集：导航、读DOM、读URL、
/// 派发点击、执行脚本、关闭。真实实现基于chromiumoxide，
/// 测试注入脚本化的假会话。
#[async_trait]
pub trait BrowserSession: Send {
    /// 导航到指定URL并等待文档加载
    async fn navigate(&mut self, url: &str) -> Result<(), ResolveError>;

    /// 读取当前渲染后的HTML
    async fn content(&mut self) -> Result<String, ResolveError>;

    /// 读取当前URL
    async fn current_url(&mut self) -> Result<String, ResolveError>;

    /// 点击匹配选择器的元素
    async fn click(&mut self, selector: &str) -> Result<(), ResolveError>;

    /// 执行一段脚本
    async fn evaluate(&mut self, script: &str) -> Result<(), ResolveError>;

    /// 关闭浏览器并释放资源
    async fn close(&mut self) -> Result<(), ResolveError>;
}

/// 浏览器启动特质
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    type Session: BrowserSession;

    /// 启动一个新的浏览器会话并导航到初始URL
    async fn launch(&self, initial_url: &str) -> Result<Self::Session, ResolveError>;
}

/// 基于chromiumoxide的浏览器启动器
///
/// 每次验证处理独占启动一个有头浏览器，绝不跨目标复用，
/// 窗口最大化以便人工完成滑块或登录。
pub struct ChromiumLauncher;

/// chromiumoxide浏览器会话
///
/// 持有浏览器进程、页面与事件处理任务，`close` 负责全部释放
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler_task: tokio::task::JoinHandle<()>,
    closed: bool,
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    type Session = ChromiumSession;

    async fn launch(&self, initial_url: &str) -> Result<Self::Session, ResolveError> {
        let config = BrowserConfig::builder()
            .with_head()
            .no_sandbox()
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--start-maximized")
            .arg(format!(
                "--user-agent={}",
                IdentityRotator::random_user_agent()
            ))
            .request_timeout(Duration::from_secs(30))
            .build()
            .map_err(ResolveError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ResolveError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page(initial_url)
            .await
            .map_err(|e| ResolveError::Browser(e.to_string()))?;

        // 隐藏webdriver特征
        let stealth = AddScriptToEvaluateOnNewDocumentParams::builder()
            .source("Object.defineProperty(navigator, 'webdriver', { get: () => undefined })")
            .build()
            .map_err(ResolveError::Browser)?;
        page.execute(stealth)
            .await
            .map_err(|e| ResolveError::Browser(e.to_string()))?;

        page.wait_for_navigation()
            .await
            .map_err(|e| ResolveError::Browser(e.to_string()))?;

        Ok(ChromiumSession {
            browser,
            page,
            handler_task,
            closed: false,
        })
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<(), ResolveError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| ResolveError::Browser(e.to_string()))?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| ResolveError::Browser(e.to_string()))?;
        Ok(())
    }

    async fn content(&mut self) -> Result<String, ResolveError> {
        self.page
            .content()
            .await
            .map_err(|e| ResolveError::Browser(e.to_string()))
    }

    async fn current_url(&mut self) -> Result<String, ResolveError> {
        let url = self
            .page
            .url()
            .await
            .map_err(|e| ResolveError::Browser(e.to_string()))?;
        Ok(url.unwrap_or_default())
    }

    async fn click(&mut self, selector: &str) -> Result<(), ResolveError> {
        self.page
            .find_element(selector)
            .await
            .map_err(|e| ResolveError::Browser(format!("element not found: {}", e)))?
            .click()
            .await
            .map_err(|e| ResolveError::Browser(format!("click failed: {}", e)))?;
        Ok(())
    }

    async fn evaluate(&mut self, script: &str) -> Result<(), ResolveError> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| ResolveError::Browser(e.to_string()))?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ResolveError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let result = self
            .browser
            .close()
            .await
            .map_err(|e| ResolveError::Browser(e.to_string()));
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        result.map(|_| ())
    }
}
