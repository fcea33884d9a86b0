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

//! 验证处理器集成测试
//!
//! 注入脚本化的浏览器会话，验证轮询判据、超时行为与
//! 浏览器在所有退出路径上恰好释放一次

use async_trait::async_trait;
use fangrs::domain::models::BlockVerdict;
use fangrs::engines::browser::{BrowserLauncher, BrowserSession};
use fangrs::engines::resolver::{CaptchaResolver, ResolverConfig};
use fangrs::engines::traits::{ChallengeResolver, HumanGate, ResolveError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const BLOCKED_URL: &str = "https://bj.58.com/antibot/verify";

const CLICK_PAGE: &str = r#"<div id="btnSubmit" class="btn_tj">点击按钮进行验证</div>"#;
const LOGIN_PAGE: &str = "<html><body><div>请登录后继续访问</div></body></html>";
const LISTING_PAGE: &str = r#"<html><body><div class="filter-region"></div>
    <div class="property"><h3 class="property-content-title-name">测试房源</h3></div>
    </body></html>"#;

/// 单步脚本：返回一段HTML或模拟浏览器故障
#[derive(Clone)]
enum Step {
    Html(String),
    Fail,
}

/// 脚本化浏览器会话
///
/// `content` 按脚本依序返回，脚本耗尽后重复最后一步
struct ScriptedSession {
    steps: Mutex<VecDeque<Step>>,
    url: String,
    click_ok: bool,
    closes: Arc<AtomicUsize>,
    navigations: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl BrowserSession for ScriptedSession {
    async fn navigate(&mut self, url: &str) -> Result<(), ResolveError> {
        self.navigations.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn content(&mut self) -> Result<String, ResolveError> {
        let mut steps = self.steps.lock().unwrap();
        let step = if steps.len() > 1 {
            steps.pop_front().unwrap()
        } else {
            steps.front().cloned().expect("script must not be empty")
        };
        match step {
            Step::Html(html) => Ok(html),
            Step::Fail => Err(ResolveError::Browser("scripted failure".to_string())),
        }
    }

    async fn current_url(&mut self) -> Result<String, ResolveError> {
        Ok(self.url.clone())
    }

    async fn click(&mut self, _selector: &str) -> Result<(), ResolveError> {
        if self.click_ok {
            Ok(())
        } else {
            Err(ResolveError::Browser("element not found".to_string()))
        }
    }

    async fn evaluate(&mut self, _script: &str) -> Result<(), ResolveError> {
        if self.click_ok {
            Ok(())
        } else {
            Err(ResolveError::Browser("script failed".to_string()))
        }
    }

    async fn close(&mut self) -> Result<(), ResolveError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// 脚本化浏览器启动器，每次测试只发放一个会话
struct ScriptedLauncher {
    session: Mutex<Option<ScriptedSession>>,
    fail_launch: bool,
}

impl ScriptedLauncher {
    fn with_session(session: ScriptedSession) -> Self {
        Self {
            session: Mutex::new(Some(session)),
            fail_launch: false,
        }
    }

    fn failing() -> Self {
        Self {
            session: Mutex::new(None),
            fail_launch: true,
        }
    }
}

#[async_trait]
impl BrowserLauncher for ScriptedLauncher {
    type Session = ScriptedSession;

    async fn launch(&self, _initial_url: &str) -> Result<Self::Session, ResolveError> {
        if self.fail_launch {
            return Err(ResolveError::Launch("no browser available".to_string()));
        }
        self.session
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| ResolveError::Launch("session already taken".to_string()))
    }
}

/// 立即放行的人工确认通道
struct InstantGate;

#[async_trait]
impl HumanGate for InstantGate {
    async fn await_acknowledgement(&self, _prompt: &str) -> Result<(), ResolveError> {
        Ok(())
    }

    fn notify(&self, _message: &str) {}
}

fn scripted_session(
    steps: Vec<Step>,
    click_ok: bool,
) -> (ScriptedSession, Arc<AtomicUsize>, Arc<Mutex<Vec<String>>>) {
    let closes = Arc::new(AtomicUsize::new(0));
    let navigations = Arc::new(Mutex::new(Vec::new()));
    let session = ScriptedSession {
        steps: Mutex::new(steps.into()),
        url: BLOCKED_URL.to_string(),
        click_ok,
        closes: closes.clone(),
        navigations: navigations.clone(),
    };
    (session, closes, navigations)
}

fn fast_config() -> ResolverConfig {
    ResolverConfig {
        click_timeout: Duration::from_secs(30),
        login_timeout: Duration::from_secs(30),
        poll_interval: Duration::from_secs(2),
        ..ResolverConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn click_challenge_resolves_after_polling() {
    let (session, closes, navigations) = scripted_session(
        vec![
            Step::Html(CLICK_PAGE.to_string()),
            Step::Html(CLICK_PAGE.to_string()),
            Step::Html(LISTING_PAGE.to_string()),
        ],
        true,
    );
    let resolver = CaptchaResolver::new(
        ScriptedLauncher::with_session(session),
        InstantGate,
        fast_config(),
    );

    let outcome = resolver
        .resolve("https://bj.58.com/ershoufang/pn2/", BlockVerdict::ClickChallenge)
        .await;

    assert!(outcome.resolved);
    assert!(outcome.html.as_deref().unwrap().contains("property"));
    // 成功后重新导航取干净页面
    assert_eq!(
        *navigations.lock().unwrap(),
        vec!["https://bj.58.com/ershoufang/pn2/".to_string()]
    );
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn already_clear_page_returns_without_interaction() {
    let (session, closes, navigations) =
        scripted_session(vec![Step::Html(LISTING_PAGE.to_string())], false);
    let resolver = CaptchaResolver::new(
        ScriptedLauncher::with_session(session),
        InstantGate,
        fast_config(),
    );

    let outcome = resolver
        .resolve("https://bj.58.com/ershoufang/", BlockVerdict::ClickChallenge)
        .await;

    // 浏览器渲染后拦截已消失，无需点击与重新导航
    assert!(outcome.resolved);
    assert!(navigations.lock().unwrap().is_empty());
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn login_wall_times_out_when_never_cleared() {
    let (session, closes, _) = scripted_session(vec![Step::Html(LOGIN_PAGE.to_string())], false);
    let resolver = CaptchaResolver::new(
        ScriptedLauncher::with_session(session),
        InstantGate,
        fast_config(),
    );

    let outcome = resolver
        .resolve("https://bj.58.com/ershoufang/", BlockVerdict::LoginWall)
        .await;

    assert!(!outcome.resolved);
    assert!(outcome.html.is_none());
    // 超时路径同样恰好释放一次
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn browser_error_still_releases_session() {
    let (session, closes, _) = scripted_session(
        vec![Step::Html(CLICK_PAGE.to_string()), Step::Fail],
        true,
    );
    let resolver = CaptchaResolver::new(
        ScriptedLauncher::with_session(session),
        InstantGate,
        fast_config(),
    );

    let outcome = resolver
        .resolve("https://bj.58.com/ershoufang/", BlockVerdict::ClickChallenge)
        .await;

    assert!(!outcome.resolved);
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn launch_failure_reports_unresolved() {
    let resolver = CaptchaResolver::new(ScriptedLauncher::failing(), InstantGate, fast_config());

    let outcome = resolver
        .resolve("https://bj.58.com/ershoufang/", BlockVerdict::UnknownBlock)
        .await;

    assert!(!outcome.resolved);
    assert!(outcome.html.is_none());
}

#[tokio::test(start_paused = true)]
async fn unknown_block_waits_for_human_gate() {
    // 未知拦截走人工登录分支，确认放行后轮询直至页面恢复
    let (session, closes, _) = scripted_session(
        vec![
            Step::Html("<div>totally different template</div>".to_string()),
            Step::Html(LISTING_PAGE.to_string()),
        ],
        false,
    );
    let gate_hits = Arc::new(AtomicUsize::new(0));
    struct CountingGate {
        hits: Arc<AtomicUsize>,
    }
    #[async_trait]
    impl HumanGate for CountingGate {
        async fn await_acknowledgement(&self, _prompt: &str) -> Result<(), ResolveError> {
            self.hits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn notify(&self, _message: &str) {}
    }
    let resolver = CaptchaResolver::new(
        ScriptedLauncher::with_session(session),
        CountingGate {
            hits: gate_hits.clone(),
        },
        fast_config(),
    );

    let outcome = resolver
        .resolve("https://bj.58.com/ershoufang/", BlockVerdict::UnknownBlock)
        .await;

    assert!(outcome.resolved);
    assert_eq!(gate_hits.load(Ordering::SeqCst), 1);
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}
