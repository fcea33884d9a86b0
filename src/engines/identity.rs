// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 桌面端User-Agent池
const DESKTOP_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) Gecko/20100101 Firefox/120.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Edge/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// 一套请求头身份
///
/// User-Agent随机选取，其余为固定的中文区浏览器头
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_agent: String,
    pub headers: Vec<(&'static str, String)>,
}

/// 身份轮换器
///
/// 为每次请求提供随机化的User-Agent与请求头组合，降低指纹特征
#[derive(Debug, Clone, Default)]
pub struct IdentityRotator {
    referer: Option<String>,
}

impl IdentityRotator {
    pub fn new(referer: impl Into<String>) -> Self {
        Self {
            referer: Some(referer.into()),
        }
    }

    /// 随机选取一套身份
    pub fn pick(&self) -> Identity {
        let user_agent =
            DESKTOP_USER_AGENTS[rand::random_range(0..DESKTOP_USER_AGENTS.len())].to_string();
        let mut headers: Vec<(&'static str, String)> = vec![
            (
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"
                    .to_string(),
            ),
            ("Accept-Language", "zh-CN,zh;q=0.9,en;q=0.8".to_string()),
            ("Connection", "keep-alive".to_string()),
            ("Upgrade-Insecure-Requests", "1".to_string()),
        ];
        if let Some(referer) = &self.referer {
            headers.push(("Referer", referer.clone()));
        }
        Identity {
            user_agent,
            headers,
        }
    }

    /// 随机User-Agent字符串，供浏览器会话复用同一池
    pub fn random_user_agent() -> &'static str {
        DESKTOP_USER_AGENTS[rand::random_range(0..DESKTOP_USER_AGENTS.len())]
    }
}
