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

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// 应用程序配置设置
///
/// 包含站点、抓取节奏、验证处理与输出等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 站点配置
    pub site: SiteSettings,
    /// 抓取节奏配置
    pub crawl: CrawlSettings,
    /// 验证处理配置
    pub resolver: ResolverSettings,
    /// 输出配置
    pub output: OutputSettings,
}

/// 站点配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct SiteSettings {
    /// 站点基础URL
    pub base_url: String,
    /// 二手房列表路径段
    pub listing_path: String,
}

/// 抓取节奏配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlSettings {
    /// 单页抓取最大尝试次数
    pub max_retries: u32,
    /// 请求前延迟下限（毫秒）
    pub request_delay_min_ms: u64,
    /// 请求前延迟上限（毫秒）
    pub request_delay_max_ms: u64,
    /// 翻页间延迟下限（毫秒）
    pub page_delay_min_ms: u64,
    /// 翻页间延迟上限（毫秒）
    pub page_delay_max_ms: u64,
    /// 目标（区域）间延迟下限（毫秒）
    pub target_delay_min_ms: u64,
    /// 目标（区域）间延迟上限（毫秒）
    pub target_delay_max_ms: u64,
    /// 请求超时时间（秒）
    pub request_timeout_secs: u64,
    /// 每次请求轮换身份的概率 (0.0-1.0)
    pub identity_rotate_probability: f64,
    /// 默认最大页数
    pub default_max_pages: u32,
}

/// 验证处理配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ResolverSettings {
    /// 点击验证超时时间（秒）
    pub click_timeout_secs: u64,
    /// 登录验证超时时间（秒）
    pub login_timeout_secs: u64,
    /// 轮询间隔（秒）
    pub poll_interval_secs: u64,
}

/// 输出配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct OutputSettings {
    /// 数据输出目录
    pub dir: String,
    /// 商圈编码sidecar文件路径
    pub areas_file: Option<String>,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从环境变量加载配置，支持默认值
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Start with default settings
            .set_default("site.base_url", "https://bj.58.com/")?
            .set_default("site.listing_path", "ershoufang/")?
            // Default crawl pacing, tuned for the target site's implicit rate limits
            .set_default("crawl.max_retries", 3)?
            .set_default("crawl.request_delay_min_ms", 1000)?
            .set_default("crawl.request_delay_max_ms", 3000)?
            .set_default("crawl.page_delay_min_ms", 3000)?
            .set_default("crawl.page_delay_max_ms", 6000)?
            .set_default("crawl.target_delay_min_ms", 10_000)?
            .set_default("crawl.target_delay_max_ms", 20_000)?
            .set_default("crawl.request_timeout_secs", 10)?
            .set_default("crawl.identity_rotate_probability", 0.3)?
            .set_default("crawl.default_max_pages", 10)?
            // Default resolver settings
            .set_default("resolver.click_timeout_secs", 120)?
            .set_default("resolver.login_timeout_secs", 300)?
            .set_default("resolver.poll_interval_secs", 2)?
            // Default output settings
            .set_default("output.dir", "data")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("FANGRS").separator("__"));

        builder.build()?.try_deserialize()
    }

    /// 请求超时时间
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.crawl.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::new().expect("defaults should load");
        assert_eq!(settings.site.base_url, "https://bj.58.com/");
        assert_eq!(settings.site.listing_path, "ershoufang/");
        assert_eq!(settings.crawl.max_retries, 3);
        assert_eq!(settings.resolver.poll_interval_secs, 2);
        assert!(settings.resolver.login_timeout_secs > settings.resolver.click_timeout_secs);
    }

    #[test]
    fn test_request_timeout() {
        let settings = Settings::new().expect("defaults should load");
        assert_eq!(settings.request_timeout(), Duration::from_secs(10));
    }
}
