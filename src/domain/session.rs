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

use crate::domain::models::ListingRecord;
use std::time::Duration;

/// 一次编排运行的爬取会话
///
/// 显式的上下文对象而非模块级全局状态：持有跨请求共享的
/// cookie HTTP客户端、累积的房源记录与失败目标清单。
/// 多个会话可以并存，便于隔离测试。
pub struct CrawlSession {
    /// 共享HTTP客户端，cookie jar随服务端Set-Cookie自动更新
    pub client: reqwest::Client,
    /// 累积的房源记录，只追加，最终序列化前不做原地修改
    pub records: Vec<ListingRecord>,
    /// 本次运行中解析/验证失败的目标描述
    pub failed_targets: Vec<String>,
}

impl CrawlSession {
    /// 创建新的爬取会话
    ///
    /// # 参数
    ///
    /// * `request_timeout` - 单次HTTP请求超时时间
    pub fn new(request_timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            client,
            records: Vec::new(),
            failed_targets: Vec::new(),
        })
    }

    /// 追加一页解析出的记录，保持页面内顺序
    pub fn extend_records(&mut self, records: Vec<ListingRecord>) {
        self.records.extend(records);
    }

    /// 登记一个本次运行中失败的目标
    pub fn mark_target_failed(&mut self, description: impl Into<String>) {
        self.failed_targets.push(description.into());
    }
}
