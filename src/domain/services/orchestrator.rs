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

use crate::config::facets::FacetTable;
use crate::domain::models::{BlockVerdict, ListingRecord, TargetSpec};
use crate::domain::parser::{ListingParser, ParseContext};
use crate::domain::session::CrawlSession;
use crate::domain::url_builder::UrlBuilder;
use crate::engines::traits::{ChallengeResolver, PageFetcher};
use std::time::Duration;

/// 连续空页停止阈值
const MAX_EMPTY_PAGES: u32 = 2;
/// 连续失败页停止阈值
const MAX_FAILED_PAGES: u32 = 3;

/// 结果落盘接口
///
/// 编排器按目标粒度周期性调用，进程崩溃最多丢失在途目标的数据
pub trait RecordSink: Send + Sync {
    /// 持久化一个目标的记录
    fn persist(&self, label: &str, records: &[ListingRecord]) -> anyhow::Result<()>;
}

/// 编排器配置
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// 站点基础URL
    pub base_url: String,
    /// 列表路径段
    pub listing_path: String,
    /// 翻页间延迟区间
    pub page_delay: (Duration, Duration),
    /// 目标间延迟区间
    pub target_delay: (Duration, Duration),
    /// 每个目标的页数上限，None表示不设上限
    pub max_pages: Option<u32>,
}

/// 单个目标的爬取结果
#[derive(Debug)]
pub struct TargetOutcome {
    /// 目标描述
    pub description: String,
    /// 本目标解析出的记录
    pub records: Vec<ListingRecord>,
    /// 实际抓取的页数
    pub pages: u32,
    /// 是否因连续失败而中止
    pub aborted_on_failures: bool,
}

/// 爬取编排器
///
/// 驱动单目标的翻页循环与多目标清扫：抓取 -> 分类 ->
/// （被拦截则验证处理）-> 解析，应用停止策略并聚合结果。
/// 各目标的成败相互独立，单个目标中毒不会中止整体清扫。
pub struct CrawlOrchestrator<F, R, S> {
    fetcher: F,
    resolver: R,
    sink: S,
    parser: ListingParser,
    table: FacetTable,
    config: OrchestratorConfig,
}

impl<F, R, S> CrawlOrchestrator<F, R, S>
where
    F: PageFetcher,
    R: ChallengeResolver,
    S: RecordSink,
{
    pub fn new(
        fetcher: F,
        resolver: R,
        sink: S,
        table: FacetTable,
        config: OrchestratorConfig,
    ) -> anyhow::Result<Self> {
        let parser = ListingParser::new(&config.base_url)?;
        Ok(Self {
            fetcher,
            resolver,
            sink,
            parser,
            table,
            config,
        })
    }

    /// 爬取单个目标
    ///
    /// 页码从1严格递增；停止条件：页数上限、连续两页零记录、
    /// 连续三页抓取/验证失败。记录保持源页面顺序。
    pub async fn crawl_target(
        &self,
        session: &mut CrawlSession,
        target: &TargetSpec,
    ) -> TargetOutcome {
        let description = target.describe();
        tracing::info!(target = %description, "starting target");

        let mut spec = TargetSpec {
            page: 1,
            ..target.clone()
        };
        let mut records: Vec<ListingRecord> = Vec::new();
        let mut empty_streak = 0u32;
        let mut fail_streak = 0u32;
        let mut pages = 0u32;
        let mut aborted = false;

        loop {
            if let Some(cap) = self.config.max_pages {
                if spec.page > cap {
                    tracing::info!(target = %description, cap, "page cap reached");
                    break;
                }
            }

            let url = UrlBuilder::new(&self.config.base_url, &self.config.listing_path, &self.table)
                .build(&spec);
            tracing::info!(target = %description, page = spec.page, %url, "fetching page");
            pages += 1;

            match self.obtain_page(session, &url).await {
                Some(html) => {
                    fail_streak = 0;
                    let ctx = self.parse_context(&spec);
                    let page_records = self.parser.parse(&html, &ctx);
                    if page_records.is_empty() {
                        empty_streak += 1;
                        tracing::warn!(
                            target = %description,
                            page = spec.page,
                            empty_streak,
                            "no listings parsed, possibly last page"
                        );
                        if empty_streak >= MAX_EMPTY_PAGES {
                            break;
                        }
                    } else {
                        empty_streak = 0;
                        tracing::info!(
                            target = %description,
                            page = spec.page,
                            found = page_records.len(),
                            total = records.len() + page_records.len(),
                            "page parsed"
                        );
                        records.extend(page_records);
                    }
                }
                None => {
                    fail_streak += 1;
                    tracing::warn!(target = %description, page = spec.page, fail_streak, "page failed");
                    if fail_streak >= MAX_FAILED_PAGES {
                        aborted = true;
                        break;
                    }
                }
            }

            spec = spec.next_page();
            sleep_between(self.config.page_delay).await;
        }

        tracing::info!(
            target = %description,
            records = records.len(),
            pages,
            "target finished"
        );
        TargetOutcome {
            description,
            records,
            pages,
            aborted_on_failures: aborted,
        }
    }

    /// 多目标清扫
    ///
    /// 逐目标爬取并在目标间插入较长延迟；每个目标完成后立即
    /// 持久化该目标的中间结果，失败目标登记后继续下一个。
    pub async fn sweep(
        &self,
        session: &mut CrawlSession,
        targets: &[TargetSpec],
    ) -> Vec<TargetOutcome> {
        let mut outcomes = Vec::with_capacity(targets.len());

        for (index, target) in targets.iter().enumerate() {
            tracing::info!(
                current = index + 1,
                total = targets.len(),
                target = %target.describe(),
                "sweep progress"
            );

            let outcome = self.crawl_target(session, target).await;

            if outcome.aborted_on_failures {
                session.mark_target_failed(outcome.description.clone());
            }
            if !outcome.records.is_empty() {
                if let Err(err) = self.sink.persist(&outcome.description, &outcome.records) {
                    tracing::error!(target = %outcome.description, error = %err, "intermediate persist failed");
                }
            }
            session.extend_records(outcome.records.clone());
            outcomes.push(outcome);

            if index + 1 < targets.len() {
                sleep_between(self.config.target_delay).await;
            }
        }

        outcomes
    }

    // 抓取并在被拦截时走验证处理，返回可解析的正常页HTML
    async fn obtain_page(&self, session: &mut CrawlSession, url: &str) -> Option<String> {
        let fetched = self.fetcher.fetch(session, url).await;

        match fetched.classification {
            BlockVerdict::Normal => Some(fetched.html),
            verdict if fetched.html.is_empty() => {
                // 重试耗尽的跳过信号，没有可供验证处理的页面
                tracing::warn!(url, ?verdict, "skip signal from fetcher");
                None
            }
            verdict => {
                tracing::warn!(url, ?verdict, "block detected, entering resolver");
                let outcome = self.resolver.resolve(url, verdict).await;
                if outcome.resolved {
                    outcome.html
                } else {
                    None
                }
            }
        }
    }

    fn parse_context(&self, spec: &TargetSpec) -> ParseContext {
        ParseContext {
            crawl_district: spec
                .district
                .clone()
                .unwrap_or_else(|| "全城".to_string()),
            crawl_area: spec.sub_area.clone(),
            crawl_time: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

async fn sleep_between(range: (Duration, Duration)) {
    let (min, max) = range;
    let delay = if max <= min {
        min
    } else {
        Duration::from_millis(rand::random_range(
            min.as_millis() as u64..max.as_millis() as u64,
        ))
    };
    tracing::debug!(delay_ms = delay.as_millis() as u64, "sleeping");
    tokio::time::sleep(delay).await;
}
