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

use clap::Parser;
use fangrs::config::facets::FacetTable;
use fangrs::config::settings::Settings;
use fangrs::domain::models::TargetSpec;
use fangrs::domain::services::orchestrator::{CrawlOrchestrator, OrchestratorConfig, RecordSink};
use fangrs::domain::session::CrawlSession;
use fangrs::engines::browser::ChromiumLauncher;
use fangrs::engines::http_fetcher::HttpFetcher;
use fangrs::engines::identity::IdentityRotator;
use fangrs::engines::resolver::{CaptchaResolver, ConsoleGate, ResolverConfig};
use fangrs::infrastructure::storage::FileSink;
use fangrs::utils::retry_policy::RetryPolicy;
use fangrs::utils::telemetry::init_telemetry;
use std::time::Duration;

/// 58同城北京二手房列表爬虫
#[derive(Parser, Debug)]
#[command(name = "fangrs", version, about = "58同城北京二手房数据采集")]
struct Cli {
    /// 目标区域，如"朝阳"
    #[arg(short, long)]
    district: Option<String>,

    /// 目标商圈，如"望京"，需同时指定区域
    #[arg(short, long)]
    area: Option<String>,

    /// 价格区间，如"300-350万"
    #[arg(long)]
    price: Option<String>,

    /// 房型，如"二室"
    #[arg(long)]
    room: Option<String>,

    /// 面积区间，如"80-90平米"
    #[arg(long)]
    size: Option<String>,

    /// 朝向，如"南北"
    #[arg(long)]
    orient: Option<String>,

    /// 楼层，如"中层"
    #[arg(long)]
    floor: Option<String>,

    /// 房龄，如"5-10年"
    #[arg(long)]
    age: Option<String>,

    /// 装修，如"精装修"
    #[arg(long)]
    decor: Option<String>,

    /// 每个目标最大页数，覆盖配置默认值
    #[arg(short, long)]
    pages: Option<u32>,

    /// 爬取全部区域
    #[arg(long)]
    all: bool,

    /// 列出可用区域与商圈后退出
    #[arg(long)]
    list: bool,

    /// 输出目录，覆盖配置默认值
    #[arg(short, long)]
    output: Option<String>,
}

impl Cli {
    // 由命令行筛选条件构造单个目标
    fn to_target(&self) -> TargetSpec {
        TargetSpec {
            district: self.district.clone(),
            sub_area: self.area.clone(),
            price_range: self.price.clone(),
            room_type: self.room.clone(),
            area_range: self.size.clone(),
            orientation: self.orient.clone(),
            floor_type: self.floor.clone(),
            building_age: self.age.clone(),
            decoration: self.decor.clone(),
            page: 1,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 初始化日志
    init_telemetry();

    let cli = Cli::parse();

    // 2. 加载配置与筛选映射表
    let settings = Settings::new()?;
    let table = match &settings.output.areas_file {
        Some(path) => FacetTable::with_areas_file(path)?,
        None => FacetTable::builtin().clone(),
    };

    if cli.list {
        print_catalog(&table);
        return Ok(());
    }

    // 3. 组装爬取目标
    let targets: Vec<TargetSpec> = if cli.all {
        let base = cli.to_target();
        table
            .district_labels()
            .into_iter()
            .map(|district| TargetSpec {
                district: Some(district.to_string()),
                sub_area: None,
                ..base.clone()
            })
            .collect()
    } else {
        vec![cli.to_target()]
    };
    tracing::info!(targets = targets.len(), "crawl plan assembled");

    // 4. 构建会话与各引擎
    let mut session = CrawlSession::new(settings.request_timeout())?;

    let fetcher = HttpFetcher::new(
        IdentityRotator::new(settings.site.base_url.clone()),
        RetryPolicy {
            max_attempts: settings.crawl.max_retries,
            ..RetryPolicy::default()
        },
        (
            Duration::from_millis(settings.crawl.request_delay_min_ms),
            Duration::from_millis(settings.crawl.request_delay_max_ms),
        ),
        settings.crawl.identity_rotate_probability,
    );

    let resolver = CaptchaResolver::new(
        ChromiumLauncher,
        ConsoleGate,
        ResolverConfig {
            click_timeout: Duration::from_secs(settings.resolver.click_timeout_secs),
            login_timeout: Duration::from_secs(settings.resolver.login_timeout_secs),
            poll_interval: Duration::from_secs(settings.resolver.poll_interval_secs),
            ..ResolverConfig::default()
        },
    );

    let output_dir = cli.output.clone().unwrap_or(settings.output.dir.clone());
    let sink = FileSink::new(&output_dir);

    let orchestrator = CrawlOrchestrator::new(
        fetcher,
        resolver,
        sink,
        table,
        OrchestratorConfig {
            base_url: settings.site.base_url.clone(),
            listing_path: settings.site.listing_path.clone(),
            page_delay: (
                Duration::from_millis(settings.crawl.page_delay_min_ms),
                Duration::from_millis(settings.crawl.page_delay_max_ms),
            ),
            target_delay: (
                Duration::from_millis(settings.crawl.target_delay_min_ms),
                Duration::from_millis(settings.crawl.target_delay_max_ms),
            ),
            max_pages: Some(cli.pages.unwrap_or(settings.crawl.default_max_pages)),
        },
    )?;

    // 5. 执行爬取
    let outcomes = orchestrator.sweep(&mut session, &targets).await;

    // 6. 汇总落盘与运行报告
    if outcomes.len() > 1 && !session.records.is_empty() {
        FileSink::new(&output_dir).persist("全部", &session.records)?;
    }

    println!("\n==================== 运行汇总 ====================");
    for outcome in &outcomes {
        println!(
            "  {:<12} 页数 {:<4} 记录 {:<6} {}",
            outcome.description,
            outcome.pages,
            outcome.records.len(),
            if outcome.aborted_on_failures {
                "连续失败中止"
            } else {
                "完成"
            }
        );
    }
    println!("  总记录数: {}", session.records.len());
    let prices: Vec<f64> = session
        .records
        .iter()
        .filter_map(|r| r.price_value())
        .collect();
    if !prices.is_empty() {
        let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
        let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let avg = prices.iter().sum::<f64>() / prices.len() as f64;
        println!("  总价(万): 最低 {:.0} / 平均 {:.1} / 最高 {:.0}", min, avg, max);
    }
    if !session.failed_targets.is_empty() {
        println!("  失败目标: {}", session.failed_targets.join(", "));
    }
    println!("==================================================");

    Ok(())
}

fn print_catalog(table: &FacetTable) {
    println!("可用区域:");
    for district in table.district_labels() {
        let areas = table.area_labels(district);
        if areas.is_empty() {
            println!("  {}", district);
        } else {
            println!("  {} ({})", district, areas.join("、"));
        }
    }
}
