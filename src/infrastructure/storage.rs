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
use crate::domain::services::orchestrator::RecordSink;
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};

/// CSV列头，列顺序固定，消费侧脚本依赖该顺序
const CSV_COLUMNS: &[&str] = &[
    "crawl_district",
    "crawl_area",
    "title",
    "price",
    "price_unit",
    "price_per_sqm",
    "room_type",
    "area",
    "orientation",
    "floor",
    "build_year",
    "community",
    "district",
    "business_area",
    "location",
    "tags",
    "url",
    "crawl_time",
];

/// 文件落盘器
///
/// 每个目标写一对带时间戳的CSV与JSON文件。CSV中可选字段
/// 缺失写空串，标签以空格连接；JSON为记录数组，便于下游
/// 程序直接反序列化。
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn write_csv(&self, path: &Path, records: &[ListingRecord]) -> anyhow::Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        writer.write_record(CSV_COLUMNS)?;
        for record in records {
            writer.write_record(csv_row(record))?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_json(&self, path: &Path, records: &[ListingRecord]) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(records)?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

impl RecordSink for FileSink {
    /// 持久化一个目标的记录
    ///
    /// # 参数
    ///
    /// * `label` - 目标描述，进入文件名
    /// * `records` - 该目标的全部记录
    fn persist(&self, label: &str, records: &[ListingRecord]) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create output dir {}", self.dir.display()))?;

        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let stem = format!("ershoufang_{}_{}", sanitize_label(label), stamp);
        let csv_path = self.dir.join(format!("{}.csv", stem));
        let json_path = self.dir.join(format!("{}.json", stem));

        self.write_csv(&csv_path, records)?;
        self.write_json(&json_path, records)?;

        tracing::info!(
            label,
            records = records.len(),
            csv = %csv_path.display(),
            json = %json_path.display(),
            "records persisted"
        );
        Ok(())
    }
}

fn csv_row(record: &ListingRecord) -> Vec<String> {
    let opt = |v: &Option<String>| v.clone().unwrap_or_default();
    vec![
        record.crawl_district.clone(),
        opt(&record.crawl_area),
        record.title.clone(),
        record.price.clone(),
        record.price_unit.clone(),
        opt(&record.price_per_sqm),
        opt(&record.room_type),
        opt(&record.area),
        opt(&record.orientation),
        opt(&record.floor),
        opt(&record.build_year),
        opt(&record.community),
        opt(&record.district),
        opt(&record.business_area),
        opt(&record.location),
        record.tags.join(" "),
        opt(&record.url),
        record.crawl_time.clone(),
    ]
}

// 文件名里只保留安全字符，路径分隔符等替换为下划线
fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
