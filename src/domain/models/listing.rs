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

use serde::{Deserialize, Serialize};

/// 单条房源记录
///
/// 对应列表页中的一张房源卡片。除标题与总价外其余字段
/// 在源页面标记缺失时为 `None`，记录一经产出不再修改。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    /// 标题
    pub title: String,
    /// 总价数值（字符串保留源格式）
    pub price: String,
    /// 总价单位，通常为"万"
    pub price_unit: String,
    /// 单价
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_sqm: Option<String>,
    /// 房型，如"2室1厅"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_type: Option<String>,
    /// 建筑面积（平方米）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    /// 朝向
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,
    /// 楼层描述
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    /// 建成年份
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_year: Option<String>,
    /// 小区名称
    #[serde(skip_serializing_if = "Option::is_none")]
    pub community: Option<String>,
    /// 地址描述
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// 地址中的区域
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    /// 地址中的商圈
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_area: Option<String>,
    /// 标签列表
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// 详情页链接
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// 抓取时间，格式 %Y-%m-%d %H:%M:%S
    pub crawl_time: String,
    /// 抓取时指定的区域（非从页面解析）
    pub crawl_district: String,
    /// 抓取时指定的商圈
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crawl_area: Option<String>,
}

impl ListingRecord {
    /// 总价的数值形式，无法解析时为 `None`
    pub fn price_value(&self) -> Option<f64> {
        self.price.parse().ok()
    }
}
