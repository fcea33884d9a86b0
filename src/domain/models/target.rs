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

/// 爬取目标规格
///
/// 一个目标对应一组筛选条件（区域、商圈、价格等）加页码。
/// 每次请求对应一个不可变的规格，翻页由编排器递增 `page` 派生新规格。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpec {
    /// 区域名称
    pub district: Option<String>,
    /// 商圈名称，仅在指定区域时生效
    pub sub_area: Option<String>,
    /// 价格区间标签
    pub price_range: Option<String>,
    /// 房型标签
    pub room_type: Option<String>,
    /// 面积区间标签
    pub area_range: Option<String>,
    /// 朝向标签
    pub orientation: Option<String>,
    /// 楼层标签
    pub floor_type: Option<String>,
    /// 房龄标签
    pub building_age: Option<String>,
    /// 装修标签
    pub decoration: Option<String>,
    /// 页码，从1开始
    pub page: u32,
}

impl TargetSpec {
    /// 创建指定区域的目标，页码置为1
    pub fn for_district(district: impl Into<String>) -> Self {
        Self {
            district: Some(district.into()),
            page: 1,
            ..Self::default()
        }
    }

    /// 派生下一页的规格
    ///
    /// 页码只增不减，同一目标内的抓取顺序严格递增
    pub fn next_page(&self) -> Self {
        let mut next = self.clone();
        next.page += 1;
        next
    }

    /// 目标的人类可读描述，用于日志与落盘文件命名
    pub fn describe(&self) -> String {
        match (&self.district, &self.sub_area) {
            (Some(d), Some(a)) => format!("{}-{}", d, a),
            (Some(d), None) => d.clone(),
            (None, Some(a)) => a.clone(),
            (None, None) => "全城".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_page_increments() {
        let spec = TargetSpec::for_district("朝阳");
        assert_eq!(spec.page, 1);
        let next = spec.next_page();
        assert_eq!(next.page, 2);
        assert_eq!(next.district.as_deref(), Some("朝阳"));
        // 原规格不变
        assert_eq!(spec.page, 1);
    }

    #[test]
    fn test_describe() {
        assert_eq!(TargetSpec::default().describe(), "全城");
        assert_eq!(TargetSpec::for_district("海淀").describe(), "海淀");
        let mut spec = TargetSpec::for_district("朝阳");
        spec.sub_area = Some("望京".to_string());
        assert_eq!(spec.describe(), "朝阳-望京");
    }
}
