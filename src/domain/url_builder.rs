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

use crate::config::facets::{Facet, FacetTable};
use crate::domain::models::TargetSpec;

/// 列表页URL构建器
///
/// 纯函数式组合：目标规格 + 映射表 -> 完整URL。
/// 未识别的筛选标签降级为"该维度不加筛选"，不报错。
pub struct UrlBuilder<'a> {
    base_url: &'a str,
    listing_path: &'a str,
    table: &'a FacetTable,
}

impl<'a> UrlBuilder<'a> {
    pub fn new(base_url: &'a str, listing_path: &'a str, table: &'a FacetTable) -> Self {
        Self {
            base_url,
            listing_path,
            table,
        }
    }

    /// 由目标规格组合列表页URL
    ///
    /// 第1页为裸列表路径，第N页(N>1)追加 `pnN` 段。
    /// 商圈编码优先于区域编码（商圈路径已含区域信息）。
    pub fn build(&self, spec: &TargetSpec) -> String {
        let mut url = String::from(self.base_url);
        if !url.ends_with('/') {
            url.push('/');
        }

        let location = self.location_code(spec);
        if let Some(code) = location {
            url.push_str(code);
            url.push('/');
        }
        url.push_str(self.listing_path.trim_matches('/'));
        url.push('/');

        let facet_segment = self.facet_segment(spec);
        if !facet_segment.is_empty() {
            url.push_str(&facet_segment);
            url.push('/');
        }

        if spec.page > 1 {
            url.push_str(&format!("pn{}/", spec.page));
        }

        url
    }

    fn location_code(&self, spec: &TargetSpec) -> Option<&str> {
        if let (Some(district), Some(area)) = (&spec.district, &spec.sub_area) {
            if let Some(code) = self.table.area_code(district, area) {
                return Some(code);
            }
        }
        spec.district
            .as_deref()
            .and_then(|d| self.table.district_code(d))
    }

    // 筛选编码拼为单个路径段，维度顺序固定
    fn facet_segment(&self, spec: &TargetSpec) -> String {
        let picks = [
            (Facet::PriceRange, &spec.price_range),
            (Facet::RoomType, &spec.room_type),
            (Facet::AreaRange, &spec.area_range),
            (Facet::Orientation, &spec.orientation),
            (Facet::FloorType, &spec.floor_type),
            (Facet::BuildingAge, &spec.building_age),
            (Facet::Decoration, &spec.decoration),
        ];

        let mut segment = String::new();
        for (facet, label) in picks {
            if let Some(label) = label {
                if let Some(code) = self.table.facet_code(facet, label) {
                    segment.push_str(code);
                }
            }
        }
        segment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder(table: &FacetTable) -> UrlBuilder<'_> {
        UrlBuilder::new("https://bj.58.com/", "ershoufang/", table)
    }

    #[test]
    fn test_page_one_is_bare_path() {
        let table = FacetTable::builtin();
        let spec = TargetSpec::for_district("朝阳");
        assert_eq!(
            builder(table).build(&spec),
            "https://bj.58.com/chaoyang/ershoufang/"
        );
    }

    #[test]
    fn test_later_pages_append_pn_segment() {
        let table = FacetTable::builtin();
        let spec = TargetSpec {
            page: 3,
            ..TargetSpec::for_district("海淀")
        };
        assert_eq!(
            builder(table).build(&spec),
            "https://bj.58.com/haidian/ershoufang/pn3/"
        );
    }

    #[test]
    fn test_no_district_crawls_whole_city() {
        let table = FacetTable::builtin();
        let spec = TargetSpec {
            page: 1,
            ..TargetSpec::default()
        };
        assert_eq!(builder(table).build(&spec), "https://bj.58.com/ershoufang/");
    }

    #[test]
    fn test_facet_codes_compose_in_fixed_order() {
        let table = FacetTable::builtin();
        let spec = TargetSpec {
            price_range: Some("300-350万".to_string()),
            room_type: Some("二室".to_string()),
            page: 1,
            ..TargetSpec::for_district("朝阳")
        };
        assert_eq!(
            builder(table).build(&spec),
            "https://bj.58.com/chaoyang/ershoufang/i11295e17/"
        );
    }

    #[test]
    fn test_unknown_facet_label_equals_omitted_facet() {
        let table = FacetTable::builtin();
        let mut with_unknown = TargetSpec::for_district("朝阳");
        with_unknown.price_range = Some("不存在的价格段".to_string());
        with_unknown.room_type = Some("二室".to_string());

        let mut without = TargetSpec::for_district("朝阳");
        without.price_range = None;
        without.room_type = Some("二室".to_string());

        let b = builder(table);
        assert_eq!(b.build(&with_unknown), b.build(&without));
    }

    #[test]
    fn test_unknown_district_degrades_to_citywide() {
        let table = FacetTable::builtin();
        let spec = TargetSpec::for_district("不存在的区");
        assert_eq!(builder(table).build(&spec), "https://bj.58.com/ershoufang/");
    }
}
