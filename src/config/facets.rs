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

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Path;

/// 筛选维度
///
/// 列表页可用的各个筛选维度，每个维度对应一张标签到站点编码的映射表
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    /// 价格区间
    PriceRange,
    /// 房型
    RoomType,
    /// 面积区间
    AreaRange,
    /// 朝向
    Orientation,
    /// 楼层
    FloorType,
    /// 房龄
    BuildingAge,
    /// 装修
    Decoration,
}

/// 北京各区域（区域名称 -> 拼音编码）
const DISTRICTS: &[(&str, &str)] = &[
    ("朝阳", "chaoyang"),
    ("海淀", "haidian"),
    ("昌平", "changping"),
    ("丰台", "fengtai"),
    ("大兴", "daxing"),
    ("通州", "tongzhouqu"),
    ("房山", "fangshan"),
    ("顺义", "shunyi"),
    ("西城", "xicheng"),
    ("东城", "dongcheng"),
    ("密云", "miyun"),
    ("石景山", "shijingshan"),
    ("怀柔", "huairou"),
    ("门头沟", "mentougou"),
    ("延庆", "yanqing"),
    ("平谷", "pinggu"),
];

const PRICE_RANGES: &[(&str, &str)] = &[
    ("150万以下", "i11292"),
    ("150-250万", "i11293"),
    ("250-300万", "i11294"),
    ("300-350万", "i11295"),
    ("350-400万", "i11296"),
    ("400-500万", "i11297"),
    ("500-650万", "i11298"),
    ("650-1000万", "i11299"),
    ("1000万以上", "i11300"),
];

const ROOM_TYPES: &[(&str, &str)] = &[
    ("一室", "e15"),
    ("二室", "e17"),
    ("三室", "e23"),
    ("四室", "e24"),
    ("五室", "e25"),
    ("五室以上", "e26"),
];

const AREA_RANGES: &[(&str, &str)] = &[
    ("60平米以下", "k11888"),
    ("60-70平米", "k11889"),
    ("70-80平米", "k11890"),
    ("80-90平米", "k11891"),
    ("90-110平米", "k11893"),
    ("110-130平米", "k11894"),
    ("130-160平米", "k11895"),
    ("160-250平米", "k11896"),
    ("250平米以上", "k11897"),
];

const ORIENTATIONS: &[(&str, &str)] = &[
    ("东", "o1"),
    ("南", "o2"),
    ("西", "o3"),
    ("北", "o4"),
    ("南北", "o6"),
    ("东西", "o5"),
    ("东南", "o7"),
    ("西南", "o8"),
    ("东北", "o9"),
    ("西北", "o10"),
];

const FLOOR_TYPES: &[(&str, &str)] = &[
    ("底层", "fl1"),
    ("低层", "fl2"),
    ("中层", "fl3"),
    ("高层", "fl4"),
    ("顶层", "fl5"),
];

const BUILDING_AGES: &[(&str, &str)] = &[
    ("2年内", "yy1"),
    ("2-5年", "yy2"),
    ("5-10年", "yy3"),
    ("10年以上", "yy4"),
];

const DECORATIONS: &[(&str, &str)] = &[
    ("毛坯", "j1"),
    ("简单装修", "j2"),
    ("精装修", "j4"),
    ("豪华装修", "j5"),
];

/// 无筛选标签，任何维度下都映射为"不加筛选"
pub const UNFILTERED_LABEL: &str = "不限";

fn to_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// 筛选条件映射表
///
/// 将人类可读的筛选标签映射为站点URL中的路径编码。
/// 未识别的标签一律降级为"无筛选"而不是报错。
#[derive(Debug, Clone)]
pub struct FacetTable {
    districts: HashMap<String, String>,
    /// 区域 -> (商圈名称 -> 编码)，由sidecar文件补充
    district_areas: HashMap<String, HashMap<String, String>>,
    facets: HashMap<Facet, HashMap<String, String>>,
}

static BUILTIN: Lazy<FacetTable> = Lazy::new(FacetTable::from_builtin);

impl FacetTable {
    fn from_builtin() -> Self {
        let mut facets = HashMap::new();
        facets.insert(Facet::PriceRange, to_map(PRICE_RANGES));
        facets.insert(Facet::RoomType, to_map(ROOM_TYPES));
        facets.insert(Facet::AreaRange, to_map(AREA_RANGES));
        facets.insert(Facet::Orientation, to_map(ORIENTATIONS));
        facets.insert(Facet::FloorType, to_map(FLOOR_TYPES));
        facets.insert(Facet::BuildingAge, to_map(BUILDING_AGES));
        facets.insert(Facet::Decoration, to_map(DECORATIONS));
        Self {
            districts: to_map(DISTRICTS),
            district_areas: HashMap::new(),
            facets,
        }
    }

    /// 内置映射表（不含商圈数据）
    pub fn builtin() -> &'static Self {
        &BUILTIN
    }

    /// 内置映射表加上从sidecar JSON文件加载的商圈编码
    ///
    /// 文件缺失时静默返回内置表，文件损坏时返回错误
    pub fn with_areas_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let mut table = Self::from_builtin();
        let path = path.as_ref();
        if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            table.district_areas = serde_json::from_str(&raw)?;
        }
        Ok(table)
    }

    /// 区域名称对应的路径编码
    pub fn district_code(&self, label: &str) -> Option<&str> {
        lookup(&self.districts, label)
    }

    /// 商圈名称对应的路径编码，要求同时给出所属区域
    pub fn area_code(&self, district: &str, label: &str) -> Option<&str> {
        self.district_areas
            .get(district)
            .and_then(|areas| lookup(areas, label))
    }

    /// 指定维度下标签对应的编码
    pub fn facet_code(&self, facet: Facet, label: &str) -> Option<&str> {
        self.facets.get(&facet).and_then(|m| lookup(m, label))
    }

    /// 已配置的全部区域名称，保持内置表的声明顺序
    pub fn district_labels(&self) -> Vec<&'static str> {
        DISTRICTS.iter().map(|(k, _)| *k).collect()
    }

    /// 指定区域的商圈名称列表
    pub fn area_labels(&self, district: &str) -> Vec<String> {
        self.district_areas
            .get(district)
            .map(|areas| areas.keys().cloned().collect())
            .unwrap_or_default()
    }
}

fn lookup<'a>(map: &'a HashMap<String, String>, label: &str) -> Option<&'a str> {
    if label == UNFILTERED_LABEL {
        return None;
    }
    // Empty codes mean "no filter" too
    map.get(label).map(|s| s.as_str()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_known_labels_resolve() {
        let table = FacetTable::builtin();
        assert_eq!(table.district_code("朝阳"), Some("chaoyang"));
        assert_eq!(table.facet_code(Facet::PriceRange, "150-250万"), Some("i11293"));
        assert_eq!(table.facet_code(Facet::RoomType, "二室"), Some("e17"));
        assert_eq!(table.facet_code(Facet::Decoration, "精装修"), Some("j4"));
    }

    #[test]
    fn test_unknown_label_degrades_to_unfiltered() {
        let table = FacetTable::builtin();
        assert_eq!(table.district_code("不存在的区"), None);
        assert_eq!(table.facet_code(Facet::PriceRange, "一亿以上"), None);
        assert_eq!(table.facet_code(Facet::PriceRange, UNFILTERED_LABEL), None);
    }

    #[test]
    fn test_area_codes_from_sidecar() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"朝阳": {{"望京": "wangjing", "不限": ""}}}}"#).unwrap();
        let table = FacetTable::with_areas_file(file.path()).unwrap();
        assert_eq!(table.area_code("朝阳", "望京"), Some("wangjing"));
        assert_eq!(table.area_code("朝阳", "不限"), None);
        assert_eq!(table.area_code("海淀", "望京"), None);
    }

    #[test]
    fn test_missing_sidecar_is_silent() {
        let table = FacetTable::with_areas_file("/nonexistent/areas.json").unwrap();
        assert_eq!(table.area_code("朝阳", "望京"), None);
        assert_eq!(table.district_code("海淀"), Some("haidian"));
    }
}
