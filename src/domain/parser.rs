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
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

static AREA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*㎡").expect("static regex"));
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{4})年").expect("static regex"));

const ORIENTATION_HINTS: &[&str] = &["南北", "东西", "南", "北", "东", "西"];

/// 解析上下文
///
/// 附加到每条记录上的抓取元数据，由调用方提供，
/// 使解析本身保持纯函数（同一输入必得同一输出）。
#[derive(Debug, Clone)]
pub struct ParseContext {
    /// 抓取时指定的区域
    pub crawl_district: String,
    /// 抓取时指定的商圈
    pub crawl_area: Option<String>,
    /// 抓取时间，格式 %Y-%m-%d %H:%M:%S
    pub crawl_time: String,
}

/// 房源列表解析器
///
/// 从正常列表页HTML中枚举房源卡片并提取结构化字段。
/// 价格等字段来自专用元素；面积/朝向/楼层/年份没有独立标记，
/// 从自由文本信息行中按模式挖掘。无标题的卡片静默丢弃。
pub struct ListingParser {
    card: Selector,
    title: Selector,
    title_fallback: Selector,
    link: Selector,
    price_num: Selector,
    price_text: Selector,
    price_average: Selector,
    room_attribute: Selector,
    info_text: Selector,
    comm_name: Selector,
    comm_address: Selector,
    tag: Selector,
    span: Selector,
    base_url: Url,
}

impl ListingParser {
    /// 创建解析器
    ///
    /// # 参数
    ///
    /// * `base_url` - 站点基础URL，用于把相对详情页链接补全为绝对URL
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Ok(Self {
            card: sel("div.property")?,
            title: sel("h3.property-content-title-name")?,
            title_fallback: sel("[title]")?,
            link: sel(r#"a.property-ex, a[href*="ershoufang"]"#)?,
            price_num: sel("span.property-price-total-num")?,
            price_text: sel("span.property-price-total-text")?,
            price_average: sel("p.property-price-average")?,
            room_attribute: sel("p.property-content-info-attribute")?,
            info_text: sel("p.property-content-info-text")?,
            comm_name: sel("p.property-content-info-comm-name")?,
            comm_address: sel("p.property-content-info-comm-address")?,
            tag: sel("span.property-content-info-tag")?,
            span: sel("span")?,
            base_url: Url::parse(base_url)?,
        })
    }

    /// 解析列表页
    ///
    /// 仅应在分类为正常页的HTML上调用；记录顺序与页面卡片顺序一致
    pub fn parse(&self, html: &str, ctx: &ParseContext) -> Vec<ListingRecord> {
        let document = Html::parse_document(html);
        document
            .select(&self.card)
            .filter_map(|card| self.extract_card(card, ctx))
            .collect()
    }

    // 单张卡片的字段提取，无标题视为标记噪声返回None
    fn extract_card(&self, card: ElementRef<'_>, ctx: &ParseContext) -> Option<ListingRecord> {
        let title = card
            .select(&self.title)
            .next()
            .map(|e| text_of(e))
            .filter(|t| !t.is_empty())
            .or_else(|| {
                card.select(&self.title_fallback)
                    .next()
                    .and_then(|e| e.value().attr("title"))
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
            })?;

        let mut record = ListingRecord {
            title,
            crawl_time: ctx.crawl_time.clone(),
            crawl_district: ctx.crawl_district.clone(),
            crawl_area: ctx.crawl_area.clone(),
            ..ListingRecord::default()
        };

        if let Some(href) = card
            .select(&self.link)
            .next()
            .and_then(|e| e.value().attr("href"))
        {
            if let Ok(joined) = self.base_url.join(href) {
                record.url = Some(joined.to_string());
            }
        }

        if let Some(num) = card.select(&self.price_num).next() {
            record.price = text_of(num);
            record.price_unit = card
                .select(&self.price_text)
                .next()
                .map(|e| text_of(e))
                .unwrap_or_else(|| "万".to_string());
        }

        record.price_per_sqm = card
            .select(&self.price_average)
            .next()
            .map(|e| text_of(e))
            .filter(|t| !t.is_empty());

        record.room_type = card
            .select(&self.room_attribute)
            .next()
            .and_then(|attr| self.join_room_spans(attr));

        for info in card.select(&self.info_text) {
            self.mine_info_line(&text_of(info), &mut record);
        }

        record.community = card
            .select(&self.comm_name)
            .next()
            .map(|e| text_of(e))
            .filter(|t| !t.is_empty());

        if let Some(address) = card.select(&self.comm_address).next() {
            let parts: Vec<String> = address
                .select(&self.span)
                .map(|s| text_of(s))
                .filter(|t| !t.is_empty())
                .collect();
            if !parts.is_empty() {
                record.location = Some(parts.join(" "));
                record.district = parts.first().cloned();
                record.business_area = parts.get(1).cloned();
            }
        }

        record.tags = card
            .select(&self.tag)
            .map(|t| text_of(t))
            .filter(|t| !t.is_empty())
            .collect();

        Some(record)
    }

    // 房型由交替的数字/单位span拼接，如 ["2","室","1","厅"] -> "2室1厅"
    fn join_room_spans(&self, attr: ElementRef<'_>) -> Option<String> {
        let spans: Vec<String> = attr.select(&self.span).map(|s| text_of(s)).collect();
        let mut parts = Vec::new();
        let mut i = 0;
        while i + 1 < spans.len() {
            parts.push(format!("{}{}", spans[i], spans[i + 1]));
            i += 2;
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.concat())
        }
    }

    // 面积/朝向/楼层/年份从信息行文本中模式挖掘，首个命中者生效
    fn mine_info_line(&self, text: &str, record: &mut ListingRecord) {
        if record.area.is_none() {
            if let Some(caps) = AREA_RE.captures(text) {
                record.area = Some(caps[1].to_string());
            }
        }

        if record.orientation.is_none()
            && text.chars().count() <= 4
            && ORIENTATION_HINTS.iter().any(|o| text.contains(o))
        {
            record.orientation = Some(text.to_string());
        }

        if record.floor.is_none() && text.contains('层') {
            record.floor = Some(text.to_string());
        }

        if record.build_year.is_none() {
            if let Some(caps) = YEAR_RE.captures(text) {
                record.build_year = Some(caps[1].to_string());
            }
        }
    }
}

fn sel(s: &str) -> anyhow::Result<Selector> {
    Selector::parse(s).map_err(|e| anyhow::anyhow!("invalid selector {:?}: {:?}", s, e))
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ParseContext {
        ParseContext {
            crawl_district: "朝阳".to_string(),
            crawl_area: None,
            crawl_time: "2025-01-01 12:00:00".to_string(),
        }
    }

    fn sample_card() -> &'static str {
        r#"
        <html><body>
        <div class="property">
          <a class="property-ex" href="/ershoufang/12345.shtml"></a>
          <h3 class="property-content-title-name">望京新城 南北通透两居</h3>
          <p class="property-content-info-attribute">
            <span>2</span><span>室</span><span>1</span><span>厅</span>
          </p>
          <p class="property-content-info-text">89.5㎡</p>
          <p class="property-content-info-text">南北</p>
          <p class="property-content-info-text">中层(共18层)</p>
          <p class="property-content-info-text">2008年建造</p>
          <p class="property-content-info-comm-name">望京新城</p>
          <p class="property-content-info-comm-address">
            <span>朝阳</span><span>望京</span><span>广顺北大街</span>
          </p>
          <span class="property-content-info-tag">满五唯一</span>
          <span class="property-content-info-tag">近地铁</span>
          <span class="property-price-total-num">458</span>
          <span class="property-price-total-text">万</span>
          <p class="property-price-average">51173元/㎡</p>
        </div>
        </body></html>
        "#
    }

    #[test]
    fn test_extracts_all_fields() {
        let parser = ListingParser::new("https://bj.58.com/").unwrap();
        let records = parser.parse(sample_card(), &ctx());
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.title, "望京新城 南北通透两居");
        assert_eq!(r.price, "458");
        assert_eq!(r.price_unit, "万");
        assert_eq!(r.price_per_sqm.as_deref(), Some("51173元/㎡"));
        assert_eq!(r.room_type.as_deref(), Some("2室1厅"));
        assert_eq!(r.area.as_deref(), Some("89.5"));
        assert_eq!(r.orientation.as_deref(), Some("南北"));
        assert_eq!(r.floor.as_deref(), Some("中层(共18层)"));
        assert_eq!(r.build_year.as_deref(), Some("2008"));
        assert_eq!(r.community.as_deref(), Some("望京新城"));
        assert_eq!(r.district.as_deref(), Some("朝阳"));
        assert_eq!(r.business_area.as_deref(), Some("望京"));
        assert_eq!(r.location.as_deref(), Some("朝阳 望京 广顺北大街"));
        assert_eq!(r.tags, vec!["满五唯一", "近地铁"]);
        assert_eq!(
            r.url.as_deref(),
            Some("https://bj.58.com/ershoufang/12345.shtml")
        );
        assert_eq!(r.crawl_district, "朝阳");
    }

    #[test]
    fn test_card_without_title_is_dropped() {
        let html = r#"
        <div class="property">
          <span class="property-price-total-num">300</span>
        </div>
        <div class="property">
          <h3 class="property-content-title-name">有标题的卡片</h3>
        </div>
        "#;
        let parser = ListingParser::new("https://bj.58.com/").unwrap();
        let records = parser.parse(html, &ctx());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "有标题的卡片");
    }

    #[test]
    fn test_title_attribute_fallback() {
        let html = r#"
        <div class="property">
          <a title="备用标题来源" href="/ershoufang/1.shtml"></a>
        </div>
        "#;
        let parser = ListingParser::new("https://bj.58.com/").unwrap();
        let records = parser.parse(html, &ctx());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "备用标题来源");
    }

    #[test]
    fn test_parse_is_idempotent() {
        let parser = ListingParser::new("https://bj.58.com/").unwrap();
        let first = parser.parse(sample_card(), &ctx());
        let second = parser.parse(sample_card(), &ctx());
        assert_eq!(first, second);
    }

    #[test]
    fn test_long_info_line_not_taken_as_orientation() {
        let html = r#"
        <div class="property">
          <h3 class="property-content-title-name">标题</h3>
          <p class="property-content-info-text">小区位于城南主干道旁</p>
        </div>
        "#;
        let parser = ListingParser::new("https://bj.58.com/").unwrap();
        let records = parser.parse(html, &ctx());
        assert_eq!(records[0].orientation, None);
    }

    #[test]
    fn test_empty_page_yields_no_records() {
        let parser = ListingParser::new("https://bj.58.com/").unwrap();
        assert!(parser.parse("<html><body></body></html>", &ctx()).is_empty());
    }
}
