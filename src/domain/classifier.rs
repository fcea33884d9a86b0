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

use crate::domain::models::BlockVerdict;

/// 登录墙特征
const LOGIN_MARKERS: &[&str] = &[
    "请登录",
    "登录验证",
    "扫码登录",
    "手机号登录",
    "账号登录",
    "login",
    "微信登录",
    "短信验证",
];

/// 点击验证特征
const CLICK_MARKERS: &[&str] = &[
    "点击按钮进行验证",
    "btnSubmit",
    "ISDCaptcha",
    "NEcaptcha",
    "点击验证",
];

/// 正常列表页的容器特征
const LISTING_MARKERS: &[&str] = &["property", "filter-region"];

/// 对抓取到的HTML做拦截判定
///
/// 纯函数，只依赖输入HTML，特征检查按固定优先级进行：
/// 登录特征优先于点击特征（两类特征同时出现时判定为登录墙），
/// 其后仅当列表容器特征存在时才判定为正常页。
/// 结构无法识别的页面一律判为 `UnknownBlock`，
/// 绝不把模板漂移当作"无数据"的正常页。
pub fn classify(html: &str) -> BlockVerdict {
    if html.is_empty() {
        return BlockVerdict::UnknownBlock;
    }

    let lower = html.to_lowercase();
    if contains_any(html, &lower, LOGIN_MARKERS) {
        return BlockVerdict::LoginWall;
    }
    if contains_any(html, &lower, CLICK_MARKERS) {
        return BlockVerdict::ClickChallenge;
    }
    if contains_any(html, &lower, LISTING_MARKERS) {
        return BlockVerdict::Normal;
    }
    BlockVerdict::UnknownBlock
}

/// 是否命中任意一个列表容器特征
///
/// 验证处理轮询中的独立成功判据之一
pub fn has_listing_markers(html: &str) -> bool {
    LISTING_MARKERS.iter().any(|m| html.contains(m))
}

fn contains_any(html: &str, lower: &str, markers: &[&str]) -> bool {
    markers
        .iter()
        .any(|m| html.contains(m) || lower.contains(&m.to_lowercase()))
}
