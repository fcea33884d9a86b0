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

/// 页面拦截判定
///
/// 由分类器对抓取到的HTML做出的唯一判定，
/// 后续所有分支（继续解析 / 进入验证处理 / 跳过）都只消费该枚举。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockVerdict {
    /// 正常列表页
    Normal,
    /// 登录墙，需要人工完成登录
    LoginWall,
    /// 点击验证，可脚本点击后由人工完成滑块/图形验证
    ClickChallenge,
    /// 无法识别的页面结构
    UnknownBlock,
}

impl BlockVerdict {
    /// 是否属于被拦截状态
    pub fn is_blocked(&self) -> bool {
        !matches!(self, BlockVerdict::Normal)
    }
}

/// 一次HTTP往返的抓取结果
///
/// 不可变，分类结果在构造时确定
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// 请求的URL
    pub url: String,
    /// HTTP状态码，传输失败时为0
    pub status_code: u16,
    /// 页面HTML，失败时为空
    pub html: String,
    /// 拦截判定
    pub classification: BlockVerdict,
}

impl FetchResult {
    /// 构造一个表示"跳过本页"的结果
    ///
    /// 重试耗尽后使用，分类固定为 `UnknownBlock`
    pub fn skipped(url: impl Into<String>, status_code: u16) -> Self {
        Self {
            url: url.into(),
            status_code,
            html: String::new(),
            classification: BlockVerdict::UnknownBlock,
        }
    }
}
