// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：目标规格、抓取结果、房源记录等数据结构
/// - URL构建（url_builder）：由目标规格组合列表页URL
/// - 页面分类（classifier）：判定页面是正常列表还是某种反爬拦截
/// - 列表解析（parser）：从正常页面提取结构化房源记录
/// - 会话（session）：一次运行内共享的HTTP会话与结果累积
/// - 服务（services）：爬取编排
///
/// 领域层不直接发起I/O，纯逻辑部分可独立单元测试。
pub mod classifier;
pub mod models;
pub mod parser;
pub mod services;
pub mod session;
pub mod url_builder;
