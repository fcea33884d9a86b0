// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置、环境变量以及筛选条件映射表
pub mod config;

/// 领域模块
///
/// 包含核心数据模型、URL构建、页面分类、列表解析与爬取编排
pub mod domain;

/// 引擎模块
///
/// 实现HTTP抓取、身份轮换与基于浏览器的验证处理
pub mod engines;

/// 基础设施模块
///
/// 提供结果落盘等外部集成
pub mod infrastructure;

/// 工具模块
///
/// 提供重试策略与日志初始化等通用功能
pub mod utils;
