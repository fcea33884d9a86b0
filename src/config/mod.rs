// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置，包括站点、抓取节奏、验证处理与输出配置
pub mod settings;

/// 筛选条件映射表
///
/// 区域/商圈/价格等人类可读标签到站点编码的静态映射
pub mod facets;
