// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施模块
///
/// 提供CSV/JSON结果落盘
pub mod storage;
