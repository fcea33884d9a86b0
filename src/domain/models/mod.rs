// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod fetch;
pub mod listing;
pub mod target;

pub use fetch::{BlockVerdict, FetchResult};
pub use listing::ListingRecord;
pub use target::TargetSpec;
