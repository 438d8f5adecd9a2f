// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O: image loading, annotation storage and export.

pub mod export;
pub mod gateway;
pub mod http;
pub mod media;
pub mod serialization;
pub mod wire;
