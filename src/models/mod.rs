// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Markup data model.

pub mod annotation;
pub mod scene;
pub mod style;
