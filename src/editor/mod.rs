// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation editing: tools, hit testing, history, painting and the
//! controller that ties them to pointer input.

pub mod controller;
pub mod history;
pub mod render;
pub mod tool;
