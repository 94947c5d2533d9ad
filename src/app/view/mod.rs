// SPDX-License-Identifier: GPL-3.0-or-later
// src/app/view/mod.rs
//
// View layer: drawing surface and crop view parts.

pub mod canvas;
pub mod crop;
