// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/mod.rs
//
// Pure models and decoding: sources, sizing, orientation, crop mapping.

pub mod geometry;
pub mod mapper;
pub mod media;
pub mod orientation;
pub mod region;
pub mod sizing;
pub mod source;
