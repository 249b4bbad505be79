// SPDX-License-Identifier: Apache-2.0

pub(crate) mod api;
pub(crate) mod handlers;
pub(crate) mod html;
pub(crate) mod pages;
