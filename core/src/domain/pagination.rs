// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Fixed-size pagination shared by every list view.

use serde::Serialize;

/// Records per page on every list view
pub const PAGE_SIZE: usize = 10;

/// Upper bound on a requested page number; keeps offsets inside `i64`.
const MAX_PAGE_NUMBER: usize = u32::MAX as usize;

/// A requested page (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: usize,
    pub size: usize,
}

impl PageRequest {
    pub fn new(number: usize) -> Self {
        Self {
            number: number.clamp(1, MAX_PAGE_NUMBER),
            size: PAGE_SIZE,
        }
    }

    /// Parse the `page` query parameter. Missing, non-numeric and zero
    /// values all select the first page.
    pub fn from_query(raw: Option<&str>) -> Self {
        let number = raw
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(1);
        Self::new(number)
    }

    pub fn offset(&self) -> usize {
        (self.number - 1).saturating_mul(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1)
    }
}

/// One page of results plus the navigation facts templates need.
///
/// A page past the end is valid and simply empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
    pub total: usize,
    pub has_next: bool,
    pub has_previous: bool,
    pub is_paginated: bool,
    pub next_page: Option<usize>,
    pub previous_page: Option<usize>,
}

impl<T> Page<T> {
    /// Assemble a page from the already-sliced `items` and the total count
    /// across all pages.
    pub fn new(items: Vec<T>, request: PageRequest, total: usize) -> Self {
        let num_pages = total.div_ceil(request.size).max(1);
        let has_next = request.number < num_pages;
        let has_previous = request.number > 1;
        Self {
            items,
            number: request.number,
            num_pages,
            total,
            has_next,
            has_previous,
            is_paginated: num_pages > 1,
            next_page: has_next.then_some(request.number + 1),
            previous_page: has_previous.then_some(request.number - 1),
        }
    }

    /// Slice an ordered, fully materialized result set.
    pub fn from_vec(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len();
        let items = all
            .into_iter()
            .skip(request.offset())
            .take(request.size)
            .collect();
        Self::new(items, request, total)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
            has_next: self.has_next,
            has_previous: self.has_previous,
            is_paginated: self.is_paginated,
            next_page: self.next_page,
            previous_page: self.previous_page,
        }
    }

    /// Like [`Page::map`], stopping at the first error
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        let items = self.items.into_iter().map(f).collect::<Result<Vec<U>, E>>()?;
        Ok(Page {
            items,
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
            has_next: self.has_next,
            has_previous: self.has_previous,
            is_paginated: self.is_paginated,
            next_page: self.next_page,
            previous_page: self.previous_page,
        })
    }
}
