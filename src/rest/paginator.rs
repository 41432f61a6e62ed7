/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::rest::{Client, FlickrError, Request};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// One page of a list response
#[derive(Debug)]
pub struct ListPage<T> {
    /// Page count declared by the service, absent means a single page
    pub pages: Option<u32>,
    pub items: Vec<T>,
}

/// A response shape holding one page of items
pub trait ListEnvelope: DeserializeOwned {
    type Item;

    /// Extracts the page, failing with [`FlickrError::Protocol`] when the
    /// container element is missing
    fn into_page(self, client: &Client) -> Result<ListPage<Self::Item>, FlickrError>;
}

/// Walks a paged list method page by page, yielding items in fetch order.
///
/// Pages are requested lazily as the iterator is advanced. Fetching stops after
/// the last page the service declares or after `max_pages` pages, whichever
/// comes first. A `max_pages` of 0 removes the cap.
///
/// An error is yielded once and ends the iteration.
pub struct Paginator<E: ListEnvelope> {
    template: Request,
    max_pages: u32,
    next_page: u32,
    last_page: Option<u32>,
    buffered: std::vec::IntoIter<E::Item>,
    finished: bool,
    _envelope: PhantomData<fn() -> E>,
}

impl<E: ListEnvelope> Paginator<E> {
    /// Uses the page size and page cap configured on the client
    pub fn new(template: Request) -> Self {
        let config = template.client().config();
        let (page_size, max_pages) = (config.page_size, config.max_pages);
        Self::with_limits(template, page_size, max_pages)
    }

    pub fn with_limits(mut template: Request, page_size: u32, max_pages: u32) -> Self {
        template.set_parameter("per_page", page_size.to_string());
        Self {
            template,
            max_pages,
            next_page: 1,
            last_page: None,
            buffered: Vec::new().into_iter(),
            finished: false,
            _envelope: PhantomData,
        }
    }

    /// Number of pages requested so far
    pub fn pages_fetched(&self) -> u32 {
        self.next_page - 1
    }

    /// Fetches every remaining page and flattens the items
    pub fn fetch_all(self) -> Result<Vec<E::Item>, FlickrError> {
        self.collect()
    }

    fn has_more_pages(&self) -> bool {
        match self.last_page {
            Some(last) => self.next_page <= last,
            None => true,
        }
    }

    fn fetch_next_page(&mut self) -> Result<(), FlickrError> {
        let mut req = self.template.clone();
        req.set_parameter("page", self.next_page.to_string());
        let page = req.fetch::<E>()?.into_page(self.template.client())?;

        let declared = page.pages.unwrap_or(1).max(1);
        self.last_page = Some(match self.max_pages {
            0 => declared,
            cap => declared.min(cap),
        });
        self.next_page += 1;
        self.buffered = page.items.into_iter();
        Ok(())
    }
}

impl<E: ListEnvelope> Iterator for Paginator<E> {
    type Item = Result<E::Item, FlickrError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.buffered.next() {
                return Some(Ok(item));
            }
            if self.finished || !self.has_more_pages() {
                return None;
            }
            if let Err(err) = self.fetch_next_page() {
                self.finished = true;
                return Some(Err(err));
            }
        }
    }
}

impl<E: ListEnvelope> std::fmt::Debug for Paginator<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Paginator")
            .field("template", &self.template)
            .field("max_pages", &self.max_pages)
            .field("next_page", &self.next_page)
            .field("last_page", &self.last_page)
            .finish_non_exhaustive()
    }
}
