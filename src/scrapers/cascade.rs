//! The container selector cascade.
//!
//! Container selectors are tried in profile order (most structured markup
//! first). Every element they match is a candidate; the first headline link
//! inside it decides the title, and the remaining fields are read through
//! their own chains. Accepted titles are remembered for the whole run, so a
//! story that appears under several wrappers is listed once.

use crate::config::SiteProfile;
use crate::document::{Document, Element};
use crate::models::ArticleRecord;
use crate::normalize::{Normalizer, RawFields};
use crate::scrapers::lookup::{first_element, first_image_source, first_value};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::{debug, info, instrument};

/// A container element plus the selector that matched it.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a, 'p> {
    pub container: Element<'a>,
    pub strategy: &'p str,
}

/// Accepted articles and the titles seen so far in this run.
#[derive(Debug)]
pub struct Cascade<'p> {
    profile: &'p SiteProfile,
    normalizer: Normalizer<'p>,
    limit: usize,
    seen_titles: HashSet<String>,
    accepted: Vec<ArticleRecord>,
}

impl<'p> Cascade<'p> {
    pub fn new(profile: &'p SiteProfile, fetched_at: DateTime<Utc>, limit: usize) -> Self {
        Cascade {
            profile,
            normalizer: Normalizer::new(profile, fetched_at),
            limit,
            seen_titles: HashSet::new(),
            accepted: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.accepted.len() >= self.limit
    }

    pub fn has_title(&self, title: &str) -> bool {
        self.seen_titles.contains(title)
    }

    /// Normalize and keep `raw` unless its title was already accepted or
    /// the cap is reached.
    pub fn accept(&mut self, raw: &RawFields) -> bool {
        if self.is_full() {
            return false;
        }
        let record = self.normalizer.record(raw);
        if !self.seen_titles.insert(record.title.clone()) {
            debug!(title = %record.title, "Skipping duplicate title");
            return false;
        }
        debug!(title = %record.title, url = %record.url, "Accepted article");
        self.accepted.push(record);
        true
    }

    /// Walk every container selector over `doc`, stopping once full.
    ///
    /// Returns the number of articles accepted by this pass.
    #[instrument(level = "info", skip_all, fields(limit = self.limit))]
    pub fn scan_containers(&mut self, doc: &Document) -> usize {
        let before = self.accepted.len();
        let profile = self.profile;

        'selectors: for strategy in &profile.containers {
            let containers = doc.select(strategy);
            debug!(selector = %strategy, matched = containers.len(), "Container selector");
            for container in containers {
                if self.is_full() {
                    break 'selectors;
                }
                let candidate = Candidate {
                    container,
                    strategy: strategy.as_str(),
                };
                if let Some(raw) = self.extract(&candidate) {
                    self.accept(&raw);
                }
            }
        }

        let added = self.accepted.len() - before;
        info!(added, total = self.accepted.len(), "Container cascade finished");
        added
    }

    /// Read the fields of one candidate. `None` when it has no headline
    /// link or its title was already taken.
    pub fn extract(&self, candidate: &Candidate<'_, '_>) -> Option<RawFields> {
        let scope = &candidate.container;
        let Some((link, _)) = first_element(scope, &self.profile.headline_links) else {
            debug!(strategy = candidate.strategy, "Container has no headline link");
            return None;
        };

        let title = self.normalizer.title(&link.text());
        if self.has_title(&title) {
            debug!(%title, strategy = candidate.strategy, "Skipping duplicate title");
            return None;
        }

        Some(RawFields {
            title,
            href: link.attr("href").map(str::to_string),
            description: first_value(scope, &self.profile.descriptions),
            timestamp: first_value(scope, &self.profile.timestamps),
            image: first_image_source(scope, &self.profile.images),
        })
    }

    pub fn into_records(self) -> Vec<ArticleRecord> {
        self.accepted
    }
}
