//! Reader pages and navigation

use serde::Serialize;

use super::schema::Section;

/// One page of the magazine reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagazinePage {
    Editorial,
    Section(Section),
}

/// Reader pages in reading order
pub const PAGES: [MagazinePage; 11] = [
    MagazinePage::Editorial,
    MagazinePage::Section(Section::CreativeWriting),
    MagazinePage::Section(Section::Articles),
    MagazinePage::Section(Section::ArtGallery),
    MagazinePage::Section(Section::Opinions),
    MagazinePage::Section(Section::ClassHighlights),
    MagazinePage::Section(Section::FunZone),
    MagazinePage::Section(Section::LanguageCorner),
    MagazinePage::Section(Section::Inspirational),
    MagazinePage::Section(Section::SpecialFeatures),
    MagazinePage::Section(Section::MediaGallery),
];

impl MagazinePage {
    pub fn at(index: usize) -> Option<MagazinePage> {
        PAGES.get(index).copied()
    }

    pub fn key(&self) -> &'static str {
        match self {
            MagazinePage::Editorial => "editorial",
            MagazinePage::Section(section) => section.key(),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            MagazinePage::Editorial => "Editorial",
            MagazinePage::Section(section) => section.schema().page_title,
        }
    }
}

/// Entry of the reader's table of contents
#[derive(Debug, Clone, Serialize)]
pub struct PageEntry {
    pub index: usize,
    pub key: &'static str,
    pub title: &'static str,
}

/// Table of contents for the reader menu
pub fn table_of_contents() -> Vec<PageEntry> {
    PAGES
        .iter()
        .enumerate()
        .map(|(index, page)| PageEntry {
            index,
            key: page.key(),
            title: page.title(),
        })
        .collect()
}

/// Position of the reader within the page list.
///
/// Moves saturate at both ends; there is no wraparound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PageCursor {
    index: usize,
}

impl PageCursor {
    pub const LAST: usize = PAGES.len() - 1;

    pub fn new() -> Self {
        Self::default()
    }

    /// Cursor placed on `index`, if it names a page
    pub fn at(index: usize) -> Option<Self> {
        (index <= Self::LAST).then_some(Self { index })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn page(&self) -> MagazinePage {
        PAGES[self.index]
    }

    pub fn next(&mut self) {
        self.index = (self.index + 1).min(Self::LAST);
    }

    pub fn previous(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    /// Jump straight to a page. Out-of-range targets leave the cursor as is.
    pub fn jump_to(&mut self, index: usize) -> bool {
        match Self::at(index) {
            Some(cursor) => {
                *self = cursor;
                true
            }
            None => false,
        }
    }

    /// Back to the first page, as when returning to the cover
    pub fn reset(&mut self) {
        self.index = 0;
    }

    pub fn has_previous(&self) -> bool {
        self.index > 0
    }

    pub fn has_next(&self) -> bool {
        self.index < Self::LAST
    }
}

/// Where a page sits in the magazine, for prev/next controls
#[derive(Debug, Clone, Serialize)]
pub struct PagePosition {
    pub index: usize,
    pub total: usize,
    pub previous: Option<usize>,
    pub next: Option<usize>,
}

impl From<PageCursor> for PagePosition {
    fn from(cursor: PageCursor) -> Self {
        let mut prev = cursor;
        prev.previous();
        let mut next = cursor;
        next.next();
        Self {
            index: cursor.index(),
            total: PAGES.len(),
            previous: cursor.has_previous().then_some(prev.index()),
            next: cursor.has_next().then_some(next.index()),
        }
    }
}
