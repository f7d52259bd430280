//! Narrow HTML interface used by the listing parser
//!
//! Wraps `scraper` behind four operations: parse a body, select table rows,
//! read a cell's text, read an attribute of an element inside a cell.

use crate::config::SelectorConfig;
use crate::{ConfigError, ConfigResult};
use scraper::{ElementRef, Html, Selector};

/// Compiled selectors locating the bill table
#[derive(Debug, Clone)]
pub struct RowRule {
    rows: Selector,
    columns: Selector,
    link: Selector,
}

impl RowRule {
    /// Compiles a rule from CSS selector strings
    ///
    /// `columns` is matched against each row's direct children only, so cells
    /// of nested tables are never counted.
    pub fn new(rows: &str, columns: &str, link: &str) -> ConfigResult<Self> {
        Ok(Self {
            rows: compile(rows)?,
            columns: compile(columns)?,
            link: compile(link)?,
        })
    }

    pub fn from_config(config: &SelectorConfig) -> ConfigResult<Self> {
        Self::new(&config.rows, &config.columns, &config.link)
    }

    /// Selector for the anchor inside a link cell
    pub fn link(&self) -> &Selector {
        &self.link
    }
}

fn compile(selector: &str) -> ConfigResult<Selector> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// A parsed HTML page
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses a raw response body; invalid UTF-8 is replaced, never rejected
    pub fn parse(body: &[u8]) -> Self {
        Self {
            html: Html::parse_document(&String::from_utf8_lossy(body)),
        }
    }

    /// Rows matched by the rule, each with its matching cells in document order
    pub fn select_rows<'a>(&'a self, rule: &'a RowRule) -> impl Iterator<Item = Row<'a>> + 'a {
        self.html.select(&rule.rows).map(move |row| Row {
            cells: row
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|cell| rule.columns.matches(cell))
                .collect(),
        })
    }
}

/// One table row and its cells
#[derive(Debug, Clone)]
pub struct Row<'a> {
    cells: Vec<ElementRef<'a>>,
}

impl<'a> Row<'a> {
    pub fn cells(&self) -> &[ElementRef<'a>] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Text content of a cell with surrounding whitespace removed
pub fn text_of(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Attribute `name` of the first element under `cell` matching `selector`
/// that carries it
pub fn attr_of(cell: ElementRef<'_>, selector: &Selector, name: &str) -> Option<String> {
    cell.select(selector)
        .find_map(|element| element.value().attr(name))
        .map(str::to_string)
}
