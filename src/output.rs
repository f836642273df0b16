//! Rendering of catalog results, as plain text or JSON.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use serde::Serialize;
use shelf_catalog::names::{chapter_to_url, display_name};
use shelf_catalog::{Neighbour, Page};
use std::io::Write;

#[derive(Debug, Serialize, PartialEq)]
struct CollectionRow<'a> {
    slug: &'a str,
    title: String,
}

#[derive(Debug, Serialize, PartialEq)]
struct ChapterRow<'a> {
    name: &'a str,
    url: String,
}

#[derive(Debug, Serialize, PartialEq)]
struct PageRow<'a> {
    index: i64,
    name: &'a str,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum NeighbourRow<'a> {
    Chapter { name: &'a str, url: String },
    Collection,
}

/// Writes results to `W`, one item per line or as one JSON document.
pub struct Output<W> {
    writer: W,
    json: bool,
}

impl<W: Write> Output<W> {
    pub fn new(writer: W, json: bool) -> Self {
        Self { writer, json }
    }

    pub fn collections(&mut self, slugs: &[String]) -> Result<()> {
        let rows: Vec<_> = slugs
            .iter()
            .map(|slug| CollectionRow {
                slug,
                title: display_name(slug),
            })
            .collect();
        self.emit(&rows, |row| format!("{}\t{}", row.slug, row.title))
    }

    pub fn chapters(&mut self, chapters: &[String]) -> Result<()> {
        let rows: Vec<_> = chapters
            .iter()
            .map(|name| ChapterRow {
                name,
                url: chapter_to_url(name),
            })
            .collect();
        self.emit(&rows, |row| row.name.to_string())
    }

    pub fn pages(&mut self, pages: &[Page]) -> Result<()> {
        let rows: Vec<_> = pages
            .iter()
            .map(|page| PageRow {
                index: page.index,
                name: &page.name,
            })
            .collect();
        self.emit(&rows, |row| format!("{}\t{}", row.index, row.name))
    }

    pub fn neighbour(&mut self, neighbour: &Neighbour) -> Result<()> {
        let row = match neighbour {
            Neighbour::Chapter(name) => NeighbourRow::Chapter {
                name,
                url: chapter_to_url(name),
            },
            Neighbour::Collection => NeighbourRow::Collection,
        };
        if self.json {
            return self.json(&row);
        }
        let line = match row {
            NeighbourRow::Chapter { name, .. } => name.to_string(),
            NeighbourRow::Collection => "(collection)".to_string(),
        };
        self.line(&line)
    }

    fn emit<T: Serialize>(&mut self, rows: &[T], text: impl Fn(&T) -> String) -> Result<()> {
        if self.json {
            return self.json(&rows);
        }
        for row in rows {
            self.line(&text(row))?;
        }
        Ok(())
    }

    fn json(&mut self, value: &impl Serialize) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, value).or_raise(|| ErrorKind::Output)?;
        self.line("")
    }

    fn line(&mut self, line: &str) -> Result<()> {
        writeln!(self.writer, "{line}").or_raise(|| ErrorKind::Output)
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.writer
    }
}
