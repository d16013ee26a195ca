//! Capstone log extraction.
//!
//! The log is scanned line by line with a two-state machine: outside any
//! block, lines are ignored; a `--- Capstone #N ---` header opens a block for
//! id `N`, and the next header or a `========== ... ==========` separator
//! closes it. Inside a block, `Center: (x, y)` and `Corner k: (x, y)` lines
//! contribute geometry.

use crate::ir::{Capstone, Point};
use std::collections::HashMap;

const HEADER_OPEN: &str = "--- Capstone #";
const HEADER_CLOSE: &str = " ---";
const SEPARATOR_OPEN: &str = "========== ";
const SEPARATOR_CLOSE: &str = " ==========";
const CENTER_TAG: &str = "Center:";
const CORNER_TAG: &str = "Corner";

/// What a single log line means to the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLine {
    Separator,
    Header(u32),
    /// Well-formed header whose id does not fit a `u32`; closes the open block.
    UnreadableHeader,
    Center(Point),
    Corner { index: u32, point: Point },
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    OutsideBlock,
    InBlock(u32),
}

/// Incremental extractor; feed lines in order, then call [`LogScanner::finish`].
#[derive(Debug)]
pub struct LogScanner {
    state: ScanState,
    records: Vec<Capstone>,
    by_id: HashMap<u32, usize>,
}

impl Default for LogScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl LogScanner {
    pub fn new() -> Self {
        Self {
            state: ScanState::OutsideBlock,
            records: Vec::new(),
            by_id: HashMap::new(),
        }
    }

    pub fn in_block(&self) -> Option<u32> {
        match self.state {
            ScanState::InBlock(id) => Some(id),
            ScanState::OutsideBlock => None,
        }
    }

    pub fn feed_line(&mut self, line: &str) {
        match (self.state, classify_line(line)) {
            (_, LogLine::Separator | LogLine::UnreadableHeader) => {
                self.state = ScanState::OutsideBlock
            }
            (_, LogLine::Header(id)) => {
                if !self.by_id.contains_key(&id) {
                    self.by_id.insert(id, self.records.len());
                    self.records.push(Capstone::new(id));
                }
                self.state = ScanState::InBlock(id);
            }
            (ScanState::OutsideBlock, _) => {}
            (ScanState::InBlock(id), LogLine::Center(point)) => {
                let record = self.record_mut(id);
                if record.center.is_none() {
                    record.center = Some(point);
                }
            }
            (ScanState::InBlock(id), LogLine::Corner { point, .. }) => {
                self.record_mut(id).corners.push(point);
            }
            (ScanState::InBlock(_), LogLine::Other) => {}
        }
    }

    /// Records in order of first appearance, dropping those without geometry.
    pub fn finish(self) -> Vec<Capstone> {
        self.records
            .into_iter()
            .filter(Capstone::has_geometry)
            .collect()
    }

    fn record_mut(&mut self, id: u32) -> &mut Capstone {
        let idx = self.by_id[&id];
        &mut self.records[idx]
    }
}

pub fn parse_capstone_log(input: &str) -> Vec<Capstone> {
    let mut scanner = LogScanner::new();
    for line in input.lines() {
        scanner.feed_line(line);
    }
    scanner.finish()
}

/// Classify a line. Separators win over headers, headers over geometry, and
/// a center line is never also read as a corner.
pub fn classify_line(line: &str) -> LogLine {
    if is_separator(line) {
        return LogLine::Separator;
    }
    if let Some(header) = find_header(line) {
        return header;
    }
    if let Some(point) = find_center(line) {
        return LogLine::Center(point);
    }
    if let Some((index, point)) = find_corner(line) {
        return LogLine::Corner { index, point };
    }
    LogLine::Other
}

fn is_separator(line: &str) -> bool {
    line.match_indices(SEPARATOR_OPEN)
        .any(|(idx, _)| line[idx + SEPARATOR_OPEN.len()..].contains(SEPARATOR_CLOSE))
}

fn find_header(line: &str) -> Option<LogLine> {
    line.match_indices(HEADER_OPEN).find_map(|(idx, _)| {
        let mut cursor = Cursor::new(&line[idx + HEADER_OPEN.len()..]);
        let digits = cursor.digits()?;
        if !cursor.eat(HEADER_CLOSE) {
            return None;
        }
        Some(match digits.parse() {
            Ok(id) => LogLine::Header(id),
            Err(_) => LogLine::UnreadableHeader,
        })
    })
}

fn find_center(line: &str) -> Option<Point> {
    line.match_indices(CENTER_TAG).find_map(|(idx, _)| {
        let preceded_by_word = line[..idx].chars().next_back().is_some_and(is_word_char);
        if preceded_by_word {
            return None;
        }
        let mut cursor = Cursor::new(&line[idx + CENTER_TAG.len()..]);
        cursor.skip_whitespace();
        cursor.point()
    })
}

fn find_corner(line: &str) -> Option<(u32, Point)> {
    line.match_indices(CORNER_TAG).find_map(|(idx, _)| {
        let mut cursor = Cursor::new(&line[idx + CORNER_TAG.len()..]);
        cursor.skip_whitespace();
        let index = cursor.number()?;
        if !cursor.eat(":") {
            return None;
        }
        cursor.skip_whitespace();
        let point = cursor.point()?;
        Some((index, point))
    })
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(rest: &'a str) -> Self {
        Self { rest }
    }

    fn eat(&mut self, token: &str) -> bool {
        match self.rest.strip_prefix(token) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    fn skip_whitespace(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn digits(&mut self) -> Option<&'a str> {
        let end = self
            .rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(self.rest.len());
        if end == 0 {
            return None;
        }
        let (digits, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(digits)
    }

    fn number<T: std::str::FromStr>(&mut self) -> Option<T> {
        self.digits()?.parse().ok()
    }

    /// `(x,<ws>y)` with non-negative integer coordinates.
    fn point(&mut self) -> Option<Point> {
        if !self.eat("(") {
            return None;
        }
        let x = self.number()?;
        if !self.eat(",") {
            return None;
        }
        self.skip_whitespace();
        let y = self.number()?;
        if !self.eat(")") {
            return None;
        }
        Some(Point::new(x, y))
    }
}
