//! Node search: filtering, tiered ranking and the search box session.

use std::cmp::Ordering;

use crate::models::Node;

/// Results shown for a query.
pub const MAX_RESULTS: usize = 10;

/// A press on a result row that travels further than this does not commit.
pub const PRESS_MOVE_THRESHOLD_PX: f64 = 6.0;

/// Ranking tiers, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchRank {
    NameStartsWith,
    DescriptionStartsWith,
    NameContains,
    DescriptionContains,
    NoMatch,
}

/// Lowercase and trim raw input.
pub fn normalize_query(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Every ASCII digit in `s`, in order.
fn digits(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Rank one node against an already normalized query.
pub fn rank(node: &Node, query: &str) -> MatchRank {
    let name = node.name.to_lowercase();
    let description = node.description_text().to_lowercase();
    let query_digits = digits(query);
    let has_digits = !query_digits.is_empty();

    let starts = |text: &str| {
        text.starts_with(query) || (has_digits && digits(text).starts_with(&query_digits))
    };
    let contains =
        |text: &str| text.contains(query) || (has_digits && digits(text).contains(&query_digits));

    if starts(&name) {
        MatchRank::NameStartsWith
    } else if starts(&description) {
        MatchRank::DescriptionStartsWith
    } else if contains(&name) {
        MatchRank::NameContains
    } else if contains(&description) {
        MatchRank::DescriptionContains
    } else {
        MatchRank::NoMatch
    }
}

/// Compare two digit strings by numeric value without parsing.
fn cmp_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Case-insensitive comparison where runs of digits compare by value
/// (`"Dock 9" < "Dock 10"`).
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a = a.chars().peekable();
    let mut b = b.chars().peekable();
    loop {
        match (a.peek().copied(), b.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ca), Some(cb)) if ca.is_ascii_digit() && cb.is_ascii_digit() => {
                let mut run_a = String::new();
                while let Some(c) = a.next_if(|c| c.is_ascii_digit()) {
                    run_a.push(c);
                }
                let mut run_b = String::new();
                while let Some(c) = b.next_if(|c| c.is_ascii_digit()) {
                    run_b.push(c);
                }
                let ord = cmp_numeric(&run_a, &run_b);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(ca), Some(cb)) => {
                let ord = ca.to_lowercase().cmp(cb.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                a.next();
                b.next();
            }
        }
    }
}

/// Tie-break inside a rank: name digits by value, then names, then descriptions.
fn tie_break(a: &Node, b: &Node) -> Ordering {
    let (da, db) = (digits(&a.name), digits(&b.name));
    if !da.is_empty() && !db.is_empty() {
        let ord = cmp_numeric(&da, &db);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    natural_cmp(&a.name, &b.name)
        .then_with(|| natural_cmp(a.description_text(), b.description_text()))
}

/// Indices into `nodes` of the best matches for a normalized query, best first.
pub fn search(nodes: &[Node], query: &str) -> Vec<usize> {
    if query.is_empty() {
        return Vec::new();
    }
    let mut hits: Vec<(usize, MatchRank)> = nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| {
            node.name.to_lowercase().contains(query)
                || node.description_text().to_lowercase().contains(query)
        })
        .map(|(i, node)| (i, rank(node, query)))
        .collect();

    hits.sort_by(|(ia, ra), (ib, rb)| ra.cmp(rb).then_with(|| tie_break(&nodes[*ia], &nodes[*ib])));
    hits.truncate(MAX_RESULTS);
    hits.into_iter().map(|(i, _)| i).collect()
}

/// A run of result text, marked when it matches the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub matched: bool,
}

/// Byte length of `query` matched case-insensitively at the start of `rest`.
fn match_len(rest: &str, query: &str) -> Option<usize> {
    let mut end = 0;
    let mut text = rest.char_indices();
    for qc in query.chars() {
        let (i, tc) = text.next()?;
        if !tc.to_lowercase().eq(qc.to_lowercase()) {
            return None;
        }
        end = i + tc.len_utf8();
    }
    Some(end)
}

/// Split `text` into alternating plain and matched runs.
pub fn highlight_segments(text: &str, query: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    if query.is_empty() {
        if !text.is_empty() {
            segments.push(Segment {
                text: text.to_string(),
                matched: false,
            });
        }
        return segments;
    }

    let mut plain_start = 0;
    let mut i = 0;
    while i < text.len() {
        match match_len(&text[i..], query) {
            Some(len) if len > 0 => {
                if plain_start < i {
                    segments.push(Segment {
                        text: text[plain_start..i].to_string(),
                        matched: false,
                    });
                }
                segments.push(Segment {
                    text: text[i..i + len].to_string(),
                    matched: true,
                });
                i += len;
                plain_start = i;
            }
            _ => {
                i += text[i..].chars().next().map_or(1, char::len_utf8);
            }
        }
    }
    if plain_start < text.len() {
        segments.push(Segment {
            text: text[plain_start..].to_string(),
            matched: false,
        });
    }
    segments
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct RowPress {
    row: usize,
    start: (f64, f64),
    moved: bool,
}

/// What running the search did, so the caller can update highlight/beacon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Empty query: results hidden, highlight and beacon must clear.
    Cleared,
    /// The list is showing; `top` is the pre-selected row's node, if any.
    Results { top: Option<usize> },
}

/// State of the search box and its results list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchSession {
    input: String,
    query: String,
    results: Vec<usize>,
    cursor: Option<usize>,
    list_visible: bool,
    interacting: bool,
    press: Option<RowPress>,
    press_handled: bool,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Normalized query of the last run.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Node indices of the current results.
    pub fn results(&self) -> &[usize] {
        &self.results
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn is_list_visible(&self) -> bool {
        self.list_visible
    }

    /// The list is open but nothing matched.
    pub fn shows_no_results(&self) -> bool {
        self.list_visible && self.results.is_empty()
    }

    pub fn show_clear_button(&self) -> bool {
        !self.input.trim().is_empty()
    }

    /// Record raw input. The host debounces before calling [`Self::run`].
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Whether focusing the input should re-run the current query.
    pub fn should_rerun_on_focus(&self) -> bool {
        !normalize_query(&self.input).is_empty()
    }

    pub fn run(&mut self, nodes: &[Node]) -> SearchOutcome {
        self.query = normalize_query(&self.input);
        if self.query.is_empty() {
            self.results.clear();
            self.cursor = None;
            self.list_visible = false;
            return SearchOutcome::Cleared;
        }
        self.results = search(nodes, &self.query);
        self.cursor = (!self.results.is_empty()).then_some(0);
        self.list_visible = true;
        SearchOutcome::Results {
            top: self.results.first().copied(),
        }
    }

    /// Move the cursor one row, clamped at both ends. Returns the node now under it.
    pub fn move_cursor(&mut self, down: bool) -> Option<usize> {
        if self.results.is_empty() {
            return None;
        }
        let last = self.results.len() - 1;
        let next = match (self.cursor, down) {
            (Some(c), true) => (c + 1).min(last),
            (Some(c), false) => c.saturating_sub(1),
            (None, _) => 0,
        };
        self.cursor = Some(next);
        self.results.get(next).copied()
    }

    /// Node committed by Enter: the cursor row, or the first row.
    pub fn cursor_node(&self) -> Option<usize> {
        self.results.get(self.cursor.unwrap_or(0)).copied()
    }

    /// Pointer entered a row. Returns the node to highlight.
    pub fn hover(&mut self, row: usize) -> Option<usize> {
        let node = self.results.get(row).copied()?;
        self.cursor = Some(row);
        Some(node)
    }

    pub fn node_at(&self, row: usize) -> Option<usize> {
        self.results.get(row).copied()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn hide_list(&mut self) {
        self.list_visible = false;
    }

    /// The blur grace period ran out. Keeps the list open during a row press.
    pub fn blur_elapsed(&mut self) {
        if !self.interacting {
            self.list_visible = false;
        }
    }

    pub fn is_interacting(&self) -> bool {
        self.interacting
    }

    pub fn press_start(&mut self, row: usize, x: f64, y: f64) {
        self.interacting = true;
        self.press_handled = false;
        self.press = Some(RowPress {
            row,
            start: (x, y),
            moved: false,
        });
    }

    pub fn press_move(&mut self, x: f64, y: f64) {
        if let Some(press) = self.press.as_mut() {
            if (x - press.start.0).hypot(y - press.start.1) > PRESS_MOVE_THRESHOLD_PX {
                press.moved = true;
            }
        }
    }

    /// Button released on a row. Returns the node to commit, if the press
    /// stayed still.
    pub fn press_end(&mut self, row: usize) -> Option<usize> {
        self.interacting = false;
        let press = self.press.take()?;
        self.press_handled = true;
        if press.moved || press.row != row {
            return None;
        }
        self.results.get(row).copied()
    }

    pub fn press_leave(&mut self) {
        self.interacting = false;
        self.press = None;
    }

    /// A click on a row. Clicks that close a mouse press were already handled
    /// by [`Self::press_end`]; touch taps arrive here only.
    pub fn row_click(&mut self, row: usize) -> Option<usize> {
        if std::mem::take(&mut self.press_handled) {
            return None;
        }
        self.results.get(row).copied()
    }
}
