// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The stored program.
//!
//! Lines are kept in explicit order and inserted by 1-based
//! index.  A line may begin with `name:` or `name(a b):`, which
//! makes it callable as a procedure; the label and parameter
//! list are split off at entry and the stored text is just the
//! commands.  Each line also owns the iteration counters for any
//! `loop`/`loopq` sites it contains, keyed by the byte offset of
//! the verb so edits to other lines cannot disturb them.

use crate::result::{Error, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;

#[derive(Clone, Debug)]
pub struct Line {
    pub id: u64,
    pub label: Option<String>,
    pub params: Vec<String>,
    pub text: Rc<str>,
    pub counters: HashMap<usize, u64>,
}

impl Line {
    /// The textual form `list` shows and `save` writes.
    pub fn render(&self) -> String {
        match &self.label {
            None => self.text.to_string(),
            Some(name) if self.params.is_empty() => {
                format!("{name}: {}", self.text)
            }
            Some(name) => {
                format!("{name}({}): {}", self.params.join(" "), self.text)
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct Program {
    lines: Vec<Line>,
    next_id: u64,
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Splits an optional `name:` / `name(params):` prefix off a raw
/// line.  Returns the label, parameters, and remaining text.
fn split_label(raw: &str) -> Result<(Option<String>, Vec<String>, &str)> {
    let raw = raw.trim_start();
    let head_len = raw
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
        .count();
    if head_len == 0 || !is_ident(&raw[..head_len]) {
        return Ok((None, Vec::new(), raw));
    }
    let name = &raw[..head_len];
    let rest = &raw[head_len..];
    if let Some(text) = rest.strip_prefix(':') {
        return Ok((Some(name.to_string()), Vec::new(), text.trim_start()));
    }
    let Some(after_paren) = rest.strip_prefix('(') else {
        return Ok((None, Vec::new(), raw));
    };
    let Some(close) = after_paren.find(')') else {
        return Ok((None, Vec::new(), raw));
    };
    let Some(text) = after_paren[close + 1..].strip_prefix(':') else {
        return Ok((None, Vec::new(), raw));
    };
    let params: Vec<String> = after_paren[..close]
        .split_ascii_whitespace()
        .map(str::to_string)
        .collect();
    if !params.iter().all(|p| is_ident(p)) {
        return Err(Error::Syntax("Invalid parameter list"));
    }
    Ok((Some(name.to_string()), params, text.trim_start()))
}

impl Program {
    fn make_line(&mut self, raw: &str) -> Result<Line> {
        let (label, params, text) = split_label(raw)?;
        let id = self.next_id;
        self.next_id += 1;
        Ok(Line {
            id,
            label,
            params,
            text: Rc::from(text),
            counters: HashMap::new(),
        })
    }

    /// Inserts before the `at`-th line (1-based); past the end
    /// appends.
    pub fn insert(&mut self, at: usize, raw: &str) -> Result<()> {
        let line = self.make_line(raw)?;
        let idx = at.saturating_sub(1).min(self.lines.len());
        self.lines.insert(idx, line);
        Ok(())
    }

    pub fn append(&mut self, raw: &str) -> Result<()> {
        let line = self.make_line(raw)?;
        self.lines.push(line);
        Ok(())
    }

    pub fn delete(&mut self, n: usize) -> Result<()> {
        if n == 0 || n > self.lines.len() {
            return Err(Error::Bounds("Invalid line number"));
        }
        self.lines.remove(n - 1);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Line> {
        self.lines.get(idx)
    }

    pub fn find_label(&self, name: &str) -> Option<&Line> {
        self.lines.iter().find(|l| l.label.as_deref() == Some(name))
    }

    pub fn index_of(&self, id: u64) -> Option<usize> {
        self.lines.iter().position(|l| l.id == id)
    }

    pub fn by_id(&self, id: u64) -> Option<&Line> {
        self.lines.iter().find(|l| l.id == id)
    }

    /// The line after `id` in program order, if any.
    pub fn next_after(&self, id: u64) -> Option<&Line> {
        let idx = self.index_of(id)?;
        self.lines.get(idx + 1)
    }

    /// The `loop`/`loopq` iteration counter at a verb site.
    pub fn counter_mut(&mut self, id: u64, pos: usize) -> Option<&mut u64> {
        let line = self.lines.iter_mut().find(|l| l.id == id)?;
        Some(line.counters.entry(pos).or_insert(0))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(&line.render());
            out.push('\n');
        }
        fs::write(path, out)?;
        Ok(())
    }

    /// Clears the store and reads `path`, one line per program
    /// line.  LF and CRLF both accepted; the file is 8-bit text,
    /// so stray non-UTF-8 bytes are replaced rather than fatal.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        let bytes = fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes);
        self.clear();
        self.merge_text(&text)
    }

    /// Appends the lines of `text` without clearing first.
    pub fn merge_text(&mut self, text: &str) -> Result<()> {
        for raw in text.lines() {
            self.append(raw.trim_end_matches('\r'))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_and_params() {
        let mut p = Program::default();
        p.append("add(a b): p a+b").unwrap();
        p.append("p 1").unwrap();
        p.append("done: end").unwrap();
        let add = p.find_label("add").unwrap();
        assert_eq!(add.params, vec!["a", "b"]);
        assert_eq!(&*add.text, "p a+b");
        let done = p.find_label("done").unwrap();
        assert!(done.params.is_empty());
        assert_eq!(&*done.text, "end");
        assert!(p.get(1).unwrap().label.is_none());
    }

    #[test]
    fn not_a_label() {
        let mut p = Program::default();
        p.append("echo hi: there").unwrap();
        assert!(p.get(0).unwrap().label.is_none());
        assert_eq!(&*p.get(0).unwrap().text, "echo hi: there");
    }

    #[test]
    fn insert_is_one_based_and_clamps() {
        let mut p = Program::default();
        p.insert(1, "p 1").unwrap();
        p.insert(1, "p 0").unwrap();
        p.insert(99, "p 2").unwrap();
        let texts: Vec<_> =
            (0..p.len()).map(|i| p.get(i).unwrap().text.to_string()).collect();
        assert_eq!(texts, ["p 0", "p 1", "p 2"]);
    }

    #[test]
    fn delete_bounds() {
        let mut p = Program::default();
        p.append("p 1").unwrap();
        assert!(p.delete(0).is_err());
        assert!(p.delete(2).is_err());
        p.delete(1).unwrap();
        assert!(p.is_empty());
    }

    #[test]
    fn save_load_round_trip() {
        let mut p = Program::default();
        p.append("add(a b): p a+b").unwrap();
        p.append("init: drive 0").unwrap();
        p.append("! just a comment").unwrap();
        p.append("p 42").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prog.dd");
        p.save(&path).unwrap();

        let mut q = Program::default();
        q.load(&path).unwrap();
        assert_eq!(q.len(), 4);
        for i in 0..p.len() {
            assert_eq!(p.get(i).unwrap().render(), q.get(i).unwrap().render());
        }
        assert_eq!(q.find_label("add").unwrap().params, vec!["a", "b"]);
    }

    #[test]
    fn counters_are_per_site() {
        let mut p = Program::default();
        p.append("pn 1; l 3").unwrap();
        let id = p.get(0).unwrap().id;
        *p.counter_mut(id, 6).unwrap() += 1;
        *p.counter_mut(id, 6).unwrap() += 1;
        assert_eq!(*p.counter_mut(id, 6).unwrap(), 2);
        assert_eq!(*p.counter_mut(id, 0).unwrap(), 0);
    }
}
