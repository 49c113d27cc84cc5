//! Line-oriented front end that drives a debug tree from text commands.
//!
//! Each mutation is validated as soon as it is applied. Rejected commands leave the tree as it was.

use core::ops::RangeInclusive;
use core::str::{FromStr, SplitWhitespace};

use alloc::string::String;
use alloc::vec::Vec;
use log::debug;

use crate::{Boundary, Emberwood, Mutation, Order, TreeConfig, TreeError};

/// Keys accepted from the console.
pub const KEY_RANGE: RangeInclusive<i64> = 1..=999;

/// Reads an integer key from text.
pub fn parse_key(text: &str) -> Result<i64, TreeError> {
    text.trim()
        .parse()
        .map_err(|_| TreeError::InvalidArgument(format!("invalid input '{text}'")))
}

/// Reads an integer key and checks it against [`KEY_RANGE`].
pub fn parse_bounded_key(text: &str) -> Result<i64, TreeError> {
    let key = parse_key(text)?;
    if !KEY_RANGE.contains(&key) {
        return Err(TreeError::InvalidArgument(format!(
            "integer {key} out of range {}..={}",
            KEY_RANGE.start(),
            KEY_RANGE.end()
        )));
    }

    Ok(key)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Insert(i64),
    Delete(i64),
    Update(i64, String),
    Find(i64),
    Boundary(Boundary),
    Show(Order),
    Check,
    Clear,
    Redraw,
}

fn next_key(words: &mut SplitWhitespace<'_>) -> Result<i64, TreeError> {
    let word = words
        .next()
        .ok_or_else(|| TreeError::InvalidArgument("missing key".into()))?;

    parse_bounded_key(word)
}

impl FromStr for Command {
    type Err = TreeError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words
            .next()
            .ok_or_else(|| TreeError::InvalidArgument("empty command".into()))?
            .to_ascii_lowercase();

        let command = match verb.as_str() {
            "insert" => Command::Insert(next_key(&mut words)?),
            "delete" => Command::Delete(next_key(&mut words)?),
            "find" => Command::Find(next_key(&mut words)?),
            "update" => {
                let key = next_key(&mut words)?;
                let payload = words.by_ref().collect::<Vec<_>>().join(" ");
                Command::Update(key, payload)
            }
            "lowest" | "highest" | "min" | "max" => Command::Boundary(verb.parse()?),
            "show" => Command::Show(
                words
                    .next()
                    .map(str::parse::<Order>)
                    .transpose()?
                    .unwrap_or_default(),
            ),
            "check" => Command::Check,
            "clear" => Command::Clear,
            "redraw" => Command::Redraw,
            other => {
                return Err(TreeError::InvalidArgument(format!(
                    "unknown command '{other}'"
                )));
            }
        };

        if let Some(extra) = words.next() {
            return Err(TreeError::InvalidArgument(format!(
                "unexpected input '{extra}'"
            )));
        }

        Ok(command)
    }
}

#[derive(Debug)]
pub struct Console {
    tree: Emberwood<i64, String>,
}

impl Console {
    /// The console always validates, so `debug` is forced on.
    #[must_use]
    pub fn new(config: TreeConfig) -> Self {
        Self {
            tree: Emberwood::with_config(config.debug(true)),
        }
    }

    #[must_use]
    pub fn tree(&self) -> &Emberwood<i64, String> {
        &self.tree
    }

    pub fn execute(&mut self, command: Command) -> Result<String, TreeError> {
        debug!("console command {command:?}");

        match command {
            Command::Insert(key) => {
                self.tree.insert(key, None)?;
                self.tree.validate(Some(Mutation::Insert))?;
                Ok(self.outline())
            }
            Command::Delete(key) => {
                self.tree.delete(&key)?;
                self.tree.validate(Some(Mutation::Delete))?;
                Ok(self.outline())
            }
            Command::Update(key, payload) => {
                self.tree
                    .update(&key, (!payload.is_empty()).then_some(payload))?;
                self.tree.validate(Some(Mutation::Update))?;
                Ok(format!("updated {key}"))
            }
            Command::Find(key) => {
                let view = self.tree.find(&key)?;
                Ok(format!(
                    "{} {} {}",
                    view.key,
                    view.color,
                    view.payload.map_or("-", String::as_str)
                ))
            }
            Command::Boundary(which) => Ok(self
                .tree
                .boundary(which)
                .map_or_else(|| "(empty)".into(), ToString::to_string)),
            Command::Show(order) => Ok(self.listing(order)),
            Command::Check => {
                self.tree.validate(None)?;
                Ok(format!("ok, {} nodes", self.tree.len()))
            }
            Command::Clear => {
                self.tree.clear();
                Ok(self.outline())
            }
            Command::Redraw => Ok(self.outline()),
        }
    }

    /// `key:depth:color` for every node, in `order`.
    #[must_use]
    pub fn listing(&self, order: Order) -> String {
        self.tree
            .traversal(order)
            .map(|visit| format!("{}:{}:{}", visit.key, visit.depth, visit.color))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Indented pre-order drawing of the tree, one node per line.
    #[must_use]
    pub fn outline(&self) -> String {
        if self.tree.is_empty() {
            return "(empty)".into();
        }

        let mut height = 0;
        self.tree
            .traverse(|visit| height = height.max(visit.depth), Order::InOrder);

        let mut out = format!("{} nodes, height {height}\n", self.tree.len());
        self.tree.traverse(
            |visit| {
                let indent = (visit.depth - 1) * 2;
                out.push_str(&format!("{:indent$}{} {}\n", "", visit.key, visit.color));
            },
            Order::PreOrder,
        );

        out
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new(TreeConfig::default())
    }
}
