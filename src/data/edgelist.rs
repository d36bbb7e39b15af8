//! Text edge-list parsing

use crate::error::{InputFault, Result};
use crate::graph::GraphKind;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One edge as read from the input, before any renumbering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawEdge {
    pub src: u64,
    pub dst: u64,
    pub weight: Option<f64>,
}

/// Edges of a graph with their weight interpretation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EdgeList {
    pub kind: GraphKind,
    pub edges: Vec<RawEdge>,
}

impl EdgeList {
    pub fn new(kind: GraphKind) -> Self {
        Self {
            kind,
            edges: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Largest node label, if any edge exists
    pub fn max_label(&self) -> Option<u64> {
        self.edges.iter().map(|e| e.src.max(e.dst)).max()
    }
}

/// Load an edge list from a file
pub fn load_edge_list(path: impl AsRef<Path>, kind: GraphKind) -> Result<EdgeList> {
    let path = path.as_ref();
    log::info!("Reading edge list: {}", path.display());

    let file = File::open(path)?;
    let edges = read_edge_list(BufReader::new(file), kind)?;

    log::info!("Loaded {} edges", edges.len());
    Ok(edges)
}

/// Parse `src dst` or `src dst weight` lines
///
/// Blank lines and lines starting with `#` or `%` are skipped. Unweighted
/// input must not carry a weight column.
pub fn read_edge_list<R: BufRead>(reader: R, kind: GraphKind) -> Result<EdgeList> {
    let mut list = EdgeList::new(kind);

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('%') {
            continue;
        }

        let mut fields = trimmed.split_whitespace();
        let src = parse_node(fields.next(), line_no)?;
        let dst = parse_node(fields.next(), line_no)?;

        let weight = match (kind, fields.next()) {
            (_, None) => None,
            (GraphKind::Weighted, Some(field)) => Some(field.parse::<f64>().map_err(|_| {
                InputFault::Parse {
                    line: line_no,
                    reason: format!("invalid weight '{}'", field),
                }
            })?),
            (GraphKind::Unweighted, Some(field)) => {
                return Err(InputFault::Parse {
                    line: line_no,
                    reason: format!("unexpected weight '{}' in an unweighted graph", field),
                }
                .into())
            }
        };

        if let Some(extra) = fields.next() {
            return Err(InputFault::Parse {
                line: line_no,
                reason: format!("unexpected trailing field '{}'", extra),
            }
            .into());
        }

        list.edges.push(RawEdge { src, dst, weight });
    }

    Ok(list)
}

fn parse_node(field: Option<&str>, line: usize) -> Result<u64> {
    let field = field.ok_or_else(|| InputFault::Parse {
        line,
        reason: "expected two node ids".to_string(),
    })?;
    field.parse::<u64>().map_err(|_| {
        InputFault::Parse {
            line,
            reason: format!("invalid node id '{}'", field),
        }
        .into()
    })
}
