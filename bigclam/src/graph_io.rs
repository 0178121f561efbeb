//! Plain-text graph format.
//!
//! ```text
//! n m k
//! u_1 v_1
//! ...
//! u_m v_m
//! ```
//!
//! Tokens are whitespace separated and may be spread over lines at will;
//! node indices are 0-based and every pair is undirected. Lines
//! starting with `#` or `%` are comments. Files ending in `.gz` are
//! read and written through gzip.

use crate::error::{ClamError, Result};
use crate::graph::Graph;
use log::{info, warn};
use matrix_util::common_io::{mkdir, write_lines, Token, TokenStream};
use std::io::BufRead;

const EDGE_PREALLOC: usize = 1 << 16;

/// Contents of a graph file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphInput {
    pub num_nodes: usize,
    /// Number of communities requested by the file
    pub num_communities: usize,
    pub edges: Vec<(usize, usize)>,
}

impl GraphInput {
    pub fn to_graph(&self) -> Result<Graph> {
        Graph::from_edges(self.num_nodes, self.edges.iter().copied())
    }
}

/// Read a (possibly gzipped) graph file
pub fn read_graph_file(path: &str) -> Result<GraphInput> {
    let tokens = TokenStream::from_file(path).map_err(|e| ClamError::File(e.to_string()))?;
    let input = read_graph_tokens(tokens)?;
    info!(
        "read {}: {} nodes, {} edges, k={}",
        path,
        input.num_nodes,
        input.edges.len(),
        input.num_communities
    );
    Ok(input)
}

/// Read the graph format from any buffered reader
pub fn read_graph<R: BufRead>(reader: R) -> Result<GraphInput> {
    read_graph_tokens(TokenStream::new(reader))
}

fn read_graph_tokens<R: BufRead>(mut tokens: TokenStream<R>) -> Result<GraphInput> {
    let n = next_int(&mut tokens, "number of nodes")?;
    let m = next_int(&mut tokens, "number of edges")?;
    let k = next_int(&mut tokens, "number of communities")?;

    if n <= 0 {
        return Err(ClamError::InvalidGraph(format!(
            "number of nodes must be positive, got {}",
            n
        )));
    }
    if m < 0 {
        return Err(ClamError::InvalidGraph(format!(
            "number of edges must be nonnegative, got {}",
            m
        )));
    }
    if k <= 0 {
        return Err(ClamError::InvalidConfiguration(format!(
            "number of communities must be positive, got {}",
            k
        )));
    }

    // the header is untrusted; grow past this as pairs actually arrive
    let mut edges = Vec::with_capacity((m as usize).min(EDGE_PREALLOC));
    for _ in 0..m {
        let u = next_int(&mut tokens, "edge source")?;
        let v = next_int(&mut tokens, "edge target")?;
        if u < 0 || v < 0 || u >= n || v >= n {
            return Err(ClamError::InvalidGraph(format!(
                "edge ({}, {}) out of range [0, {})",
                u, v, n
            )));
        }
        edges.push((u as usize, v as usize));
    }

    let trailing = tokens.by_ref().take_while(|t| t.is_ok()).count();
    if trailing > 0 {
        warn!("ignoring {} tokens after the last edge", trailing);
    }

    Ok(GraphInput {
        num_nodes: n as usize,
        num_communities: k as usize,
        edges,
    })
}

fn next_int<R: BufRead>(tokens: &mut TokenStream<R>, what: &str) -> Result<i64> {
    let token: Token = match tokens.next() {
        Some(tok) => tok?,
        None => {
            return Err(ClamError::Parse {
                line: tokens.line_no(),
                message: format!("unexpected end of input, expected {}", what),
            })
        }
    };
    token.text.parse::<i64>().map_err(|e| ClamError::Parse {
        line: token.line,
        message: format!("{} '{}': {}", what, token.text, e),
    })
}

/// Write `n m k` followed by one `u v` line per edge
pub fn write_graph_file(path: &str, n: usize, k: usize, edges: &[(usize, usize)]) -> Result<()> {
    let mut lines: Vec<String> = Vec::with_capacity(edges.len() + 1);
    lines.push(format!("{} {} {}", n, edges.len(), k));
    lines.extend(edges.iter().map(|(u, v)| format!("{} {}", u, v)));

    mkdir(path).map_err(|e| ClamError::File(e.to_string()))?;
    write_lines(&lines, path).map_err(|e| ClamError::File(e.to_string()))?;
    info!("wrote {} edges to {}", edges.len(), path);
    Ok(())
}
