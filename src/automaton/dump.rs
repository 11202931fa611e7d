//! Graph dumping.
//!
//! [`Automaton::dump_graph`](super::Automaton::dump_graph) walks the DAG and
//! reports every transition to a [`GraphDump`] sink. [`DotWriter`] is the
//! bundled sink producing GraphViz dot output; emission failures are
//! swallowed so a broken pipe never takes the caller down.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use hashbrown::HashSet;

/// Sink for the automaton's internal graph structure.
///
/// `add_edge` is called once per transition, in depth-first order from the
/// root. Labels are opaque; callers that need deduplication across repeated
/// invocations must handle it themselves.
pub trait GraphDump {
    /// Called once before the first edge.
    fn start(&mut self);
    /// Reports one labeled edge between two node labels.
    fn add_edge(&mut self, from: &str, to: &str, label: &str);
    /// Called once after the last edge.
    fn done(&mut self);
}

/// [`GraphDump`] implementation writing GraphViz dot syntax.
///
/// Repeated edges are written once. Two nodes may be connected by several
/// edges with distinct labels; those all survive.
pub struct DotWriter<W: Write> {
    sink: W,
    edges: HashSet<(String, String, String)>,
    broken: bool,
}

impl DotWriter<BufWriter<File>> {
    /// Opens `path` for writing and wraps it in a buffered writer.
    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(DotWriter::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> DotWriter<W> {
    /// Wraps an arbitrary sink.
    pub fn new(sink: W) -> Self {
        DotWriter {
            sink,
            edges: HashSet::new(),
            broken: false,
        }
    }

    /// Consumes the writer and hands back the sink.
    pub fn into_inner(self) -> W {
        self.sink
    }

    fn write_line(&mut self, line: &str) {
        if self.broken {
            return;
        }
        if writeln!(self.sink, "{line}").is_err() {
            self.broken = true;
        }
    }
}

impl<W: Write> GraphDump for DotWriter<W> {
    fn start(&mut self) {
        self.edges.clear();
        self.write_line("digraph G {");
    }

    fn add_edge(&mut self, from: &str, to: &str, label: &str) {
        let key = (from.to_owned(), to.to_owned(), label.to_owned());
        if !self.edges.insert(key) {
            return;
        }
        self.write_line(&format!("  \"{from}\" -> \"{to}\" [ label = \"{label}\" ]"));
    }

    fn done(&mut self) {
        self.write_line("}");
        if !self.broken && self.sink.flush().is_err() {
            self.broken = true;
        }
    }
}
