use std::path::{Path, PathBuf};

use crate::{
    board::Board,
    export::{self, Exporter},
};

/// Writes the whole board as a TOML document.
#[derive(Debug, Clone)]
pub struct DocumentWriter {
    path: PathBuf,
}

impl DocumentWriter {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Exporter for DocumentWriter {
    fn export_board(&mut self, board: &Board) -> Result<(), export::Error> {
        let text = board
            .to_toml()
            .map_err(|err| export::Error::Render(err.to_string()))?;
        export::write_text(&self.path, &text)
    }
}

#[cfg(test)]
mod tests {
    use plotlines_core::graph::Graph;

    use super::*;

    #[test]
    fn test_written_document_reloads() {
        let mut graph = Graph::new();
        let a = graph.add_node().set_label("start").uid().clone();
        let b = graph.add_node().set_label("end").uid().clone();
        graph.connect(&a, &b, &[], None).unwrap();
        let board = Board::new(graph, "Saved");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.toml");
        DocumentWriter::new(&path).export_board(&board).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let loaded = Board::from_toml(&text).unwrap();
        assert_eq!(loaded.title(), "Saved");
        assert_eq!(loaded.graph().node_count(), 2);
        assert_eq!(loaded.initial(), vec![a]);
        assert_eq!(loaded.terminal(), vec![b]);
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("board.toml");
        let board = Board::new(Graph::new(), "Empty");
        let err = DocumentWriter::new(path).export_board(&board).unwrap_err();
        assert!(matches!(err, export::Error::Io(_)));
    }
}
