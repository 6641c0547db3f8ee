// Player model loading: the one asynchronous, fallible operation in
// the whole scene. A worker thread reads and parses a Wavefront OBJ
// and hands the result back over a channel; the frame loop polls it.
// On failure the placeholder cube simply stays, so play is never
// blocked on an asset.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use glam::Vec3;
use thiserror::Error;

use super::mesh::{triangulate_smooth, PolyMesh, RenderMesh};

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error at line {line}: {msg}")]
    Parse { line: usize, msg: String },
    #[error("model has no faces")]
    Empty,
    #[error("loader thread terminated without a result")]
    Aborted,
}

fn parse_err(line: usize, msg: impl Into<String>) -> ModelError {
    ModelError::Parse {
        line,
        msg: msg.into(),
    }
}

// ============================================================================
// OBJ PARSING
// ============================================================================

/// Parse OBJ geometry into a PolyMesh: `v` positions and `f` faces.
/// Normals are recomputed downstream, so `vn`/`vt` (and grouping or
/// material statements) are skipped.
pub fn parse_obj(reader: impl BufRead) -> Result<PolyMesh, ModelError> {
    let mut mesh = PolyMesh::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        let line_no = line_no + 1;

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("v") => {
                let mut axis = || -> Result<f32, ModelError> {
                    parts
                        .next()
                        .ok_or_else(|| parse_err(line_no, "vertex with fewer than 3 coordinates"))?
                        .parse()
                        .map_err(|_| parse_err(line_no, "invalid vertex coordinate"))
                };
                let x = axis()?;
                let y = axis()?;
                let z = axis()?;
                mesh.add_vertex(Vec3::new(x, y, z));
            }
            Some("f") => {
                let mut face = Vec::new();
                for corner in parts {
                    // Corner forms: "i", "i/t", "i/t/n", "i//n".
                    // Only the position index matters here.
                    let pos = corner
                        .split('/')
                        .next()
                        .unwrap_or("")
                        .parse::<usize>()
                        .map_err(|_| parse_err(line_no, "invalid face index"))?;
                    if pos == 0 || pos > mesh.vertex_count() {
                        return Err(parse_err(line_no, "face index out of bounds"));
                    }
                    face.push(pos - 1); // OBJ indices are 1-based
                }
                if face.len() < 3 {
                    return Err(parse_err(line_no, "face with fewer than 3 corners"));
                }
                mesh.add_face(face);
            }
            // vn / vt / o / g / s / usemtl / mtllib
            _ => {}
        }
    }

    if mesh.faces.is_empty() {
        return Err(ModelError::Empty);
    }
    Ok(mesh)
}

/// Read an OBJ file and triangulate it with smooth normals.
pub fn load_obj(path: &PathBuf) -> Result<RenderMesh, ModelError> {
    let file = File::open(path)?;
    let poly = parse_obj(BufReader::new(file))?;
    Ok(triangulate_smooth(&poly))
}

// ============================================================================
// ASYNC LOAD STATE
// ============================================================================

/// Lifecycle of the player model: pending while the worker thread runs,
/// then either loaded (mesh handed to the renderer) or permanently on
/// the placeholder. There is no cancellation and no retry.
pub enum ModelLoad {
    Pending(Receiver<Result<RenderMesh, ModelError>>),
    Loaded,
    Fallback,
}

impl ModelLoad {
    /// Kick off the load on a worker thread and return the pending handle.
    pub fn begin(path: PathBuf) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            // The receiver may have been dropped on shutdown; nothing to do.
            let _ = tx.send(load_obj(&path));
        });
        ModelLoad::Pending(rx)
    }

    /// Poll the worker once. Returns the result exactly once, on the
    /// frame it arrives; afterwards the state is settled and polling
    /// returns `None` forever.
    pub fn poll(&mut self) -> Option<Result<RenderMesh, ModelError>> {
        let ModelLoad::Pending(rx) = self else {
            return None;
        };
        match rx.try_recv() {
            Ok(Ok(mesh)) => {
                *self = ModelLoad::Loaded;
                Some(Ok(mesh))
            }
            Ok(Err(err)) => {
                *self = ModelLoad::Fallback;
                Some(Err(err))
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                *self = ModelLoad::Fallback;
                Some(Err(ModelError::Aborted))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::Duration;

    const TETRA_OBJ: &str = "\
# four corners
v 0 0 0
v 1 0 0
v 0 1 0
v 0 0 1
vn 0 1 0
f 1 3 2
f 1/1 2/1/1 4//1
f 1 4 3
f 2 3 4
";

    #[test]
    fn parses_positions_and_mixed_face_forms() {
        let poly = parse_obj(Cursor::new(TETRA_OBJ)).unwrap();
        assert_eq!(poly.vertex_count(), 4);
        assert_eq!(poly.faces.len(), 4);
        assert_eq!(poly.faces[1], vec![0, 1, 3]);
    }

    #[test]
    fn rejects_bad_coordinates() {
        let err = parse_obj(Cursor::new("v 0 zero 0\n")).unwrap_err();
        assert!(matches!(err, ModelError::Parse { line: 1, .. }));
    }

    #[test]
    fn rejects_out_of_bounds_face_index() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 9\n";
        let err = parse_obj(Cursor::new(src)).unwrap_err();
        assert!(matches!(err, ModelError::Parse { line: 4, .. }));
    }

    #[test]
    fn empty_geometry_is_an_error() {
        assert!(matches!(
            parse_obj(Cursor::new("# nothing\nvn 0 1 0\n")),
            Err(ModelError::Empty)
        ));
    }

    #[test]
    fn missing_file_resolves_to_fallback() {
        let mut load = ModelLoad::begin(PathBuf::from("no/such/model.obj"));
        let result = poll_until_settled(&mut load);
        assert!(matches!(result, Some(Err(ModelError::Io(_)))));
        assert!(matches!(load, ModelLoad::Fallback));
        // Settled states never report again.
        assert!(load.poll().is_none());
    }

    #[test]
    fn good_file_resolves_to_loaded() {
        let path = std::env::temp_dir().join("pine_hollow_loader_test.obj");
        std::fs::write(&path, TETRA_OBJ).unwrap();
        let mut load = ModelLoad::begin(path.clone());
        let result = poll_until_settled(&mut load);
        let mesh = result.unwrap().unwrap();
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.index_count(), 12);
        assert!(matches!(load, ModelLoad::Loaded));
        let _ = std::fs::remove_file(path);
    }

    fn poll_until_settled(load: &mut ModelLoad) -> Option<Result<RenderMesh, ModelError>> {
        for _ in 0..200 {
            if let Some(result) = load.poll() {
                return Some(result);
            }
            thread::sleep(Duration::from_millis(5));
        }
        None
    }
}
