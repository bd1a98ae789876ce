// src/io/xyz.rs

use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

use crate::error::{Error, Result};
use crate::io::poscar::parse_f64;
use crate::model::{Atom, Structure};

// Dump files without lattice metadata get a large vacuum box
const FALLBACK_BOX: f64 = 20.0;

/// Extract a 3x3 lattice from an extended-XYZ comment line of the form
/// `Lattice="ax ay az bx by bz cx cy cz"`.
fn lattice_from_comment(comment: &str) -> Option<[[f64; 3]; 3]> {
    let start = comment.find("Lattice=\"")?;
    let rest = &comment[start + 9..];
    let end = rest.find('"')?;
    let parts: Vec<f64> = rest[..end]
        .split_whitespace()
        .filter_map(|s| s.parse().ok())
        .collect();
    if parts.len() != 9 {
        return None;
    }
    Some([
        [parts[0], parts[1], parts[2]],
        [parts[3], parts[4], parts[5]],
        [parts[6], parts[7], parts[8]],
    ])
}

/// Read every frame of an (extended-)XYZ trajectory. Positions in XYZ
/// files are already Cartesian.
pub fn parse(path: &Path) -> Result<Vec<Structure>> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut lines = io::BufReader::new(file).lines();

    let mut frames = Vec::new();
    loop {
        // Atom-count line; blank lines between frames are tolerated
        let count_line = loop {
            match lines.next() {
                Some(Ok(line)) if line.trim().is_empty() => continue,
                Some(Ok(line)) => break line,
                Some(Err(e)) => return Err(Error::io(path, e)),
                None => return Ok(frames),
            }
        };
        let n_atoms: usize = count_line
            .trim()
            .parse()
            .map_err(|_| Error::format(path, format!("invalid atom count: {count_line:?}")))?;

        let comment = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => return Err(Error::io(path, e)),
            None => return Err(Error::format(path, "truncated frame, missing comment line")),
        };
        let lattice = lattice_from_comment(&comment).unwrap_or([
            [FALLBACK_BOX, 0.0, 0.0],
            [0.0, FALLBACK_BOX, 0.0],
            [0.0, 0.0, FALLBACK_BOX],
        ]);

        let mut atoms = Vec::with_capacity(n_atoms);
        for _ in 0..n_atoms {
            let line = match lines.next() {
                Some(Ok(line)) => line,
                Some(Err(e)) => return Err(Error::io(path, e)),
                None => return Err(Error::format(path, "truncated frame, missing atom line")),
            };
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 4 {
                return Err(Error::format(path, format!("short atom line: {line:?}")));
            }
            atoms.push(Atom {
                element: parts[0].to_string(),
                position: [
                    parse_f64(parts[1], path, "x coordinate")?,
                    parse_f64(parts[2], path, "y coordinate")?,
                    parse_f64(parts[3], path, "z coordinate")?,
                ],
            });
        }

        frames.push(Structure {
            lattice,
            atoms,
            comment: format!("xyz frame {}", frames.len() + 1),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parses_extxyz_trajectory() {
        let text = "\
2
Lattice=\"6.0 0.0 0.0 0.0 6.0 0.0 0.0 0.0 6.0\" Properties=species:S:1:pos:R:3
Cu 0.0 0.0 0.0
O 3.0 3.0 3.0
2
Lattice=\"6.0 0.0 0.0 0.0 6.0 0.0 0.0 0.0 6.0\" Properties=species:S:1:pos:R:3
Cu 0.1 0.0 0.0
O 3.1 3.0 3.0
";
        let dir = tempdir().unwrap();
        let path = dir.path().join("dump.xyz");
        std::fs::write(&path, text).unwrap();

        let frames = parse(&path).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].num_atoms(), 2);
        assert!((frames[0].lattice[1][1] - 6.0).abs() < 1e-10);
        assert!((frames[1].atoms[0].position[0] - 0.1).abs() < 1e-10);
    }

    #[test]
    fn plain_xyz_gets_fallback_box() {
        let text = "1\nno lattice here\nSi 1.0 2.0 3.0\n";
        let dir = tempdir().unwrap();
        let path = dir.path().join("frame.xyz");
        std::fs::write(&path, text).unwrap();

        let frames = parse(&path).unwrap();
        assert_eq!(frames.len(), 1);
        assert!((frames[0].lattice[0][0] - FALLBACK_BOX).abs() < 1e-10);
    }

    #[test]
    fn truncated_frame_is_an_error() {
        let text = "3\ncomment\nSi 1.0 2.0 3.0\n";
        let dir = tempdir().unwrap();
        let path = dir.path().join("frame.xyz");
        std::fs::write(&path, text).unwrap();
        assert!(matches!(parse(&path), Err(Error::Format { .. })));
    }
}
