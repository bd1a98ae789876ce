// src/io/xdatcar.rs
//
// Multi-frame XDATCAR trajectory reader. Handles the common fixed-cell
// layout (one header, many "Direct configuration=" blocks) and the
// variable-cell layout where the header repeats before every frame.

use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

use crate::error::{Error, Result};
use crate::io::poscar::{parse_f64, parse_vec3};
use crate::model::{Atom, Structure};
use crate::utils::linalg::frac_to_cart;

struct Header {
    comment: String,
    lattice: [[f64; 3]; 3],
    species: Vec<(String, usize)>,
}

fn parse_header(
    first_line: String,
    lines: &mut impl Iterator<Item = io::Result<String>>,
    path: &Path,
) -> Result<Header> {
    let comment = first_line.trim().to_string();

    let scale_line = next(lines, path, "scale")?;
    let scale = parse_f64(scale_line.trim(), path, "scale factor")?;

    let mut lattice = [[0.0; 3]; 3];
    for row in &mut lattice {
        let line = next(lines, path, "lattice vector")?;
        let v = parse_vec3(&line, path, "lattice vector")?;
        *row = [v[0] * scale, v[1] * scale, v[2] * scale];
    }

    let names_line = next(lines, path, "species names")?;
    let counts_line = next(lines, path, "species counts")?;
    let names: Vec<&str> = names_line.trim().split_whitespace().collect();
    let counts: Vec<&str> = counts_line.trim().split_whitespace().collect();
    if names.is_empty() || names.len() != counts.len() {
        return Err(Error::format(path, "species names and counts do not match"));
    }

    let mut species = Vec::with_capacity(names.len());
    for (name, count_tok) in names.iter().zip(&counts) {
        let count: usize = count_tok
            .parse()
            .map_err(|_| Error::format(path, format!("invalid species count: {count_tok:?}")))?;
        species.push((name.to_string(), count));
    }

    Ok(Header {
        comment,
        lattice,
        species,
    })
}

fn next(
    lines: &mut impl Iterator<Item = io::Result<String>>,
    path: &Path,
    what: &str,
) -> Result<String> {
    crate::io::poscar::next_line(lines, path, what)
}

fn read_frame(
    header: &Header,
    frame_no: usize,
    lines: &mut impl Iterator<Item = io::Result<String>>,
    path: &Path,
) -> Result<Structure> {
    let mut atoms = Vec::new();
    for (element, count) in &header.species {
        for _ in 0..*count {
            let line = next(lines, path, "atom position")?;
            let frac = parse_vec3(&line, path, "atom position")?;
            atoms.push(Atom {
                element: element.clone(),
                position: frac_to_cart(frac, &header.lattice),
            });
        }
    }
    Ok(Structure {
        lattice: header.lattice,
        atoms,
        comment: format!("{} frame {}", header.comment, frame_no),
    })
}

/// Read every frame of an XDATCAR trajectory.
pub fn parse(path: &Path) -> Result<Vec<Structure>> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut lines = io::BufReader::new(file).lines();

    let mut frames = Vec::new();
    let mut header: Option<Header> = None;

    loop {
        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => return Err(Error::io(path, e)),
            None => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        if line.trim_start().starts_with("Direct configuration=") {
            let hdr = header
                .as_ref()
                .ok_or_else(|| Error::format(path, "configuration block before header"))?;
            frames.push(read_frame(hdr, frames.len() + 1, &mut lines, path)?);
        } else {
            // Anything else restarts the header block (variable-cell runs)
            header = Some(parse_header(line, &mut lines, path)?);
        }
    }

    Ok(frames)
}
