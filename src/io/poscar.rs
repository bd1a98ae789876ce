// src/io/poscar.rs

use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{Atom, Structure};
use crate::utils::linalg::{cart_to_frac, frac_to_cart};

pub(crate) fn parse_f64(tok: &str, path: &Path, what: &str) -> Result<f64> {
    tok.parse::<f64>()
        .map_err(|_| Error::format(path, format!("invalid {what}: {tok:?}")))
}

pub(crate) fn parse_vec3(line: &str, path: &Path, what: &str) -> Result<[f64; 3]> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 3 {
        return Err(Error::format(path, format!("short {what} line: {line:?}")));
    }
    Ok([
        parse_f64(parts[0], path, what)?,
        parse_f64(parts[1], path, what)?,
        parse_f64(parts[2], path, what)?,
    ])
}

pub(crate) fn next_line(
    lines: &mut impl Iterator<Item = io::Result<String>>,
    path: &Path,
    what: &str,
) -> Result<String> {
    match lines.next() {
        Some(Ok(line)) => Ok(line),
        Some(Err(e)) => Err(Error::io(path, e)),
        None => Err(Error::format(path, format!("unexpected EOF, missing {what}"))),
    }
}

/// Parse a single-frame POSCAR/CONTCAR file. Positions are stored
/// Cartesian internally regardless of the file's coordinate mode.
pub fn parse(path: &Path) -> Result<Structure> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut lines = io::BufReader::new(file).lines();

    let comment = next_line(&mut lines, path, "title")?.trim().to_string();

    let scale_line = next_line(&mut lines, path, "scale")?;
    let scale = parse_f64(scale_line.trim(), path, "scale factor")?;

    let mut lattice = [[0.0; 3]; 3];
    for row in &mut lattice {
        let line = next_line(&mut lines, path, "lattice vector")?;
        let v = parse_vec3(&line, path, "lattice vector")?;
        *row = [v[0] * scale, v[1] * scale, v[2] * scale];
    }

    // VASP 5 format has a species-name line before the counts; VASP 4
    // files go straight to the counts.
    let line6 = next_line(&mut lines, path, "species")?;
    let (names_line, counts_line) = if line6
        .trim()
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic())
    {
        (line6, next_line(&mut lines, path, "species counts")?)
    } else {
        ("Xx".to_string(), line6)
    };

    let names: Vec<&str> = names_line.trim().split_whitespace().collect();
    let mut counts = Vec::new();
    for tok in counts_line.trim().split_whitespace() {
        let n: usize = tok
            .parse()
            .map_err(|_| Error::format(path, format!("invalid species count: {tok:?}")))?;
        counts.push(n);
    }

    // An optional "Selective dynamics" line precedes the coordinate mode
    let mut mode_line = next_line(&mut lines, path, "coordinate mode")?;
    if mode_line.trim().to_lowercase().starts_with('s') {
        mode_line = next_line(&mut lines, path, "coordinate mode")?;
    }
    let mode = mode_line.trim().to_lowercase();
    let is_cartesian = mode.starts_with('c') || mode.starts_with('k');

    let mut atoms = Vec::new();
    for (idx, &count) in counts.iter().enumerate() {
        let element = names.get(idx).copied().unwrap_or("X").to_string();
        for _ in 0..count {
            let line = next_line(&mut lines, path, "atom position")?;
            let raw = parse_vec3(&line, path, "atom position")?;
            let position = if is_cartesian {
                [raw[0] * scale, raw[1] * scale, raw[2] * scale]
            } else {
                frac_to_cart(raw, &lattice)
            };
            atoms.push(Atom {
                element: element.clone(),
                position,
            });
        }
    }

    Ok(Structure {
        lattice,
        atoms,
        comment,
    })
}

/// Write a structure as a POSCAR in direct (fractional) coordinates,
/// atoms sorted and grouped by species.
pub fn write(path: &Path, structure: &Structure) -> Result<()> {
    let mut out = Vec::new();
    write_body(&mut out, structure)?;
    std::fs::write(path, out).map_err(|e| Error::io(path, e))
}

fn write_body(out: &mut Vec<u8>, structure: &Structure) -> Result<()> {
    let title = if structure.comment.is_empty() {
        "Generated by strucgen"
    } else {
        structure.comment.as_str()
    };
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "1.0");

    for vec in &structure.lattice {
        let _ = writeln!(out, " {:12.8} {:12.8} {:12.8}", vec[0], vec[1], vec[2]);
    }

    let (sorted, counts) = structure.species_groups();

    for (label, _) in &counts {
        let _ = write!(out, " {label:<4}");
    }
    let _ = writeln!(out);
    for (_, count) in &counts {
        let _ = write!(out, " {count:<4}");
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Direct");
    for atom in &sorted {
        let frac = cart_to_frac(atom.position, &structure.lattice).ok_or_else(|| {
            Error::InvalidInput("cannot write POSCAR for a singular lattice".into())
        })?;
        let _ = writeln!(out, " {:12.8} {:12.8} {:12.8}", frac[0], frac[1], frac[2]);
    }
    Ok(())
}
