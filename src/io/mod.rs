// src/io/mod.rs
pub mod poscar;
pub mod xdatcar;
pub mod xyz;

use std::path::Path;

use crate::error::Result;
use crate::model::Structure;

/// Read an ordered sequence of structures, dispatching on the file name.
///
/// XDATCAR trajectories and (extended-)XYZ dumps may carry many frames;
/// POSCAR/CONTCAR files contribute a single-element sequence. Unknown
/// names fall back to the POSCAR reader, matching VASP convention.
pub fn read_sequence(path: &Path) -> Result<Vec<Structure>> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if name.contains("xdatcar") {
        xdatcar::parse(path)
    } else if name.ends_with(".xyz") {
        xyz::parse(path)
    } else {
        poscar::parse(path).map(|s| vec![s])
    }
}

/// Write one structure as a POSCAR file.
pub fn write_structure(path: &Path, structure: &Structure) -> Result<()> {
    poscar::write(path, structure)
}
