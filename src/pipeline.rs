// src/pipeline.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::PerturbationEngine;
use crate::error::{Error, Result};
use crate::io;
use crate::model::Structure;

/// Validated knobs for one generation run. Immutable once built.
#[derive(Debug, Clone)]
pub struct GenerationParameters {
    pub max_strain: f64,
    pub max_amplitude: f64,
    pub start_id: u64,
    pub rattle_count: u32,
    pub stride: usize,
    pub output_dir: PathBuf,
    /// When true and `rattle_count == 0`, the deformed-but-unrattled
    /// structure is written as well. By default it is computed only as
    /// the base for rattling and never written itself.
    pub write_deformed: bool,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            max_strain: 0.05,
            max_amplitude: 0.1,
            start_id: 1,
            rattle_count: 1,
            stride: 1,
            output_dir: PathBuf::from("./poscars_db"),
            write_deformed: false,
        }
    }
}

impl GenerationParameters {
    /// Range checks beyond what the engine enforces: ids start at 1 and
    /// the stride must be positive (`step_by(0)` is not a selection).
    pub fn validate(&self) -> Result<()> {
        if self.start_id == 0 {
            return Err(Error::Config("start_id must be at least 1".into()));
        }
        if self.stride == 0 {
            return Err(Error::Config("stride must be at least 1".into()));
        }
        Ok(())
    }
}

/// Strides through an input sequence and writes the original plus the
/// perturbed variants of every selected structure, numbering outputs
/// sequentially from `start_id`.
pub struct GenerationPipeline {
    input: PathBuf,
    params: GenerationParameters,
    engine: PerturbationEngine,
}

impl GenerationPipeline {
    pub fn new(input: PathBuf, params: GenerationParameters) -> Result<Self> {
        params.validate()?;
        let engine = PerturbationEngine::new(params.max_strain, params.max_amplitude)?;
        if !input.is_file() {
            return Err(Error::NotFound(input));
        }
        Ok(Self {
            input,
            params,
            engine,
        })
    }

    /// Run the full pipeline. Returns the number of files written.
    pub fn run(&self) -> Result<u64> {
        let frames = io::read_sequence(&self.input)?;
        log::info!(
            "loaded {} frame(s) from {}",
            frames.len(),
            self.input.display()
        );

        fs::create_dir_all(&self.params.output_dir).map_err(|e| Error::OutputDir {
            path: self.params.output_dir.clone(),
            source: e,
        })?;

        let written = self.generate(&frames)?;
        log::info!(
            "processing complete: {} file(s) written to {}",
            written,
            self.params.output_dir.display()
        );
        Ok(written)
    }

    /// Core generation loop, separated from file loading so the striding
    /// and id-assignment logic is testable on in-memory sequences.
    fn generate(&self, frames: &[Structure]) -> Result<u64> {
        let perturbing = self.params.max_strain != 0.0 || self.params.max_amplitude != 0.0;
        let mut next_id = self.params.start_id;

        for frame in frames.iter().step_by(self.params.stride) {
            self.write_output(frame, next_id)?;
            next_id += 1;

            if !perturbing {
                continue;
            }

            // One strain draw per selected structure; every rattle repeat
            // starts from the same deformed base.
            let strain = self.engine.strain_matrix();
            let deformed = self.engine.deform_cell(frame, &strain)?;

            if self.params.write_deformed && self.params.rattle_count == 0 {
                self.write_output(&deformed, next_id)?;
                next_id += 1;
            }

            for _ in 0..self.params.rattle_count {
                let rattled = self.engine.rattle(&deformed)?;
                self.write_output(&rattled, next_id)?;
                next_id += 1;
            }
        }

        Ok(next_id - self.params.start_id)
    }

    fn write_output(&self, structure: &Structure, id: u64) -> Result<()> {
        let path = self.params.output_dir.join(format!("POSCAR-{id}"));
        io::write_structure(&path, structure)?;
        log::debug!("wrote {}", path.display());
        Ok(())
    }
}

/// One-shot adapter: pull a single frame out of a trajectory and write it
/// as a POSCAR. Pure glue over the reader/writer pair.
pub fn extract_frame(trajectory: &Path, index: usize, output: &Path) -> Result<()> {
    if !trajectory.is_file() {
        return Err(Error::NotFound(trajectory.to_path_buf()));
    }
    let frames = io::read_sequence(trajectory)?;
    let frame = frames.get(index).ok_or_else(|| {
        Error::InvalidInput(format!(
            "frame index {index} out of range (trajectory has {} frame(s))",
            frames.len()
        ))
    })?;
    io::write_structure(output, frame)
}
