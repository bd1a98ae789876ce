// src/engine.rs

use nalgebra::Matrix3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::error::{Error, Result};
use crate::model::Structure;
use crate::utils::linalg::{cart_to_frac, cell_volume, frac_to_cart, lattice_matrix, lattice_rows};

/// Upper bound (inclusive) for the per-rattle integer seed.
const SEED_LIMIT: u64 = 999;

/// Random strain and rattle transforms on crystal structures.
///
/// Strain magnitudes and rattle amplitudes are resampled from a fresh
/// process-wide source on every call, so each generated structure carries
/// an independent perturbation within the configured envelope. There is
/// deliberately no caller-supplied seed.
#[derive(Debug, Clone)]
pub struct PerturbationEngine {
    max_strain: f64,
    max_amplitude: f64,
}

impl PerturbationEngine {
    /// Both bounds must lie in `[0, 1]`.
    pub fn new(max_strain: f64, max_amplitude: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&max_strain) {
            return Err(Error::Config(format!(
                "max_strain must be between 0 and 1, got {max_strain}"
            )));
        }
        if !(0.0..=1.0).contains(&max_amplitude) {
            return Err(Error::Config(format!(
                "max_amplitude must be between 0 and 1, got {max_amplitude}"
            )));
        }
        Ok(Self {
            max_strain,
            max_amplitude,
        })
    }

    /// Draw a 3x3 strain matrix with independent uniform entries in
    /// `[-max_strain, max_strain]`.
    pub fn strain_matrix(&self) -> Matrix3<f64> {
        let mut rng = rand::thread_rng();
        Matrix3::from_fn(|_, _| rng.gen_range(-self.max_strain..=self.max_strain))
    }

    /// Draw a rattle displacement amplitude in `[0, max_amplitude]`.
    pub fn rattle_amplitude(&self) -> f64 {
        rand::thread_rng().gen_range(0.0..=self.max_amplitude)
    }

    /// Apply a strain to the lattice: `L' = L * (I + S)`, with atomic
    /// positions rescaled so fractional coordinates are preserved.
    ///
    /// Fails when the input lattice is singular, since no fractional
    /// coordinates exist to rescale from.
    pub fn deform_cell(&self, structure: &Structure, strain: &Matrix3<f64>) -> Result<Structure> {
        let old_lattice = structure.lattice;
        let deformed = lattice_matrix(&old_lattice) * (Matrix3::identity() + strain);
        let new_lattice = lattice_rows(&deformed);

        let mut out = structure.clone();
        for atom in &mut out.atoms {
            let frac = cart_to_frac(atom.position, &old_lattice).ok_or_else(|| {
                Error::InvalidInput("cannot deform a structure with a singular lattice".into())
            })?;
            atom.position = frac_to_cart(frac, &new_lattice);
        }
        out.lattice = new_lattice;

        log::debug!(
            "deformed cell: volume {:.3} -> {:.3}",
            cell_volume(&old_lattice),
            cell_volume(&new_lattice)
        );
        Ok(out)
    }

    /// Return a copy with every atomic position displaced by Gaussian
    /// noise. The standard deviation is a fresh amplitude sample and the
    /// noise stream is seeded with a fresh integer in `[0, 999]`.
    pub fn rattle(&self, structure: &Structure) -> Result<Structure> {
        let amplitude = self.rattle_amplitude();
        let seed = rand::thread_rng().gen_range(0..=SEED_LIMIT);

        let noise = Normal::new(0.0, amplitude)
            .map_err(|e| Error::Processing(format!("bad displacement amplitude {amplitude}: {e}")))?;
        let mut rng = StdRng::seed_from_u64(seed);

        let mut out = structure.clone();
        for atom in &mut out.atoms {
            for coord in &mut atom.position {
                *coord += noise.sample(&mut rng);
            }
        }
        log::debug!("rattled {} atoms, stdev {amplitude:.4}, seed {seed}", out.num_atoms());
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Atom;
    use nalgebra::matrix;

    fn sample_structure() -> Structure {
        Structure {
            lattice: [[4.0, 0.0, 0.0], [2.0, 3.46, 0.0], [0.0, 0.0, 5.0]],
            atoms: vec![
                Atom {
                    element: "Cu".into(),
                    position: [0.0, 0.0, 0.0],
                },
                Atom {
                    element: "Cu".into(),
                    position: [2.0, 1.73, 2.5],
                },
                Atom {
                    element: "O".into(),
                    position: [1.0, 0.5, 1.0],
                },
            ],
            comment: String::new(),
        }
    }

    #[test]
    fn bounds_are_inclusive() {
        assert!(PerturbationEngine::new(0.0, 0.0).is_ok());
        assert!(PerturbationEngine::new(1.0, 1.0).is_ok());
        assert!(matches!(
            PerturbationEngine::new(-0.01, 0.1),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            PerturbationEngine::new(0.05, 1.5),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn strain_matrix_respects_envelope() {
        let engine = PerturbationEngine::new(0.05, 0.1).unwrap();
        for _ in 0..50 {
            let s = engine.strain_matrix();
            for v in s.iter() {
                assert!(v.abs() <= 0.05);
            }
        }
    }

    #[test]
    fn rattle_amplitude_respects_envelope() {
        let engine = PerturbationEngine::new(0.0, 0.1).unwrap();
        for _ in 0..50 {
            let a = engine.rattle_amplitude();
            assert!((0.0..=0.1).contains(&a));
        }
    }

    #[test]
    fn zero_strain_is_identity() {
        let engine = PerturbationEngine::new(0.05, 0.1).unwrap();
        let s = sample_structure();
        let out = engine.deform_cell(&s, &Matrix3::zeros()).unwrap();

        for i in 0..3 {
            for j in 0..3 {
                assert!((out.lattice[i][j] - s.lattice[i][j]).abs() < 1e-12);
            }
        }
        for (a, b) in s.atoms.iter().zip(out.atoms.iter()) {
            for k in 0..3 {
                assert!((a.position[k] - b.position[k]).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn deform_preserves_atoms_and_species() {
        let engine = PerturbationEngine::new(0.05, 0.1).unwrap();
        let s = sample_structure();
        let strain = matrix![0.02, 0.0, 0.0; 0.0, -0.03, 0.01; 0.0, 0.0, 0.04];
        let out = engine.deform_cell(&s, &strain).unwrap();

        assert_eq!(out.num_atoms(), s.num_atoms());
        for (a, b) in s.atoms.iter().zip(out.atoms.iter()) {
            assert_eq!(a.element, b.element);
        }
        // The diagonal strain must actually change the lattice
        assert!((out.lattice[0][0] - s.lattice[0][0]).abs() > 1e-6);
    }

    #[test]
    fn deform_keeps_fractional_coordinates() {
        let engine = PerturbationEngine::new(0.1, 0.0).unwrap();
        let s = sample_structure();
        let strain = engine.strain_matrix();
        let out = engine.deform_cell(&s, &strain).unwrap();

        for (a, b) in s.atoms.iter().zip(out.atoms.iter()) {
            let fa = crate::utils::linalg::cart_to_frac(a.position, &s.lattice).unwrap();
            let fb = crate::utils::linalg::cart_to_frac(b.position, &out.lattice).unwrap();
            for k in 0..3 {
                assert!((fa[k] - fb[k]).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn deform_rejects_singular_lattice() {
        let engine = PerturbationEngine::new(0.05, 0.1).unwrap();
        let mut s = sample_structure();
        s.lattice = [[1.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]];
        assert!(matches!(
            engine.deform_cell(&s, &Matrix3::zeros()),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn rattle_preserves_cell_and_species() {
        let engine = PerturbationEngine::new(0.0, 0.1).unwrap();
        let s = sample_structure();
        let out = engine.rattle(&s).unwrap();

        assert_eq!(out.lattice, s.lattice);
        assert_eq!(out.num_atoms(), s.num_atoms());
        for (a, b) in s.atoms.iter().zip(out.atoms.iter()) {
            assert_eq!(a.element, b.element);
        }
    }

    #[test]
    fn rattle_displacements_are_statistically_bounded() {
        let engine = PerturbationEngine::new(0.0, 0.1).unwrap();
        let s = sample_structure();

        // Gaussian noise with stdev <= 0.1; across repeated draws the
        // largest per-coordinate excursion should stay far below 10 sigma.
        for _ in 0..20 {
            let out = engine.rattle(&s).unwrap();
            for (a, b) in s.atoms.iter().zip(out.atoms.iter()) {
                for k in 0..3 {
                    assert!((a.position[k] - b.position[k]).abs() < 1.0);
                }
            }
        }
    }

    #[test]
    fn zero_amplitude_rattle_is_identity() {
        let engine = PerturbationEngine::new(0.0, 0.0).unwrap();
        let s = sample_structure();
        let out = engine.rattle(&s).unwrap();
        for (a, b) in s.atoms.iter().zip(out.atoms.iter()) {
            assert_eq!(a.position, b.position);
        }
    }
}
