use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Atom {
    pub element: String,
    /// Cartesian position in Angstroms.
    pub position: [f64; 3],
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Structure {
    // Lattice vectors as rows: [a_vec, b_vec, c_vec]
    pub lattice: [[f64; 3]; 3],
    pub atoms: Vec<Atom>,
    // Free-form title carried through to the POSCAR header
    #[serde(default)]
    pub comment: String,
}

impl Structure {
    pub fn num_atoms(&self) -> usize {
        self.atoms.len()
    }

    /// Atoms grouped by element in a stable order, plus the per-element
    /// counts in the layout the POSCAR species header wants.
    pub fn species_groups(&self) -> (Vec<Atom>, Vec<(String, usize)>) {
        let mut sorted = self.atoms.clone();
        sorted.sort_by(|a, b| a.element.cmp(&b.element));

        let mut counts: Vec<(String, usize)> = Vec::new();
        for atom in &sorted {
            match counts.last_mut() {
                Some((el, n)) if *el == atom.element => *n += 1,
                _ => counts.push((atom.element.clone(), 1)),
            }
        }
        (sorted, counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_species() -> Structure {
        Structure {
            lattice: [[4.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 4.0]],
            atoms: vec![
                Atom {
                    element: "O".into(),
                    position: [0.0, 0.0, 0.0],
                },
                Atom {
                    element: "Cu".into(),
                    position: [2.0, 2.0, 2.0],
                },
                Atom {
                    element: "O".into(),
                    position: [1.0, 1.0, 1.0],
                },
            ],
            comment: "test cell".into(),
        }
    }

    #[test]
    fn species_groups_sorts_and_counts() {
        let (sorted, counts) = two_species().species_groups();
        assert_eq!(counts, vec![("Cu".to_string(), 1), ("O".to_string(), 2)]);
        assert_eq!(sorted[0].element, "Cu");
        // Stable sort keeps the original O ordering
        assert_eq!(sorted[1].position, [0.0, 0.0, 0.0]);
        assert_eq!(sorted[2].position, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn serde_roundtrip() {
        let s = two_species();
        let json = serde_json::to_string(&s).unwrap();
        let back: Structure = serde_json::from_str(&json).unwrap();
        assert_eq!(back.num_atoms(), 3);
        assert_eq!(back.lattice, s.lattice);
        assert_eq!(back.comment, "test cell");
    }
}
