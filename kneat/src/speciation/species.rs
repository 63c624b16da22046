use crate::genomics::ConnectionGenes;

use serde::{Deserialize, Serialize};

/// Species identifier. Species created by a full
/// speciation are numbered from 0 in seeding order;
/// identifiers stay the same across incremental additions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpeciesID(pub usize);

/// Species are clusters of genetically similar genomes.
///
/// A species does not own its genomes; it lists their
/// positions in the genome slice it was computed from,
/// in increasing order. It does own its centroid, the mean
/// gene set of its members under the active distance metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    id: SpeciesID,
    centroid: ConnectionGenes,
    pub(super) members: Vec<usize>,
}

impl Species {
    /// Creates a species with a single member whose
    /// genes act as the initial centroid.
    pub(super) fn seeded(id: SpeciesID, member: usize, centroid: ConnectionGenes) -> Species {
        Species {
            id,
            centroid,
            members: vec![member],
        }
    }

    /// Returns the species' ID.
    pub fn id(&self) -> SpeciesID {
        self.id
    }

    /// Returns the species' centroid.
    pub fn centroid(&self) -> &ConnectionGenes {
        &self.centroid
    }

    /// Returns the positions of the species' members,
    /// in increasing order.
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    /// Returns the number of members in the species.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if the species has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns `true` if the genome at position `index` belongs to the species.
    pub fn contains(&self, index: usize) -> bool {
        self.members.binary_search(&index).is_ok()
    }

    /// Returns the species with its members replaced by
    /// `members`, keeping its id and centroid. Used to carry
    /// species over into the next generation's genome list.
    pub(crate) fn with_members(&self, members: Vec<usize>) -> Species {
        debug_assert!(members.windows(2).all(|w| w[0] < w[1]));
        Species {
            id: self.id,
            centroid: self.centroid.clone(),
            members,
        }
    }

    pub(super) fn set_centroid(&mut self, centroid: ConnectionGenes) {
        self.centroid = centroid;
    }

    pub(super) fn add_member(&mut self, index: usize) {
        if let Err(position) = self.members.binary_search(&index) {
            self.members.insert(position, index);
        } else {
            debug_assert!(false, "genome {} added twice to species {:?}", index, self.id);
        }
    }

    pub(super) fn remove_member(&mut self, index: usize) {
        match self.members.binary_search(&index) {
            Ok(position) => {
                self.members.remove(position);
            }
            Err(_) => debug_assert!(false, "genome {} not in species {:?}", index, self.id),
        }
    }
}
