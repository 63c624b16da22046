use super::GeneValidityError;
use crate::Innovation;

use serde::{Deserialize, Serialize};

use std::fmt;
use std::slice;

/// Connection genes are the principal components of genomes.
/// They are created between two nodes, and become
/// network connections in the genome's phenotype.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct ConnectionGene {
    innovation: Innovation,
    source: Innovation,
    target: Innovation,
    weight: f64,
    enabled: bool,
}

impl ConnectionGene {
    /// Returns a new _enabled_ gene with the specified parameters.
    ///
    /// # Examples
    /// ```
    /// use kneat::genomics::ConnectionGene;
    ///
    /// let gene = ConnectionGene::new(42, 3, 9, 2.0);
    /// assert!(gene.enabled());
    /// ```
    pub fn new(
        innovation: Innovation,
        source: Innovation,
        target: Innovation,
        weight: f64,
    ) -> ConnectionGene {
        ConnectionGene {
            innovation,
            source,
            target,
            weight,
            enabled: true,
        }
    }

    /// Returns the gene's innovation number.
    ///
    /// # Examples
    /// ```
    /// use kneat::genomics::ConnectionGene;
    ///
    /// let gene = ConnectionGene::new(42, 3, 9, 2.0);
    ///
    /// assert_eq!(gene.innovation(), 42);
    /// ```
    pub fn innovation(&self) -> Innovation {
        self.innovation
    }

    /// Returns the id of the gene's source node.
    pub fn source(&self) -> Innovation {
        self.source
    }

    /// Returns the id of the gene's target node.
    pub fn target(&self) -> Innovation {
        self.target
    }

    /// Returns the gene's `(source, target)` pair,
    /// which is also its sort key within a genome.
    ///
    /// # Examples
    /// ```
    /// use kneat::genomics::ConnectionGene;
    ///
    /// let gene = ConnectionGene::new(42, 3, 9, 2.0);
    ///
    /// assert_eq!(gene.endpoints(), (3, 9));
    /// ```
    pub fn endpoints(&self) -> (Innovation, Innovation) {
        (self.source, self.target)
    }

    /// Returns the gene's weight.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Sets the gene's weight.
    ///
    /// # Examples
    /// ```
    /// use kneat::genomics::ConnectionGene;
    ///
    /// let mut gene = ConnectionGene::new(42, 3, 9, 2.0);
    /// gene.set_weight(-5.0);
    ///
    /// assert_eq!(gene.weight(), -5.0);
    /// ```
    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    /// Returns whether the gene is expressed in the phenotype.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Sets the gene's expression status.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl fmt::Display for ConnectionGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:?}[{:?}->{:?}, {:.3}]{}",
            if self.enabled { "" } else { "(" },
            self.innovation,
            self.source,
            self.target,
            self.weight,
            if self.enabled { "" } else { ")" },
        )
    }
}

/// A sequence of connection genes, kept sorted by
/// `(source, target)` and free of duplicate pairs.
///
/// Structure can only change through [`insert`] and
/// [`remove_at`]/[`remove`], which preserve both properties;
/// weights and expression flags can be edited in place.
///
/// [`insert`]: ConnectionGenes::insert
/// [`remove_at`]: ConnectionGenes::remove_at
/// [`remove`]: ConnectionGenes::remove
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionGenes {
    genes: Vec<ConnectionGene>,
}

impl ConnectionGenes {
    /// Returns an empty gene sequence.
    pub fn new() -> ConnectionGenes {
        ConnectionGenes { genes: vec![] }
    }

    /// Returns an empty gene sequence with space for `capacity` genes.
    pub fn with_capacity(capacity: usize) -> ConnectionGenes {
        ConnectionGenes {
            genes: Vec::with_capacity(capacity),
        }
    }

    /// Builds a sequence from genes in arbitrary order.
    ///
    /// # Errors
    /// Returns an error if two genes share the same endpoints.
    ///
    /// # Examples
    /// ```
    /// use kneat::genomics::{ConnectionGene, ConnectionGenes};
    ///
    /// let genes = ConnectionGenes::from_genes(vec![
    ///     ConnectionGene::new(5, 1, 3, 0.5),
    ///     ConnectionGene::new(4, 0, 3, 0.5),
    /// ])
    /// .unwrap();
    /// assert_eq!(genes.get(0).unwrap().endpoints(), (0, 3));
    ///
    /// assert!(ConnectionGenes::from_genes(vec![
    ///     ConnectionGene::new(4, 0, 3, 0.5),
    ///     ConnectionGene::new(7, 0, 3, 1.0),
    /// ])
    /// .is_err());
    /// ```
    pub fn from_genes(mut genes: Vec<ConnectionGene>) -> Result<ConnectionGenes, GeneValidityError> {
        genes.sort_unstable_by_key(|g| g.endpoints());
        if let Some(pair) = genes.windows(2).find(|w| w[0].endpoints() == w[1].endpoints()) {
            let (source, target) = pair[0].endpoints();
            return Err(GeneValidityError::DuplicateEndpoints(source, target));
        }
        Ok(ConnectionGenes { genes })
    }

    /// Wraps genes that are already sorted and duplicate-free.
    pub(crate) fn from_sorted(genes: Vec<ConnectionGene>) -> ConnectionGenes {
        debug_assert!(
            genes.windows(2).all(|w| w[0].endpoints() < w[1].endpoints()),
            "connection genes out of order or duplicated"
        );
        ConnectionGenes { genes }
    }

    /// Returns the number of genes.
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    /// Returns `true` if there are no genes.
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Returns an iterator over the genes in `(source, target)` order.
    pub fn iter(&self) -> slice::Iter<'_, ConnectionGene> {
        self.genes.iter()
    }

    /// Returns the genes as a slice.
    pub fn as_slice(&self) -> &[ConnectionGene] {
        &self.genes
    }

    /// Returns the gene at position `index`, if any.
    pub fn get(&self, index: usize) -> Option<&ConnectionGene> {
        self.genes.get(index)
    }

    /// Binary-searches for the gene between `source` and `target`.
    /// On failure, returns the position at which it would be inserted.
    pub fn binary_search(&self, source: Innovation, target: Innovation) -> Result<usize, usize> {
        self.genes
            .binary_search_by_key(&(source, target), |g| g.endpoints())
    }

    /// Returns `true` if a gene between `source` and `target` exists.
    ///
    /// # Examples
    /// ```
    /// use kneat::genomics::{ConnectionGene, ConnectionGenes};
    ///
    /// let genes: ConnectionGenes = vec![ConnectionGene::new(4, 0, 3, 0.5)].into_iter().collect();
    ///
    /// assert!(genes.contains(0, 3));
    /// assert!(!genes.contains(3, 0));
    /// ```
    pub fn contains(&self, source: Innovation, target: Innovation) -> bool {
        self.binary_search(source, target).is_ok()
    }

    /// Returns the gene between `source` and `target`, if any.
    pub fn find(&self, source: Innovation, target: Innovation) -> Option<&ConnectionGene> {
        self.binary_search(source, target)
            .ok()
            .map(|i| &self.genes[i])
    }

    /// Returns the range of positions holding the genes leaving `source`.
    pub fn outgoing(&self, source: Innovation) -> &[ConnectionGene] {
        let start = self.genes.partition_point(|g| g.source < source);
        let end = start + self.genes[start..].partition_point(|g| g.source == source);
        &self.genes[start..end]
    }

    /// Inserts a gene at its sorted position, returning that position.
    ///
    /// # Errors
    /// Returns an error, leaving the sequence unchanged, if
    /// a gene with the same endpoints is already present.
    ///
    /// # Examples
    /// ```
    /// use kneat::genomics::{ConnectionGene, ConnectionGenes};
    ///
    /// let mut genes = ConnectionGenes::new();
    /// assert_eq!(genes.insert(ConnectionGene::new(9, 2, 4, 1.0)).unwrap(), 0);
    /// assert_eq!(genes.insert(ConnectionGene::new(7, 1, 4, 1.0)).unwrap(), 0);
    /// assert!(genes.insert(ConnectionGene::new(8, 2, 4, 3.0)).is_err());
    /// assert_eq!(genes.len(), 2);
    /// ```
    pub fn insert(&mut self, gene: ConnectionGene) -> Result<usize, GeneValidityError> {
        match self.binary_search(gene.source, gene.target) {
            Ok(_) => Err(GeneValidityError::DuplicateEndpoints(gene.source, gene.target)),
            Err(position) => {
                self.genes.insert(position, gene);
                Ok(position)
            }
        }
    }

    /// Removes and returns the gene at position `index`.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn remove_at(&mut self, index: usize) -> ConnectionGene {
        self.genes.remove(index)
    }

    /// Removes and returns the gene between `source` and `target`, if any.
    pub fn remove(&mut self, source: Innovation, target: Innovation) -> Option<ConnectionGene> {
        self.binary_search(source, target)
            .ok()
            .map(|i| self.genes.remove(i))
    }

    /// Sets the weight of the gene at position `index`.
    pub fn set_weight_at(&mut self, index: usize, weight: f64) {
        self.genes[index].set_weight(weight);
    }

    /// Sets the expression status of the gene at position `index`.
    pub fn set_enabled_at(&mut self, index: usize, enabled: bool) {
        self.genes[index].set_enabled(enabled);
    }

    /// Walks two sequences side by side, pairing up genes
    /// with equal endpoints.
    ///
    /// # Examples
    /// ```
    /// use kneat::genomics::{ConnectionGene, ConnectionGenes, GenePair};
    ///
    /// let a: ConnectionGenes = vec![
    ///     ConnectionGene::new(4, 0, 3, 0.5),
    ///     ConnectionGene::new(6, 2, 3, 0.1),
    /// ].into_iter().collect();
    /// let b: ConnectionGenes = vec![
    ///     ConnectionGene::new(4, 0, 3, 0.2),
    ///     ConnectionGene::new(5, 1, 3, 0.3),
    /// ].into_iter().collect();
    ///
    /// let pairs: Vec<_> = a.aligned_with(&b).collect();
    /// assert!(matches!(pairs[0], GenePair::Matching(_, _)));
    /// assert!(matches!(pairs[1], GenePair::Right(g) if g.innovation() == 5));
    /// assert!(matches!(pairs[2], GenePair::Left(g) if g.innovation() == 6));
    /// ```
    pub fn aligned_with<'a>(&'a self, other: &'a ConnectionGenes) -> AlignedGenes<'a> {
        AlignedGenes {
            left: &self.genes,
            right: &other.genes,
        }
    }

    /// Returns the sequence moved a fraction `t` of the way
    /// towards `other`, gene by gene. Genes missing from one
    /// side are treated as having zero weight.
    pub fn interpolate(&self, other: &ConnectionGenes, t: f64) -> ConnectionGenes {
        let genes = self
            .aligned_with(other)
            .map(|pair| match pair {
                GenePair::Matching(a, b) => {
                    let mut gene = *a;
                    gene.weight = a.weight + t * (b.weight - a.weight);
                    gene
                }
                GenePair::Left(a) => {
                    let mut gene = *a;
                    gene.weight = a.weight * (1.0 - t);
                    gene
                }
                GenePair::Right(b) => {
                    let mut gene = *b;
                    gene.weight = b.weight * t;
                    gene
                }
            })
            .collect();
        ConnectionGenes::from_sorted(genes)
    }

    /// Returns `true` if the genes are strictly sorted by endpoints.
    pub(crate) fn is_strictly_sorted(&self) -> bool {
        self.genes
            .windows(2)
            .all(|w| w[0].endpoints() < w[1].endpoints())
    }
}

impl FromIterator<ConnectionGene> for ConnectionGenes {
    /// Collects genes into a sorted sequence.
    ///
    /// # Panics
    /// Panics if two genes share the same endpoints.
    fn from_iter<I: IntoIterator<Item = ConnectionGene>>(iter: I) -> ConnectionGenes {
        match ConnectionGenes::from_genes(iter.into_iter().collect()) {
            Ok(genes) => genes,
            Err(e) => panic!("{}", e),
        }
    }
}

impl<'a> IntoIterator for &'a ConnectionGenes {
    type Item = &'a ConnectionGene;
    type IntoIter = slice::Iter<'a, ConnectionGene>;

    fn into_iter(self) -> Self::IntoIter {
        self.genes.iter()
    }
}

/// The result of aligning two gene sequences.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GenePair<'a> {
    /// Both sequences hold a gene with these endpoints.
    Matching(&'a ConnectionGene, &'a ConnectionGene),
    /// Only the left-hand sequence holds the gene.
    Left(&'a ConnectionGene),
    /// Only the right-hand sequence holds the gene.
    Right(&'a ConnectionGene),
}

/// Merge-walk over two sorted gene sequences.
/// See [`ConnectionGenes::aligned_with`].
#[derive(Clone, Debug)]
pub struct AlignedGenes<'a> {
    left: &'a [ConnectionGene],
    right: &'a [ConnectionGene],
}

impl<'a> Iterator for AlignedGenes<'a> {
    type Item = GenePair<'a>;

    fn next(&mut self) -> Option<GenePair<'a>> {
        match (self.left.split_first(), self.right.split_first()) {
            (None, None) => None,
            (Some((l, rest)), None) => {
                self.left = rest;
                Some(GenePair::Left(l))
            }
            (None, Some((r, rest))) => {
                self.right = rest;
                Some(GenePair::Right(r))
            }
            (Some((l, l_rest)), Some((r, r_rest))) => {
                match l.endpoints().cmp(&r.endpoints()) {
                    std::cmp::Ordering::Less => {
                        self.left = l_rest;
                        Some(GenePair::Left(l))
                    }
                    std::cmp::Ordering::Greater => {
                        self.right = r_rest;
                        Some(GenePair::Right(r))
                    }
                    std::cmp::Ordering::Equal => {
                        self.left = l_rest;
                        self.right = r_rest;
                        Some(GenePair::Matching(l, r))
                    }
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let longest = self.left.len().max(self.right.len());
        (longest, Some(self.left.len() + self.right.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genes(layout: &[(Innovation, Innovation, f64)]) -> ConnectionGenes {
        layout.iter()
            .enumerate()
            .map(|(i, (s, t, w))| ConnectionGene::new(100 + i, *s, *t, *w))
            .collect()
    }

    #[test]
    fn from_genes_sorts_by_endpoints() {
        let genes = genes(&[(3, 1, 0.0), (0, 4, 0.0), (0, 2, 0.0), (2, 2, 0.0)]);
        let endpoints: Vec<_> = genes.iter().map(|g| g.endpoints()).collect();
        assert_eq!(endpoints, vec![(0, 2), (0, 4), (2, 2), (3, 1)]);
        assert!(genes.is_strictly_sorted());
    }

    #[test]
    #[should_panic]
    fn collect_duplicate_endpoints() {
        genes(&[(0, 2, 1.0), (0, 2, 2.0)]);
    }

    #[test]
    fn insert_keeps_order() {
        let mut g = genes(&[(0, 3, 0.0), (2, 3, 0.0)]);
        assert_eq!(g.insert(ConnectionGene::new(7, 1, 3, 0.0)).unwrap(), 1);
        assert_eq!(g.insert(ConnectionGene::new(8, 5, 0, 0.0)).unwrap(), 3);
        assert!(g.is_strictly_sorted());
    }

    #[test]
    fn remove_by_endpoints() {
        let mut g = genes(&[(0, 3, 0.5), (1, 3, 0.25)]);
        assert_eq!(g.remove(1, 3).map(|g| g.weight()), Some(0.25));
        assert_eq!(g.remove(1, 3), None);
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn outgoing_range() {
        let g = genes(&[(0, 3, 0.0), (1, 3, 0.0), (1, 4, 0.0), (1, 5, 0.0), (2, 3, 0.0)]);
        let targets: Vec<_> = g.outgoing(1).iter().map(|g| g.target()).collect();
        assert_eq!(targets, vec![3, 4, 5]);
        assert!(g.outgoing(4).is_empty());
    }

    #[test]
    fn aligned_with_covers_both_sides() {
        let a = genes(&[(0, 3, 1.0), (1, 3, 1.0), (4, 3, 1.0)]);
        let b = genes(&[(0, 3, 2.0), (2, 3, 2.0), (4, 3, 2.0), (5, 3, 2.0)]);
        let (mut matching, mut left, mut right) = (0, 0, 0);
        for pair in a.aligned_with(&b) {
            match pair {
                GenePair::Matching(x, y) => {
                    assert_eq!(x.endpoints(), y.endpoints());
                    matching += 1;
                }
                GenePair::Left(_) => left += 1,
                GenePair::Right(_) => right += 1,
            }
        }
        assert_eq!((matching, left, right), (2, 1, 2));
    }

    #[test]
    fn interpolate_halfway() {
        let a = genes(&[(0, 3, 1.0), (1, 3, 2.0)]);
        let b = genes(&[(0, 3, 3.0), (2, 3, 4.0)]);
        let mid = a.interpolate(&b, 0.5);
        let weights: Vec<_> = mid.iter().map(|g| g.weight()).collect();
        assert_eq!(weights, vec![2.0, 1.0, 2.0]);
    }

    #[test]
    fn display_marks_disabled_genes() {
        let mut gene = ConnectionGene::new(1, 0, 2, 0.5);
        assert_eq!(gene.to_string(), "1[0->2, 0.500]");
        gene.set_enabled(false);
        assert_eq!(gene.to_string(), "(1[0->2, 0.500])");
    }
}
