//! Faces this partition shares with neighboring partitions.
use std::collections::BTreeMap;

use crate::mesh_error::MeshError;
use crate::topology::mesh::AdjacencyGroup;

/// Metadata that identifies the remote copy of a local face.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Remote {
    pub rank: usize,
    pub remote_face: usize,
}

/// Sharing relationships between this partition and its neighbors.
///
/// Links are kept per neighbor in ascending local-face order so iteration is
/// deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Overlap {
    my_rank: usize,
    by_rank: BTreeMap<usize, BTreeMap<usize, usize>>,
    by_face: BTreeMap<usize, Remote>,
    by_remote: BTreeMap<Remote, usize>,
}

impl Overlap {
    pub fn new(my_rank: usize) -> Self {
        Self {
            my_rank,
            ..Self::default()
        }
    }

    /// Collect the links of `my_rank` from the mesh's adjacency groups.
    ///
    /// Groups that do not involve `my_rank` are skipped.
    pub fn from_groups(groups: &[AdjacencyGroup], my_rank: usize) -> Result<Self, MeshError> {
        let mut ovlp = Self::new(my_rank);
        for group in groups {
            let Some(side) = group.side_of(my_rank) else {
                log::debug!(
                    "rank {my_rank}: skipping adjacency group `{}` for partitions {:?}",
                    group.name,
                    group.partitions
                );
                continue;
            };
            let nbr = group.partitions[1 - side];
            if nbr == my_rank {
                return Err(MeshError::InvalidAdjacency {
                    group: group.name.clone(),
                    rank: my_rank,
                    reason: "group names the same partition twice".into(),
                });
            }
            for pair in &group.faces {
                ovlp.add_link(&group.name, pair[side], nbr, pair[1 - side])?;
            }
        }
        Ok(ovlp)
    }

    /// Add a link `local face → (rank, remote face)` declared by adjacency
    /// group `group`.
    ///
    /// A local face may be shared with exactly one remote face.
    pub fn add_link(
        &mut self,
        group: &str,
        local: usize,
        remote_rank: usize,
        remote: usize,
    ) -> Result<(), MeshError> {
        let invalid = |reason: String| MeshError::InvalidAdjacency {
            group: group.to_owned(),
            rank: self.my_rank,
            reason,
        };
        let link = Remote {
            rank: remote_rank,
            remote_face: remote,
        };
        if let Some(prev) = self.by_face.get(&local) {
            if *prev == link {
                return Ok(());
            }
            return Err(invalid(format!(
                "face {local} linked to both {prev:?} and {link:?}"
            )));
        }
        if self.by_remote.contains_key(&link) {
            return Err(invalid(format!(
                "remote face {remote} on rank {remote_rank} linked twice"
            )));
        }
        self.by_rank
            .entry(remote_rank)
            .or_default()
            .insert(local, remote);
        self.by_face.insert(local, link);
        self.by_remote.insert(link, local);
        Ok(())
    }

    pub fn my_rank(&self) -> usize {
        self.my_rank
    }

    /// Neighbor ranks in ascending order.
    pub fn neighbours(&self) -> impl Iterator<Item = usize> + '_ {
        self.by_rank.keys().copied()
    }

    /// `(local, remote)` face pairs for a given neighbour rank.
    pub fn links_to(&self, nbr: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.by_rank
            .get(&nbr)
            .into_iter()
            .flat_map(|m| m.iter().map(|(&l, &r)| (l, r)))
    }

    /// Local face matching `remote` on neighbour `nbr`.
    pub fn local_of(&self, nbr: usize, remote: usize) -> Option<usize> {
        self.by_remote
            .get(&Remote {
                rank: nbr,
                remote_face: remote,
            })
            .copied()
    }

    pub fn remote_of(&self, face: usize) -> Option<Remote> {
        self.by_face.get(&face).copied()
    }

    #[inline]
    pub fn is_shared(&self, face: usize) -> bool {
        self.by_face.contains_key(&face)
    }

    pub fn shared_face_count(&self) -> usize {
        self.by_face.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_face.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(partitions: [usize; 2], faces: Vec<[usize; 2]>) -> AdjacencyGroup {
        AdjacencyGroup {
            name: "g".into(),
            partitions,
            faces,
        }
    }

    #[test]
    fn picks_own_side_of_each_group() {
        let groups = vec![group([0, 1], vec![[5, 9], [6, 8]]), group([2, 1], vec![[3, 4]])];
        let ovlp = Overlap::from_groups(&groups, 1).unwrap();
        assert_eq!(ovlp.neighbours().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(ovlp.links_to(0).collect::<Vec<_>>(), vec![(8, 6), (9, 5)]);
        assert_eq!(ovlp.links_to(2).collect::<Vec<_>>(), vec![(4, 3)]);
        assert_eq!(ovlp.local_of(0, 5), Some(9));
        assert_eq!(
            ovlp.remote_of(4),
            Some(Remote {
                rank: 2,
                remote_face: 3
            })
        );
    }

    #[test]
    fn unrelated_groups_are_ignored() {
        let groups = vec![group([2, 3], vec![[1, 1]])];
        let ovlp = Overlap::from_groups(&groups, 0).unwrap();
        assert!(ovlp.is_empty());
    }

    #[test]
    fn face_shared_twice_is_rejected() {
        let groups = vec![group([0, 1], vec![[5, 9]]), group([0, 2], vec![[5, 1]])];
        let err = Overlap::from_groups(&groups, 0).unwrap_err();
        assert!(matches!(err, MeshError::InvalidAdjacency { rank: 0, .. }));
    }

    #[test]
    fn repeated_link_is_idempotent_but_reuse_is_not() {
        let mut ovlp = Overlap::new(0);
        ovlp.add_link("walls", 5, 1, 9).unwrap();
        ovlp.add_link("walls", 5, 1, 9).unwrap();
        assert_eq!(ovlp.shared_face_count(), 1);
        let err = ovlp.add_link("walls", 6, 1, 9).unwrap_err();
        assert_eq!(
            err,
            MeshError::InvalidAdjacency {
                group: "walls".into(),
                rank: 0,
                reason: "remote face 9 on rank 1 linked twice".into()
            }
        );
    }

    #[test]
    fn self_group_is_rejected() {
        let groups = vec![group([1, 1], vec![[0, 0]])];
        assert!(Overlap::from_groups(&groups, 1).is_err());
    }
}
