//! Solver-facing records: per-zone connectivity plus the corner arrays.
//!
//! Records use `Option` for "no opposite" internally; the flat stream handed
//! to the solver encodes `None` as `-1`.

use crate::algs::boundary::BoundaryClassification;
use crate::algs::corners::CornerIndex;
use crate::geometry::corner_coords::CornerCoords;

/// Connectivity of one zone (cell).
///
/// Per-face arrays follow the cell's face order. Per-corner-face arrays are
/// grouped by face; face `f` owns entries `face_corners(f)`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ZoneConnectivity {
    pub zone: usize,
    /// Global id of the zone's first corner.
    pub corner_offset: usize,
    pub n_corners: usize,
    /// Neighboring zone across each face.
    pub zones_opp: Vec<Option<usize>>,
    /// Local corner id of each corner-face, in canonical winding.
    pub corners_local: Vec<usize>,
    /// Global corner id on the far side of each corner-face (local or on the
    /// neighbor partition).
    pub corners_opp: Vec<Option<usize>>,
    pub ncorners_on_face: Vec<usize>,
    pub face_bcids: Vec<i32>,
}

impl ZoneConnectivity {
    #[inline]
    pub fn n_faces(&self) -> usize {
        self.zones_opp.len()
    }

    #[inline]
    pub fn n_corner_faces(&self) -> usize {
        self.corners_local.len()
    }

    /// Range of corner-face entries belonging to local face `lf`.
    pub fn face_corners(&self, lf: usize) -> std::ops::Range<usize> {
        let start: usize = self.ncorners_on_face[..lf].iter().sum();
        start..start + self.ncorners_on_face[lf]
    }

    /// Number of entries this zone takes in the flat stream.
    pub fn stream_len(&self) -> usize {
        5 + 3 * self.n_faces() + 2 * self.n_corner_faces()
    }

    /// Append this zone to the flat stream.
    ///
    /// Layout: `zone, corner_offset, n_faces, n_corner_faces, n_corners,
    /// zones_opp, corners_local, corners_opp, ncorners_on_face, face_bcids`.
    pub fn write_stream(&self, out: &mut Vec<i32>) {
        let opt = |o: &Option<usize>| o.map_or(-1, |v| v as i32);
        out.reserve(self.stream_len());
        out.extend([
            self.zone as i32,
            self.corner_offset as i32,
            self.n_faces() as i32,
            self.n_corner_faces() as i32,
            self.n_corners as i32,
        ]);
        out.extend(self.zones_opp.iter().map(opt));
        out.extend(self.corners_local.iter().map(|&c| c as i32));
        out.extend(self.corners_opp.iter().map(opt));
        out.extend(self.ncorners_on_face.iter().map(|&n| n as i32));
        out.extend_from_slice(&self.face_bcids);
    }
}

/// Everything the conversion produces for one partition.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SolverMesh {
    pub zones: Vec<ZoneConnectivity>,
    pub corners: CornerIndex,
    pub coords: CornerCoords,
    pub boundary: BoundaryClassification,
    /// Face attribute after expansion onto every face.
    pub face_attribute: Vec<Option<i32>>,
}

impl SolverMesh {
    pub fn n_zones(&self) -> usize {
        self.zones.len()
    }

    pub fn n_corners(&self) -> usize {
        self.corners.n_corners_total()
    }

    /// Flat stream of all zones plus the start of each zone in it
    /// (`n_zones + 1` entries, the last one being the stream length).
    ///
    /// Values are narrowed to `i32`; the corner-mesh validator rejects
    /// meshes whose ids would not fit.
    pub fn flatten(&self) -> (Vec<i32>, Vec<usize>) {
        let total: usize = self.zones.iter().map(ZoneConnectivity::stream_len).sum();
        let mut stream = Vec::with_capacity(total);
        let mut offsets = Vec::with_capacity(self.zones.len() + 1);
        for zone in &self.zones {
            offsets.push(stream.len());
            zone.write_stream(&mut stream);
        }
        offsets.push(stream.len());
        (stream, offsets)
    }
}
