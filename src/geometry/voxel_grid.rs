extern crate nalgebra as na;

use na::{Point3, Vector3};
use color_eyre::eyre::{Result, bail, eyre};
use tracing::trace;

use crate::geometry::{DepthRenderer, Projector, render::render_depth, visibility::VisibilityFilter};
use crate::image::Image;
use crate::io::Attributes;
use crate::numerics::pose::Pose;
use crate::sensors::camera::Camera;
use crate::Float;

pub type VoxelIndex = [usize;3];

/**
 * Layout of a voxel grid in the map frame. Voxel (i, j, k) is centered at
 * origin + min + (idx + 0.5) * voxel_size; `center` is the grid center relative to origin.
 */
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct VoxelGeometry {
    pub grid: [usize;3],
    pub voxel_size: Float,
    pub min: Vector3<Float>,
    pub max: Vector3<Float>,
    pub center: Vector3<Float>,
    pub origin: Vector3<Float>
}

fn required<T: Copy>(value: Option<T>, name: &str) -> Result<T> {
    value.ok_or_else(|| eyre!("voxel record lacks the {} attribute", name))
}

impl VoxelGeometry {
    pub fn new(grid: [usize;3], voxel_size: Float, min: [Float;3], max: [Float;3], center: [Float;3], origin: [Float;3]) -> Result<VoxelGeometry> {
        let geometry = VoxelGeometry {
            grid,
            voxel_size,
            min: Vector3::from(min),
            max: Vector3::from(max),
            center: Vector3::from(center),
            origin: Vector3::from(origin)
        };
        geometry.validate()?;
        Ok(geometry)
    }

    pub fn from_attributes(attributes: &Attributes) -> Result<VoxelGeometry> {
        VoxelGeometry::new(
            required(attributes.voxel_grid,"voxel_grid")?,
            required(attributes.voxel_size,"voxel_size")?,
            required(attributes.voxel_min,"voxel_min")?,
            required(attributes.voxel_max,"voxel_max")?,
            required(attributes.voxel_center,"voxel_center")?,
            required(attributes.voxel_origin,"voxel_origin")?)
    }

    pub fn write_attributes(&self, attributes: &mut Attributes) {
        attributes.voxel_grid = Some(self.grid);
        attributes.voxel_size = Some(self.voxel_size);
        attributes.voxel_min = Some(self.min.into());
        attributes.voxel_max = Some(self.max.into());
        attributes.voxel_center = Some(self.center.into());
        attributes.voxel_origin = Some(self.origin.into());
    }

    fn validate(&self) -> Result<()> {
        let values = self.min.iter().chain(self.max.iter()).chain(self.center.iter()).chain(self.origin.iter());
        if !(self.voxel_size > 0.0) || !self.voxel_size.is_finite() || values.clone().any(|v| !v.is_finite()) {
            bail!("voxel geometry has non finite values or non positive voxel size {}", self.voxel_size);
        }
        for axis in 0..3 {
            if self.min[axis] >= self.max[axis] {
                bail!("voxel bounds are empty along axis {}: [{}, {}]", axis, self.min[axis], self.max[axis]);
            }
            let cells = (self.max[axis]-self.min[axis])/self.voxel_size;
            if (cells - self.grid[axis] as Float).abs() > 1.0 {
                bail!("voxel grid of {} cells along axis {} does not fit bounds spanning {} cells", self.grid[axis], axis, cells);
            }
            if self.center[axis] < self.min[axis] || self.center[axis] > self.max[axis] {
                bail!("voxel center lies outside the bounds along axis {}", axis);
            }
        }
        Ok(())
    }

    pub fn contains(&self, idx: &VoxelIndex) -> bool {
        (0..3).all(|axis| idx[axis] < self.grid[axis])
    }

    pub fn voxel_center(&self, idx: &VoxelIndex) -> Point3<Float> {
        let offset = Vector3::<Float>::new(idx[0] as Float + 0.5,idx[1] as Float + 0.5,idx[2] as Float + 0.5)*self.voxel_size;
        Point3::from(self.origin + self.min + offset)
    }

    pub fn world_center(&self) -> Point3<Float> {
        Point3::from(self.origin + self.center)
    }

    /// Distance from the grid center to the farthest corner.
    pub fn bounding_radius(&self) -> Float {
        (self.max - self.center).abs().sup(&(self.center - self.min).abs()).norm()
    }

    pub fn voxel_radius(&self) -> Float {
        0.5*self.voxel_size*(3.0 as Float).sqrt()
    }
}

/**
 * One stored voxel: a representative map point and its semantic label.
 */
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct VoxelCell {
    pub point: Point3<Float>,
    pub label: u32
}

impl VoxelCell {
    pub const ROW_WIDTH: usize = 4;

    pub fn new(point: [Float;3], label: u32) -> VoxelCell {
        VoxelCell{point: Point3::new(point[0],point[1],point[2]), label}
    }

    pub fn to_row(&self) -> [Float;4] {
        [self.point.x,self.point.y,self.point.z,self.label as Float]
    }

    pub fn from_row(row: &[Float]) -> Result<VoxelCell> {
        if row.len() != VoxelCell::ROW_WIDTH {
            bail!("voxel row needs {} values, got {}", VoxelCell::ROW_WIDTH, row.len());
        }
        if row.iter().any(|v| !v.is_finite()) || row[3] < 0.0 {
            bail!("malformed voxel row {:?}", row);
        }
        Ok(VoxelCell::new([row[0],row[1],row[2]],row[3] as u32))
    }
}

/**
 * Sparse voxel map. Built empty from its geometry and the occupied index table, then populated
 * only with the voxels a frustum query selected.
 */
#[derive(Debug,Clone,Default)]
pub struct VoxelGridMap {
    projector: Projector,
    geometry: Option<VoxelGeometry>,
    occupied: Vec<VoxelIndex>,
    voxels: Vec<(VoxelIndex,VoxelCell)>
}

impl VoxelGridMap {
    pub fn new() -> VoxelGridMap {
        VoxelGridMap::default()
    }

    pub fn set_empty_voxelgridmap(&mut self, geometry: VoxelGeometry, occupied: Vec<VoxelIndex>) -> Result<()> {
        if let Some(idx) = occupied.iter().find(|idx| !geometry.contains(idx)) {
            bail!("occupied voxel {:?} lies outside the grid {:?}", idx, geometry.grid);
        }
        self.geometry = Some(geometry);
        self.occupied = occupied;
        self.voxels.clear();
        Ok(())
    }

    pub fn geometry(&self) -> Result<&VoxelGeometry> {
        self.geometry.as_ref().ok_or_else(|| eyre!("voxel grid map has no geometry"))
    }

    /**
     * Rows of the occupied table whose voxel intersects the viewing frustum of `pose`,
     * allowing half a voxel diagonal of slack on every side.
     */
    pub fn get_voxels_include_frustum(&self, pose: &Pose) -> Result<Vec<usize>> {
        let geometry = self.geometry()?;
        let setup = self.projector.setup()?;
        let world_to_camera = pose.world_to_camera();

        let grid_z = (world_to_camera*geometry.world_center()).z;
        let grid_radius = geometry.bounding_radius();
        if grid_z + grid_radius < setup.depth_range.min || grid_z - grid_radius > setup.depth_range.max {
            trace!(grid_z, grid_radius, "voxel grid outside depth range");
            return Ok(Vec::new());
        }

        let slack = geometry.voxel_radius();
        let (width, height) = (setup.width as Float, setup.height as Float);
        let rows = self.occupied.iter().enumerate().filter(|(_,idx)| {
            let position = world_to_camera*geometry.voxel_center(idx);
            let z = position.z;
            if !(z + slack > 0.0) || z + slack < setup.depth_range.min || z - slack > setup.depth_range.max {
                return false;
            }
            // reaches the camera plane, its centre does not project meaningfully
            if z <= slack {
                return true;
            }
            match setup.camera.project(&position.coords) {
                Some(p) => {
                    let margin_x = setup.camera.get_focal_x()*slack/z;
                    let margin_y = setup.camera.get_focal_y()*slack/z;
                    p.x >= -margin_x && p.x < width + margin_x && p.y >= -margin_y && p.y < height + margin_y
                },
                None => false
            }
        }).map(|(row,_)| row).collect::<Vec<usize>>();
        Ok(rows)
    }

    pub fn set_voxels(&mut self, rows: &[usize], cells: Vec<VoxelCell>) -> Result<()> {
        if rows.len() != cells.len() {
            bail!("{} voxel rows but {} cells", rows.len(), cells.len());
        }
        let mut voxels = Vec::<(VoxelIndex,VoxelCell)>::with_capacity(rows.len());
        for (&row, cell) in rows.iter().zip(cells.into_iter()) {
            let idx = *self.occupied.get(row).ok_or_else(|| eyre!("voxel row {} out of bounds ({} occupied)", row, self.occupied.len()))?;
            voxels.push((idx,cell));
        }
        self.voxels = voxels;
        Ok(())
    }

    /// Number of populated voxels.
    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }
}

impl DepthRenderer for VoxelGridMap {
    fn projector(&self) -> &Projector {
        &self.projector
    }

    fn projector_mut(&mut self) -> &mut Projector {
        &mut self.projector
    }

    fn create_depthmap(&self, pose: &Pose, filter: &VisibilityFilter) -> Result<Image> {
        let setup = self.projector.setup()?;
        let depth = render_depth(&setup,pose,self.voxels.iter().map(|(_,cell)| cell.point));
        trace!(voxels = self.voxels.len(), hits = depth.count_nonzero(), "rendered voxel grid map");
        Ok(filter.apply(&depth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::UnitQuaternion;
    use crate::io::RecordType;
    use crate::normalization::ValueRange;
    use crate::sensors::camera::perspective::Perspective;

    fn geometry() -> VoxelGeometry {
        VoxelGeometry::new([20,20,40],1.0,[-10.0,-10.0,-20.0],[10.0,10.0,20.0],[0.0,0.0,0.0],[0.0,0.0,0.0]).unwrap()
    }

    fn map(occupied: Vec<VoxelIndex>) -> VoxelGridMap {
        let mut vgm = VoxelGridMap::new();
        vgm.set_intrinsic(Perspective::new(50.0,50.0,32.0,24.0,0.0));
        vgm.set_shape(48,64);
        vgm.set_depth_range(ValueRange{min: 0.5, max: 80.0});
        vgm.set_empty_voxelgridmap(geometry(),occupied).unwrap();
        vgm
    }

    #[test]
    fn frustum_keeps_only_visible_voxels() {
        // ahead of the camera, behind it, far off to the side
        let vgm = map(vec![[10,10,30],[10,10,5],[0,0,21]]);
        let rows = vgm.get_voxels_include_frustum(&Pose::identity()).unwrap();
        assert_eq!(rows,vec![0]);
    }

    #[test]
    fn voxel_straddling_camera_plane_is_kept() {
        // centres at z = -0.5 and z = -1.5, seen from a camera 0.2 behind the origin
        let vgm = map(vec![[10,10,19],[10,10,18]]);
        let pose = Pose::new(Vector3::new(0.0,0.0,-0.2),UnitQuaternion::identity());
        assert_eq!(vgm.get_voxels_include_frustum(&pose).unwrap(),vec![0]);
        assert!(vgm.get_voxels_include_frustum(&Pose::identity()).unwrap().is_empty());
    }

    #[test]
    fn empty_map_has_no_visible_voxels() {
        let vgm = map(vec![]);
        assert!(vgm.get_voxels_include_frustum(&Pose::identity()).unwrap().is_empty());
        let depth = vgm.create_depthmap(&Pose::identity(),&VisibilityFilter::new(1,3.0)).unwrap();
        assert_eq!(depth.count_nonzero(),0);
    }

    #[test]
    fn populated_voxels_render() {
        let mut vgm = map(vec![[10,10,30]]);
        let rows = vgm.get_voxels_include_frustum(&Pose::identity()).unwrap();
        vgm.set_voxels(&rows,vec![VoxelCell::new([0.0,0.0,10.5],3)]).unwrap();
        let depth = vgm.create_depthmap(&Pose::identity(),&VisibilityFilter::disabled()).unwrap();
        assert_eq!(depth.buffer[(24,32)],10.5);
        assert!(vgm.set_voxels(&[5],vec![VoxelCell::new([0.0,0.0,1.0],0)]).is_err());
    }

    #[test]
    fn missing_geometry_attributes_are_fatal() {
        let mut attributes = Attributes::new(RecordType::VoxelSemantic3d,vec![0,4]);
        geometry().write_attributes(&mut attributes);
        assert_eq!(VoxelGeometry::from_attributes(&attributes).unwrap(),geometry());
        attributes.voxel_max = None;
        let err = VoxelGeometry::from_attributes(&attributes).unwrap_err();
        assert!(format!("{}",err).contains("voxel_max"));
    }

    #[test]
    fn malformed_geometry_is_rejected() {
        assert!(VoxelGeometry::new([20,20,20],0.0,[-10.0,-10.0,0.0],[10.0,10.0,20.0],[0.0,0.0,10.0],[0.0;3]).is_err());
        assert!(VoxelGeometry::new([5,20,20],1.0,[-10.0,-10.0,0.0],[10.0,10.0,20.0],[0.0,0.0,10.0],[0.0;3]).is_err());
        assert!(VoxelGeometry::new([20,20,20],1.0,[10.0,-10.0,0.0],[-10.0,10.0,20.0],[0.0,0.0,10.0],[0.0;3]).is_err());
    }

    #[test]
    fn occupied_indices_must_lie_in_grid() {
        let mut vgm = VoxelGridMap::new();
        assert!(vgm.set_empty_voxelgridmap(geometry(),vec![[20,0,0]]).is_err());
    }
}
