use color_eyre::eyre::Result;
use tracing::{debug, trace};

use crate::geometry::{DepthRenderer, ProjectionSetup, points::PointCloud, visibility::VisibilityFilter, voxel_grid::VoxelGridMap};
use crate::image::Image;
use crate::io::{RecordStore, record::SampleReader};
use crate::numerics::pose::Pose;

/**
 * Renders depth maps of a sample's 3-D data from a given pose.
 */
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct DepthSynthesizer {
    pub filter: VisibilityFilter
}

impl DepthSynthesizer {
    pub fn new(filter: VisibilityFilter) -> DepthSynthesizer {
        DepthSynthesizer{filter}
    }

    /**
     * Sparse depth from the voxel map. Only rows of voxels inside the viewing frustum are read
     * from the store.
     */
    pub fn sparse(&self, store: &dyn RecordStore, sample: usize, link: usize, setup: &ProjectionSetup, pose: &Pose) -> Result<Image> {
        let reader = SampleReader::new(store,sample);
        let (geometry, occupied, _) = reader.voxel_layout(link)?;
        let occupied_count = occupied.len();

        let mut vgm = VoxelGridMap::new();
        vgm.set_projection(setup);
        vgm.set_empty_voxelgridmap(geometry,occupied)?;
        let rows = vgm.get_voxels_include_frustum(pose)?;
        match rows.is_empty() {
            true => trace!(sample, occupied = occupied_count, "no voxel inside the frustum"),
            false => {
                let cells = reader.voxel_rows(link,&rows)?;
                vgm.set_voxels(&rows,cells)?;
            }
        };
        debug!(sample, occupied = occupied_count, visible = vgm.len(), "synthesized sparse depth");
        vgm.create_depthmap(pose,&self.filter)
    }

    /**
     * Dense depth from the point cloud record.
     */
    pub fn dense(&self, store: &dyn RecordStore, sample: usize, link: usize, setup: &ProjectionSetup, pose: &Pose) -> Result<Image> {
        let (points, _) = SampleReader::new(store,sample).points(link)?;
        let mut cloud = PointCloud::new();
        cloud.set_projection(setup);
        cloud.set_points(points);
        debug!(sample, points = cloud.len(), "synthesized dense depth");
        cloud.create_depthmap(pose,&self.filter)
    }
}
