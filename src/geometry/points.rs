extern crate nalgebra as na;

use na::Point3;
use color_eyre::eyre::Result;
use tracing::trace;

use crate::geometry::{DepthRenderer, Projector, render::render_depth, visibility::VisibilityFilter};
use crate::image::Image;
use crate::numerics::pose::Pose;
use crate::Float;

/**
 * Unstructured point set in the map frame.
 */
#[derive(Debug,Clone,Default)]
pub struct PointCloud {
    projector: Projector,
    points: Vec<Point3<Float>>
}

impl PointCloud {
    pub fn new() -> PointCloud {
        PointCloud::default()
    }

    pub fn set_points(&mut self, points: Vec<Point3<Float>>) {
        self.points = points;
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl DepthRenderer for PointCloud {
    fn projector(&self) -> &Projector {
        &self.projector
    }

    fn projector_mut(&mut self) -> &mut Projector {
        &mut self.projector
    }

    fn create_depthmap(&self, pose: &Pose, filter: &VisibilityFilter) -> Result<Image> {
        let setup = self.projector.setup()?;
        let depth = render_depth(&setup,pose,self.points.iter().copied());
        trace!(points = self.points.len(), hits = depth.count_nonzero(), "rendered point cloud");
        Ok(filter.apply(&depth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalization::ValueRange;
    use crate::sensors::camera::perspective::Perspective;

    #[test]
    fn unset_projection_is_an_error() {
        let mut cloud = PointCloud::new();
        cloud.set_points(vec![Point3::new(0.0,0.0,1.0)]);
        assert!(cloud.create_depthmap(&Pose::identity(),&VisibilityFilter::disabled()).is_err());
        cloud.set_intrinsic(Perspective::new(1.0,1.0,0.5,0.5,0.0));
        cloud.set_shape(1,1);
        assert!(cloud.create_depthmap(&Pose::identity(),&VisibilityFilter::disabled()).is_err());
        cloud.set_depth_range(ValueRange{min: 0.0, max: 10.0});
        let depth = cloud.create_depthmap(&Pose::identity(),&VisibilityFilter::disabled()).unwrap();
        assert_eq!(depth.buffer[(0,0)],1.0);
    }

    #[test]
    fn empty_cloud_renders_zeros() {
        let mut cloud = PointCloud::new();
        cloud.set_intrinsic(Perspective::new(5.0,5.0,2.0,2.0,0.0));
        cloud.set_shape(4,4);
        cloud.set_depth_range(ValueRange{min: 0.0, max: 80.0});
        let depth = cloud.create_depthmap(&Pose::identity(),&VisibilityFilter::new(1,3.0)).unwrap();
        assert_eq!(depth.count_nonzero(),0);
        assert_eq!((depth.height(),depth.width()),(4,4));
    }
}
