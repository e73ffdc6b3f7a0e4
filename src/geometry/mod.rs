use color_eyre::eyre::{Result, eyre, bail};

use crate::image::Image;
use crate::normalization::ValueRange;
use crate::numerics::pose::Pose;
use crate::sensors::camera::perspective::Perspective;
use crate::Float;
use self::visibility::VisibilityFilter;

pub mod point;
pub mod render;
pub mod visibility;
pub mod points;
pub mod voxel_grid;

/**
 * Fully specified camera model a depth map is rendered with.
 */
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct ProjectionSetup {
    pub camera: Perspective<Float>,
    pub height: usize,
    pub width: usize,
    pub depth_range: ValueRange
}

/**
 * Projection parameters collected through the setters of a renderer.
 */
#[derive(Debug,Clone,Copy,Default,PartialEq)]
pub struct Projector {
    pub camera: Option<Perspective<Float>>,
    pub shape: Option<(usize,usize)>,
    pub depth_range: Option<ValueRange>
}

impl Projector {
    pub fn setup(&self) -> Result<ProjectionSetup> {
        let camera = self.camera.ok_or_else(|| eyre!("intrinsics not set"))?;
        let (height, width) = self.shape.ok_or_else(|| eyre!("output shape not set"))?;
        let depth_range = self.depth_range.ok_or_else(|| eyre!("depth range not set"))?;
        if height == 0 || width == 0 {
            bail!("output shape {}x{} is empty", height, width);
        }
        Ok(ProjectionSetup{camera,height,width,depth_range})
    }
}

/**
 * A 3-D structure that can be rendered into a depth image.
 */
pub trait DepthRenderer {
    fn projector(&self) -> &Projector;

    fn projector_mut(&mut self) -> &mut Projector;

    fn set_intrinsic(&mut self, camera: Perspective<Float>) {
        self.projector_mut().camera = Some(camera);
    }

    /// (height, width)
    fn set_shape(&mut self, height: usize, width: usize) {
        self.projector_mut().shape = Some((height,width));
    }

    fn set_depth_range(&mut self, range: ValueRange) {
        self.projector_mut().depth_range = Some(range);
    }

    fn set_projection(&mut self, setup: &ProjectionSetup) {
        self.set_intrinsic(setup.camera);
        self.set_shape(setup.height,setup.width);
        self.set_depth_range(setup.depth_range);
    }

    /**
     * Depth image seen from `pose`. Pixels without a surviving sample are zero.
     */
    fn create_depthmap(&self, pose: &Pose, filter: &VisibilityFilter) -> Result<Image>;
}
