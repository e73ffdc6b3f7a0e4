extern crate nalgebra as na;

use na::Vector3;
use crate::geometry::point::Point;
use crate::GenericFloat;

pub mod perspective;

pub trait Camera<F: GenericFloat> {
    /// Pixel coordinates of a point given in the camera frame. None for points on the image plane.
    fn project(&self, position: &Vector3<F>) -> Option<Point<F>>;
    fn get_focal_x(&self) -> F;
    fn get_focal_y(&self) -> F;
}
