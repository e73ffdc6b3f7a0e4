extern crate nalgebra as na;

use na::Point3;

use crate::geometry::ProjectionSetup;
use crate::image::Image;
use crate::numerics::pose::Pose;
use crate::sensors::camera::Camera;
use crate::Float;

/**
 * Pixel (row, col) a camera frame position falls on, if it lies in the depth range and the image.
 */
pub fn pixel_of(setup: &ProjectionSetup, position: &Point3<Float>) -> Option<(usize,usize)> {
    let z = position.z;
    if !(z > 0.0) || !setup.depth_range.contains(z) {
        return None;
    }
    let projected = setup.camera.project(&position.coords)?;
    let (u, v) = (projected.x.floor(), projected.y.floor());
    match u >= 0.0 && v >= 0.0 && u < setup.width as Float && v < setup.height as Float {
        true => Some((v as usize, u as usize)),
        false => None
    }
}

/**
 * Z-buffer rendering: every pixel keeps the nearest map point projecting onto it.
 */
pub fn render_depth<I>(setup: &ProjectionSetup, pose: &Pose, points: I) -> Image where I: IntoIterator<Item=Point3<Float>> {
    let world_to_camera = pose.world_to_camera();
    let mut depth = Image::zeros(setup.width,setup.height);
    for point in points {
        let position = world_to_camera*point;
        if let Some(pixel) = pixel_of(setup,&position) {
            let current = depth.buffer[pixel];
            if current == 0.0 || position.z < current {
                depth.buffer[pixel] = position.z;
            }
        }
    }
    depth
}
