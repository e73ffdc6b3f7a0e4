extern crate nalgebra as na;
extern crate num_traits;

use na::{Matrix3, Vector3};
use color_eyre::eyre::{Result, bail};
use crate::geometry::point::Point;
use crate::sensors::camera::Camera;
use crate::GenericFloat;

#[derive(Debug,Copy,Clone,PartialEq)]
pub struct Perspective<F: GenericFloat> {
    pub projection: Matrix3<F>
}

impl<F: GenericFloat> Perspective<F> {
    pub fn new(fx: F, fy: F, cx: F, cy: F, s: F) -> Perspective<F> {
        let projection = Matrix3::<F>::new(fx, s, cx,
            F::zero(), fy, cy,
            F::zero(),  F::zero(), F::one());
        Perspective{projection}
    }

    /**
     * Builds the camera from a row-major 3x3 intrinsic matrix.
     * Rejects matrices with non-positive focal lengths or a non-unit last row.
     */
    pub fn from_matrix(mat: &Matrix3<F>) -> Result<Perspective<F>> {
        let fx = mat[(0,0)];
        let fy = mat[(1,1)];
        if !(fx > F::zero()) || !(fy > F::zero()) {
            bail!("intrinsic matrix has non-positive focal length");
        }
        if mat[(2,0)] != F::zero() || mat[(2,1)] != F::zero() || mat[(2,2)] != F::one() || mat[(1,0)] != F::zero() {
            bail!("intrinsic matrix is not upper triangular with unit scale");
        }
        Ok(Perspective::new(fx,fy,mat[(0,2)],mat[(1,2)],mat[(0,1)]))
    }

    pub fn get_fx(&self) -> F {
        self.projection[(0,0)]
    }

    pub fn get_fy(&self) -> F {
        self.projection[(1,1)]
    }

    pub fn get_cx(&self) -> F {
        self.projection[(0,2)]
    }

    pub fn get_cy(&self) -> F {
        self.projection[(1,2)]
    }

    pub fn get_s(&self) -> F {
        self.projection[(0,1)]
    }

    /**
     * Intrinsics for the same sensor resampled by (scale_x, scale_y).
     */
    pub fn scaled(&self, scale_x: F, scale_y: F) -> Perspective<F> {
        Perspective::new(self.get_fx()*scale_x,self.get_fy()*scale_y,self.get_cx()*scale_x,self.get_cy()*scale_y,self.get_s()*scale_x)
    }
}

impl<F: GenericFloat> Camera<F> for Perspective<F> {

    fn project(&self, position: &Vector3<F>) -> Option<Point<F>> {
        let z = position[2];
        match z {
            z if num_traits::Float::abs(z) > F::zero() => {
                let homogeneous = position/z;
                let projected_coordiantes = self.projection*homogeneous;
                Some(Point::<F>::new(projected_coordiantes[0],projected_coordiantes[1]))
            },
            _ => None
        }
    }

    fn get_focal_x(&self) -> F {
        self.get_fx()
    }

    fn get_focal_y(&self) -> F {
        self.get_fy()
    }
}
