extern crate nalgebra as na;

use na::{Vector3,Quaternion,UnitQuaternion,Isometry3,Translation3};
use color_eyre::eyre::{Result, bail};
use crate::Float;

/**
 * Sensor pose in the map frame: translation plus orientation as a unit quaternion.
 * The camera looks along +z of its own frame, x to the right and y downwards.
 */
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct Pose {
    pub translation: Vector3<Float>,
    pub rotation: UnitQuaternion<Float>
}

impl Pose {
    pub fn new(translation: Vector3<Float>, rotation: UnitQuaternion<Float>) -> Pose {
        Pose{translation,rotation}
    }

    pub fn identity() -> Pose {
        Pose{translation: Vector3::<Float>::zeros(), rotation: UnitQuaternion::<Float>::identity()}
    }

    /**
     * Parses the stored layout [tx, ty, tz, qx, qy, qz, qw].
     */
    pub fn from_slice(data: &[Float]) -> Result<Pose> {
        if data.len() != 7 {
            bail!("pose needs 7 values (translation + quaternion), got {}", data.len());
        }
        if data.iter().any(|v| !v.is_finite()) {
            bail!("pose contains non finite values: {:?}", data);
        }
        let translation = Vector3::<Float>::new(data[0],data[1],data[2]);
        let quaternion = Quaternion::<Float>::new(data[6],data[3],data[4],data[5]);
        if quaternion.norm() < 1e-9 {
            bail!("pose quaternion has zero norm");
        }
        Ok(Pose{translation, rotation: UnitQuaternion::from_quaternion(quaternion)})
    }

    pub fn to_array(&self) -> [Float;7] {
        let q = self.rotation.quaternion();
        [self.translation[0],self.translation[1],self.translation[2],q.i,q.j,q.k,q.w]
    }

    /**
     * Camera to map transform.
     */
    pub fn isometry(&self) -> Isometry3<Float> {
        Isometry3::<Float>::from_parts(Translation3::from(self.translation), self.rotation)
    }

    pub fn from_isometry(isometry: &Isometry3<Float>) -> Pose {
        Pose{translation: isometry.translation.vector, rotation: isometry.rotation}
    }

    pub fn world_to_camera(&self) -> Isometry3<Float> {
        self.isometry().inverse()
    }

    /**
     * Applies a perturbation expressed in the camera frame: map_T_cam * cam_T_perturbed.
     */
    pub fn compose(&self, delta: &Pose) -> Pose {
        Pose::from_isometry(&(self.isometry()*delta.isometry()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn slice_layout_is_xyzw() {
        let pose = Pose::from_slice(&[1.0,2.0,3.0,0.0,0.0,0.0,1.0]).unwrap();
        assert_eq!(pose.rotation,UnitQuaternion::identity());
        assert_eq!(pose.to_array(),[1.0,2.0,3.0,0.0,0.0,0.0,1.0]);
    }

    #[test]
    fn rejects_malformed_pose() {
        assert!(Pose::from_slice(&[0.0;6]).is_err());
        assert!(Pose::from_slice(&[0.0;7]).is_err());
    }

    #[test]
    fn world_point_moves_into_camera_frame() {
        let pose = Pose::new(Vector3::new(0.0,0.0,-5.0),UnitQuaternion::identity());
        let p = pose.world_to_camera()*Point3::new(0.0,0.0,5.0);
        assert!((p.z - 10.0).abs() < 1e-12);
    }
}
