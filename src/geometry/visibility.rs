use crate::image::Image;
use crate::Float;

/**
 * Removes samples that lie behind a nearer surface: a pixel is dropped when it is more than
 * `threshold` farther than the nearest valid neighbour within `radius`. Radius 0 disables it.
 */
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct VisibilityFilter {
    pub radius: usize,
    pub threshold: Float
}

impl VisibilityFilter {
    pub fn new(radius: usize, threshold: Float) -> VisibilityFilter {
        VisibilityFilter{radius,threshold}
    }

    pub fn disabled() -> VisibilityFilter {
        VisibilityFilter{radius: 0, threshold: 0.0}
    }

    pub fn apply(&self, depth: &Image) -> Image {
        if self.radius == 0 {
            return depth.clone();
        }
        let (height, width) = (depth.height(), depth.width());
        let mut filtered = depth.clone();
        for r in 0..height {
            for c in 0..width {
                let d = depth.buffer[(r,c)];
                if d == 0.0 {
                    continue;
                }
                let r_range = r.saturating_sub(self.radius)..(r+self.radius+1).min(height);
                let nearest = r_range.flat_map(|rr| {
                    let c_range = c.saturating_sub(self.radius)..(c+self.radius+1).min(width);
                    c_range.map(move |cc| (rr,cc))
                })
                .filter(|&(rr,cc)| (rr,cc) != (r,c))
                .map(|p| depth.buffer[p])
                .filter(|&v| v > 0.0)
                .fold(Float::INFINITY, Float::min);
                if d - nearest > self.threshold {
                    filtered.buffer[(r,c)] = 0.0;
                }
            }
        }
        filtered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occluded_sample_is_removed() {
        let depth = Image::from_row_slice(3,3,&[
            5.0,5.0,5.0,
            5.0,40.0,5.0,
            5.0,5.0,5.0]);
        let filtered = VisibilityFilter::new(1,3.0).apply(&depth);
        assert_eq!(filtered.buffer[(1,1)],0.0);
        assert_eq!(filtered.count_nonzero(),8);
    }

    #[test]
    fn consistent_surface_survives() {
        let depth = Image::from_row_slice(3,1,&[10.0,11.0,12.5]);
        assert_eq!(VisibilityFilter::new(1,3.0).apply(&depth),depth);
    }

    #[test]
    fn isolated_sample_survives_and_radius_zero_is_identity() {
        let depth = Image::from_row_slice(3,3,&[0.0,0.0,0.0, 0.0,7.0,0.0, 0.0,0.0,0.0]);
        assert_eq!(VisibilityFilter::new(2,0.1).apply(&depth),depth);
        let occluded = Image::from_row_slice(2,1,&[1.0,50.0]);
        assert_eq!(VisibilityFilter::disabled().apply(&occluded),occluded);
    }
}
