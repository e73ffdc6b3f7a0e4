use std::collections::HashMap;
use color_eyre::eyre::{Result, eyre, bail};

use crate::io::{Attributes, Payload, Record, RecordKey, RecordKind, RecordStore, RecordType};
use crate::geometry::voxel_grid::{VoxelCell, VoxelGeometry, VoxelIndex};
use crate::image::color::ChannelOrder;
use crate::numerics::pose::Pose;
use crate::Float;

/**
 * Store holding every record in memory. Used for tests and for sequences small enough to preload.
 */
#[derive(Debug,Clone,Default)]
pub struct MemoryStore {
    records: HashMap<RecordKey,Record>,
    sample_count: usize
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    pub fn insert(&mut self, key: RecordKey, record: Record) -> Result<()> {
        if record.attributes.record_type.kind() != key.kind {
            bail!("record tagged {:?} cannot be stored under {}", record.attributes.record_type, key);
        }
        self.sample_count = self.sample_count.max(key.sample+1);
        self.records.insert(key,record);
        Ok(())
    }

    pub fn insert_color(&mut self, sample: usize, link: usize, width: usize, height: usize, order: ChannelOrder, data: Vec<u8>) -> Result<()> {
        let record_type = match order {
            ChannelOrder::Rgb => RecordType::Rgb8,
            ChannelOrder::Bgr => RecordType::Bgr8
        };
        let record = Record::new(Payload::U8(data),Attributes::new(record_type,vec![height,width,3]))?;
        self.insert(RecordKey::new(RecordKind::Color,sample,link),record)
    }

    /**
     * Row-major 3x3 intrinsic matrix calibrated for an image of `source_size` (height, width).
     */
    pub fn insert_intrinsic(&mut self, sample: usize, link: usize, matrix: [Float;9], source_size: Option<(usize,usize)>) -> Result<()> {
        let mut attributes = Attributes::new(RecordType::Intrinsic,vec![3,3]);
        attributes.source_size = source_size;
        let record = Record::new(Payload::F64(matrix.to_vec()),attributes)?;
        self.insert(RecordKey::new(RecordKind::Intrinsic,sample,link),record)
    }

    pub fn insert_pose(&mut self, sample: usize, link: usize, pose: &Pose) -> Result<()> {
        let record = Record::new(Payload::F64(pose.to_array().to_vec()),Attributes::new(RecordType::Pose,vec![7]))?;
        self.insert(RecordKey::new(RecordKind::Pose,sample,link),record)
    }

    pub fn insert_points(&mut self, sample: usize, link: usize, points: &[[Float;3]]) -> Result<()> {
        let data = points.iter().flat_map(|p| p.iter().copied()).collect::<Vec<Float>>();
        let record = Record::new(Payload::F64(data),Attributes::new(RecordType::Points,vec![points.len(),3]))?;
        self.insert(RecordKey::new(RecordKind::Points,sample,link),record)
    }

    /**
     * Stores a sparse voxel map as two aligned tables: occupied indices and one [x, y, z, label] row per index.
     */
    pub fn insert_voxels(&mut self, sample: usize, link: usize, geometry: &VoxelGeometry, voxels: &[(VoxelIndex,VoxelCell)]) -> Result<()> {
        let indices = voxels.iter().flat_map(|(idx,_)| idx.iter().map(|&i| i as Float)).collect::<Vec<Float>>();
        let cells = voxels.iter().flat_map(|(_,cell)| cell.to_row()).collect::<Vec<Float>>();

        let index_record = Record::new(Payload::F64(indices),Attributes::new(RecordType::VoxelIndices,vec![voxels.len(),3]))?;
        let mut attributes = Attributes::new(RecordType::VoxelSemantic3d,vec![voxels.len(),VoxelCell::ROW_WIDTH]);
        geometry.write_attributes(&mut attributes);
        let cell_record = Record::new(Payload::F64(cells),attributes)?;

        self.insert(RecordKey::new(RecordKind::VoxelIndices,sample,link),index_record)?;
        self.insert(RecordKey::new(RecordKind::Voxels,sample,link),cell_record)
    }

    pub fn get_mut(&mut self, key: &RecordKey) -> Option<&mut Record> {
        self.records.get_mut(key)
    }

    fn get(&self, key: &RecordKey) -> Result<&Record> {
        self.records.get(key).ok_or_else(|| eyre!("no record stored under {}", key))
    }
}

impl RecordStore for MemoryStore {
    fn len(&self) -> usize {
        self.sample_count
    }

    fn attributes(&self, key: &RecordKey) -> Result<Attributes> {
        Ok(self.get(key)?.attributes.clone())
    }

    fn fetch(&self, key: &RecordKey) -> Result<Record> {
        Ok(self.get(key)?.clone())
    }

    fn fetch_rows(&self, key: &RecordKey, rows: &[usize]) -> Result<Vec<Float>> {
        let record = self.get(key)?;
        let row_count = record.attributes.shape.first().copied().unwrap_or(0);
        let row_width = record.attributes.row_width();
        let values = record.payload.to_floats();
        let mut out = Vec::<Float>::with_capacity(rows.len()*row_width);
        for &row in rows {
            if row >= row_count {
                bail!("row {} out of bounds for {} with {} rows", row, key, row_count);
            }
            out.extend_from_slice(&values[row*row_width..(row+1)*row_width]);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_rows_reads_selected_rows() {
        let mut store = MemoryStore::new();
        store.insert_points(0,0,&[[1.0,2.0,3.0],[4.0,5.0,6.0],[7.0,8.0,9.0]]).unwrap();
        let key = RecordKey::new(RecordKind::Points,0,0);
        assert_eq!(store.fetch_rows(&key,&[2,0]).unwrap(),vec![7.0,8.0,9.0,1.0,2.0,3.0]);
        assert!(store.fetch_rows(&key,&[3]).is_err());
    }

    #[test]
    fn missing_records_are_errors() {
        let store = MemoryStore::new();
        assert!(store.fetch(&RecordKey::new(RecordKind::Pose,0,0)).is_err());
        assert_eq!(store.len(),0);
    }

    #[test]
    fn type_tag_must_match_kind() {
        let mut store = MemoryStore::new();
        let record = Record::new(Payload::F64(vec![0.0;7]),Attributes::new(RecordType::Pose,vec![7])).unwrap();
        assert!(store.insert(RecordKey::new(RecordKind::Points,0,0),record).is_err());
    }

    #[test]
    fn sample_count_follows_highest_key() {
        let mut store = MemoryStore::new();
        store.insert_pose(4,0,&Pose::identity()).unwrap();
        assert_eq!(store.len(),5);
    }
}
