extern crate nalgebra as na;

use na::{Matrix3, Point3};
use color_eyre::eyre::{Result, WrapErr, bail, eyre};

use crate::geometry::voxel_grid::{VoxelCell, VoxelGeometry, VoxelIndex};
use crate::image::color::ColorImage;
use crate::io::{Attributes, Payload, Record, RecordKey, RecordKind, RecordStore, RecordType};
use crate::numerics::pose::Pose;
use crate::sensors::camera::perspective::Perspective;
use crate::Float;

fn expect_type(attributes: &Attributes, kind: RecordKind) -> Result<()> {
    if attributes.record_type.kind() != kind {
        bail!("record tagged {:?} read as {:?}", attributes.record_type, kind);
    }
    Ok(())
}

/**
 * Rows of a 2-D table: (row count, values per row).
 */
fn table_shape(attributes: &Attributes, min_width: usize) -> Result<(usize,usize)> {
    match attributes.shape.as_slice() {
        &[rows, width] if width >= min_width => Ok((rows,width)),
        shape => bail!("expected a table with at least {} columns, got shape {:?}", min_width, shape)
    }
}

pub fn color_image(record: &Record) -> Result<ColorImage> {
    expect_type(&record.attributes,RecordKind::Color)?;
    let order = record.attributes.record_type.channel_order().ok_or_else(|| eyre!("color record without channel order"))?;
    let (height, width) = match record.attributes.shape.as_slice() {
        &[h, w, 3] => (h,w),
        shape => bail!("color record has shape {:?}, expected [h, w, 3]", shape)
    };
    match &record.payload {
        Payload::U8(data) => ColorImage::from_interleaved(data,width,height,order),
        Payload::F64(_) => bail!("color record must hold 8 bit samples")
    }
}

pub fn points(record: &Record) -> Result<Vec<Point3<Float>>> {
    expect_type(&record.attributes,RecordKind::Points)?;
    let (rows, width) = table_shape(&record.attributes,3)?;
    let values = record.payload.to_floats();
    let points = (0..rows).map(|r| Point3::new(values[r*width],values[r*width+1],values[r*width+2]))
        .filter(|p| p.coords.iter().all(|v| v.is_finite()))
        .collect::<Vec<Point3<Float>>>();
    Ok(points)
}

pub fn voxel_indices(record: &Record) -> Result<Vec<VoxelIndex>> {
    expect_type(&record.attributes,RecordKind::VoxelIndices)?;
    let (rows, width) = table_shape(&record.attributes,3)?;
    let values = record.payload.to_floats();
    (0..rows).map(|r| {
        let row = &values[r*width..r*width+3];
        if row.iter().any(|&v| v < 0.0 || v.fract() != 0.0 || !v.is_finite()) {
            bail!("voxel index row {} is not a non negative integer triple: {:?}", r, row);
        }
        Ok([row[0] as usize,row[1] as usize,row[2] as usize])
    }).collect()
}

pub fn voxel_cells(values: &[Float]) -> Result<Vec<VoxelCell>> {
    if values.len() % VoxelCell::ROW_WIDTH != 0 {
        bail!("voxel payload of {} values is not a multiple of {}", values.len(), VoxelCell::ROW_WIDTH);
    }
    values.chunks(VoxelCell::ROW_WIDTH).map(VoxelCell::from_row).collect()
}

/**
 * Intrinsics and the (height, width) they were calibrated for, if recorded.
 */
pub fn intrinsic(record: &Record) -> Result<(Perspective<Float>,Option<(usize,usize)>)> {
    expect_type(&record.attributes,RecordKind::Intrinsic)?;
    let values = record.payload.to_floats();
    if values.len() != 9 {
        bail!("intrinsic record holds {} values, expected 9", values.len());
    }
    let camera = Perspective::from_matrix(&Matrix3::from_row_slice(&values))?;
    Ok((camera,record.attributes.source_size))
}

pub fn pose(record: &Record) -> Result<Pose> {
    expect_type(&record.attributes,RecordKind::Pose)?;
    Pose::from_slice(&record.payload.to_floats())
}

/**
 * Typed reads of one sample on one sensor link.
 */
pub struct SampleReader<'a> {
    pub store: &'a dyn RecordStore,
    pub sample: usize
}

impl<'a> SampleReader<'a> {
    pub fn new(store: &'a dyn RecordStore, sample: usize) -> SampleReader<'a> {
        SampleReader{store,sample}
    }

    pub fn key(&self, kind: RecordKind, link: usize) -> RecordKey {
        RecordKey::new(kind,self.sample,link)
    }

    fn fetch(&self, kind: RecordKind, link: usize) -> Result<Record> {
        let key = self.key(kind,link);
        self.store.fetch(&key).wrap_err_with(|| format!("failed to read {}", key))
    }

    pub fn color(&self, link: usize) -> Result<ColorImage> {
        color_image(&self.fetch(RecordKind::Color,link)?).wrap_err_with(|| format!("malformed {}", self.key(RecordKind::Color,link)))
    }

    pub fn points(&self, link: usize) -> Result<(Vec<Point3<Float>>,Attributes)> {
        let record = self.fetch(RecordKind::Points,link)?;
        let points = points(&record).wrap_err_with(|| format!("malformed {}", self.key(RecordKind::Points,link)))?;
        Ok((points,record.attributes))
    }

    pub fn voxel_layout(&self, link: usize) -> Result<(VoxelGeometry,Vec<VoxelIndex>,Attributes)> {
        let key = self.key(RecordKind::Voxels,link);
        let attributes = self.store.attributes(&key).wrap_err_with(|| format!("failed to read {}", key))?;
        expect_type(&attributes,RecordKind::Voxels)?;
        let geometry = VoxelGeometry::from_attributes(&attributes).wrap_err_with(|| format!("malformed {}", key))?;
        let indices = voxel_indices(&self.fetch(RecordKind::VoxelIndices,link)?).wrap_err_with(|| format!("malformed {}", self.key(RecordKind::VoxelIndices,link)))?;
        if attributes.shape.first() != Some(&indices.len()) {
            bail!("{} holds {:?} rows but its index table has {}", key, attributes.shape, indices.len());
        }
        Ok((geometry,indices,attributes))
    }

    pub fn voxel_rows(&self, link: usize, rows: &[usize]) -> Result<Vec<VoxelCell>> {
        let key = self.key(RecordKind::Voxels,link);
        let values = self.store.fetch_rows(&key,rows).wrap_err_with(|| format!("failed to read rows of {}", key))?;
        voxel_cells(&values).wrap_err_with(|| format!("malformed {}", key))
    }

    pub fn intrinsic(&self, link: usize) -> Result<(Perspective<Float>,Option<(usize,usize)>)> {
        intrinsic(&self.fetch(RecordKind::Intrinsic,link)?).wrap_err_with(|| format!("malformed {}", self.key(RecordKind::Intrinsic,link)))
    }

    pub fn pose(&self, link: usize) -> Result<Pose> {
        pose(&self.fetch(RecordKind::Pose,link)?).wrap_err_with(|| format!("malformed {}", self.key(RecordKind::Pose,link)))
    }
}
