//! NTv2 grid shift file parsing and sub-grid selection

use std::collections::HashMap;
use std::path::Path;
use serde::Serialize;
use tracing::{debug, info};
use crate::error::{Error, Result};
use crate::io::{open_resource, BinaryCursor, ByteOrder, Resource, SeekableReader};
use super::grid::{GridShiftGrid, ShiftValue};
use super::records::{self, OverviewHeader, SubGridHeader, END_LABEL, HEADER_RECORDS};

/// Bytes per node record (four f32)
const NODE_LEN: u64 = 16;

/// Parent name marking a root sub-grid
const NO_PARENT: &str = "NONE";

/// A parsed grid shift file
///
/// Immutable after [`GridShiftFile::load`]; every sub-grid is read eagerly so
/// concurrent readers never race on lazy loads.
#[derive(Debug, Clone, Serialize)]
pub struct GridShiftFile {
    pub name: String,
    pub byte_order: ByteOrder,
    pub header: OverviewHeader,
    grids: Vec<GridShiftGrid>,
    /// Sub-grid indices by ascending area, ties in file order
    precedence: Vec<usize>,
}

impl GridShiftFile {
    /// Opens and parses a `.gsb` file (`.gsb.gz` is inflated in memory)
    pub fn open<P: AsRef<Path>>(path: P, use_mmap: bool) -> Result<Self> {
        let resource = open_resource(path, use_mmap);
        Self::load(resource.as_ref())
    }

    /// Parses a grid shift file from a resource
    pub fn load(resource: &dyn Resource) -> Result<Self> {
        let mut cursor = resource.cursor(ByteOrder::LittleEndian)?;
        let byte_order = detect_byte_order(&mut cursor)?;
        cursor.set_byte_order(byte_order);

        let header = OverviewHeader::read(&mut cursor)?;
        let scale = header.units.to_seconds();
        debug!(
            resource = resource.name(),
            byte_order = byte_order.label(),
            sub_grids = header.num_file,
            units = %header.gs_type,
            "read NTv2 overview"
        );

        let mut grids = Vec::with_capacity((header.num_file as usize).min(1024));
        loop {
            let offset = cursor.position();
            let label = records::read_label(&mut cursor)?;
            if label == END_LABEL {
                break;
            }
            if label != "SUB_NAME" {
                return Err(Error::MalformedGridFile(format!(
                    "expected SUB_NAME or END at offset {}, found {:?}",
                    offset, label
                )));
            }

            let sub_header = SubGridHeader::read_after_name(&mut cursor)?;
            grids.push(read_grid(&mut cursor, sub_header, scale)?);
        }

        if grids.len() != header.num_file as usize {
            return Err(Error::MalformedGridFile(format!(
                "NUM_FILE is {} but {} sub-grids were found",
                header.num_file,
                grids.len()
            )));
        }

        link_parents(&mut grids)?;
        let precedence = precedence_order(&grids);

        info!(
            resource = resource.name(),
            sub_grids = grids.len(),
            from = %header.system_from,
            to = %header.system_to,
            "loaded grid shift file"
        );

        Ok(Self {
            name: resource.name().to_string(),
            byte_order,
            header,
            grids,
            precedence,
        })
    }

    /// Sub-grids in file order
    pub fn grids(&self) -> &[GridShiftGrid] {
        &self.grids
    }

    /// Sub-grids from most to least specific
    pub fn grids_by_precedence(&self) -> impl Iterator<Item = &GridShiftGrid> {
        self.precedence.iter().map(|&i| &self.grids[i])
    }

    /// Root sub-grids (no parent)
    pub fn roots(&self) -> impl Iterator<Item = &GridShiftGrid> {
        self.grids.iter().filter(|g| g.parent_index.is_none())
    }

    /// Most specific sub-grid whose closed bounding box contains the point
    ///
    /// Coordinates are arc-seconds with longitude positive west.
    pub fn resolve_grid(&self, lon_pw: f64, lat: f64) -> Option<&GridShiftGrid> {
        self.grids_by_precedence().find(|g| g.contains(lon_pw, lat))
    }

    /// Shift at a point in arc-seconds (longitude positive west)
    pub fn interpolate(&self, lon_pw: f64, lat: f64) -> Option<ShiftValue> {
        self.resolve_grid(lon_pw, lat)?.interpolate(lon_pw, lat)
    }
}

fn detect_byte_order<R: SeekableReader>(cursor: &mut BinaryCursor<R>) -> Result<ByteOrder> {
    let start = cursor.position();
    let first = cursor.at_offset(start + 8, |c| c.read_array::<4>())?;
    ByteOrder::from_known_u32(first, HEADER_RECORDS as u32).ok_or_else(|| {
        Error::MalformedGridFile("NUM_OREC is not 11 in either byte order".to_string())
    })
}

fn read_grid<R: SeekableReader>(
    cursor: &mut BinaryCursor<R>,
    header: SubGridHeader,
    scale: f64,
) -> Result<GridShiftGrid> {
    let (rows, cols) = header.dimensions()?;
    let count = rows * cols;
    cursor.ensure_range(cursor.position(), count as u64 * NODE_LEN)?;

    let mut lat_shift = Vec::with_capacity(count);
    let mut lon_shift = Vec::with_capacity(count);
    let mut lat_accuracy = Vec::with_capacity(count);
    let mut lon_accuracy = Vec::with_capacity(count);

    for _ in 0..count {
        lat_shift.push(cursor.read_f32()? as f64 * scale);
        lon_shift.push(cursor.read_f32()? as f64 * scale);
        lat_accuracy.push(cursor.read_f32()? as f64 * scale);
        lon_accuracy.push(cursor.read_f32()? as f64 * scale);
    }

    debug!(name = %header.name, rows, cols, parent = %header.parent, "read sub-grid");

    let parent = (!header.parent.eq_ignore_ascii_case(NO_PARENT)).then_some(header.parent);

    Ok(GridShiftGrid {
        name: header.name,
        parent,
        created: header.created,
        updated: header.updated,
        south: header.south * scale,
        north: header.north * scale,
        east: header.east * scale,
        west: header.west * scale,
        lat_inc: header.lat_inc * scale,
        lon_inc: header.lon_inc * scale,
        rows,
        cols,
        parent_index: None,
        children: Vec::new(),
        lat_shift,
        lon_shift,
        lat_accuracy,
        lon_accuracy,
    })
}

fn link_parents(grids: &mut [GridShiftGrid]) -> Result<()> {
    let mut by_name = HashMap::with_capacity(grids.len());
    for (index, grid) in grids.iter().enumerate() {
        if by_name.insert(grid.name.clone(), index).is_some() {
            return Err(Error::MalformedGridFile(format!("duplicate sub-grid name {:?}", grid.name)));
        }
    }

    for index in 0..grids.len() {
        let Some(parent) = grids[index].parent.clone() else {
            continue;
        };
        let &parent_index = by_name.get(&parent).ok_or_else(|| {
            Error::MalformedGridFile(format!(
                "sub-grid {:?} names unknown parent {:?}",
                grids[index].name, parent
            ))
        })?;
        if parent_index == index {
            return Err(Error::MalformedGridFile(format!(
                "sub-grid {:?} is its own parent",
                parent
            )));
        }
        grids[index].parent_index = Some(parent_index);
        grids[parent_index].children.push(index);
    }
    Ok(())
}

fn precedence_order(grids: &[GridShiftGrid]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..grids.len()).collect();
    // Stable sort keeps file order among equal areas.
    order.sort_by(|&a, &b| grids[a].area().total_cmp(&grids[b].area()));
    order
}
