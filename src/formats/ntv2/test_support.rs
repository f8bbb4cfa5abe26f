//! Synthesizes NTv2 byte streams for tests

use crate::io::ByteOrder;

/// One sub-grid to encode; bounds and increments in file units
#[derive(Debug, Clone)]
pub struct SubGridSpec {
    pub name: String,
    pub parent: String,
    pub south: f64,
    pub north: f64,
    pub east: f64,
    pub west: f64,
    pub lat_inc: f64,
    pub lon_inc: f64,
    /// (lat shift, lon shift, lat accuracy, lon accuracy), south→north, east→west
    pub nodes: Vec<[f32; 4]>,
    pub count_override: Option<i32>,
}

impl SubGridSpec {
    /// Grid whose node values come from `f(row, col) -> (lat shift, lon shift)`
    pub fn from_fn(
        name: &str,
        parent: &str,
        (south, north): (f64, f64),
        (east, west): (f64, f64),
        inc: f64,
        f: impl Fn(usize, usize) -> (f32, f32),
    ) -> Self {
        let rows = ((north - south) / inc).round() as usize + 1;
        let cols = ((west - east) / inc).round() as usize + 1;
        let mut nodes = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                let (lat, lon) = f(row, col);
                nodes.push([lat, lon, 0.05, 0.05]);
            }
        }
        Self {
            name: name.to_string(),
            parent: parent.to_string(),
            south,
            north,
            east,
            west,
            lat_inc: inc,
            lon_inc: inc,
            nodes,
            count_override: None,
        }
    }

    /// Grid with the same shift at every node
    pub fn uniform(
        name: &str,
        parent: &str,
        lat: (f64, f64),
        lon: (f64, f64),
        inc: f64,
        lat_shift: f32,
        lon_shift: f32,
    ) -> Self {
        Self::from_fn(name, parent, lat, lon, inc, |_, _| (lat_shift, lon_shift))
    }
}

pub struct GsbBuilder {
    order: ByteOrder,
    gs_type: String,
    num_file: Option<i32>,
    grids: Vec<SubGridSpec>,
}

impl GsbBuilder {
    pub fn new(order: ByteOrder) -> Self {
        Self {
            order,
            gs_type: "SECONDS".to_string(),
            num_file: None,
            grids: Vec::new(),
        }
    }

    pub fn gs_type(mut self, gs_type: &str) -> Self {
        self.gs_type = gs_type.to_string();
        self
    }

    pub fn num_file(mut self, num_file: i32) -> Self {
        self.num_file = Some(num_file);
        self
    }

    pub fn grid(mut self, spec: SubGridSpec) -> Self {
        self.grids.push(spec);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let num_file = self.num_file.unwrap_or(self.grids.len() as i32);

        self.int(&mut out, "NUM_OREC", 11);
        self.int(&mut out, "NUM_SREC", 11);
        self.int(&mut out, "NUM_FILE", num_file);
        self.text(&mut out, "GS_TYPE", &self.gs_type);
        self.text(&mut out, "VERSION", "NTv2.0");
        self.text(&mut out, "SYSTEM_F", "NAD27");
        self.text(&mut out, "SYSTEM_T", "NAD83");
        self.double(&mut out, "MAJOR_F", 6378206.4);
        self.double(&mut out, "MINOR_F", 6356583.8);
        self.double(&mut out, "MAJOR_T", 6378137.0);
        self.double(&mut out, "MINOR_T", 6356752.314);

        for grid in &self.grids {
            self.text(&mut out, "SUB_NAME", &grid.name);
            self.text(&mut out, "PARENT", &grid.parent);
            self.text(&mut out, "CREATED", "20260101");
            self.text(&mut out, "UPDATED", "20260101");
            self.double(&mut out, "S_LAT", grid.south);
            self.double(&mut out, "N_LAT", grid.north);
            self.double(&mut out, "E_LONG", grid.east);
            self.double(&mut out, "W_LONG", grid.west);
            self.double(&mut out, "LAT_INC", grid.lat_inc);
            self.double(&mut out, "LONG_INC", grid.lon_inc);
            let count = grid.count_override.unwrap_or(grid.nodes.len() as i32);
            self.int(&mut out, "GS_COUNT", count);

            for node in &grid.nodes {
                for value in node {
                    out.extend(match self.order {
                        ByteOrder::LittleEndian => value.to_le_bytes(),
                        ByteOrder::BigEndian => value.to_be_bytes(),
                    });
                }
            }
        }

        out.extend(label("END"));
        out.extend([0u8; 8]);
        out
    }

    fn int(&self, out: &mut Vec<u8>, name: &str, value: i32) {
        out.extend(label(name));
        out.extend(match self.order {
            ByteOrder::LittleEndian => value.to_le_bytes(),
            ByteOrder::BigEndian => value.to_be_bytes(),
        });
        out.extend([0u8; 4]);
    }

    fn text(&self, out: &mut Vec<u8>, name: &str, value: &str) {
        out.extend(label(name));
        out.extend(label(value));
    }

    fn double(&self, out: &mut Vec<u8>, name: &str, value: f64) {
        out.extend(label(name));
        out.extend(match self.order {
            ByteOrder::LittleEndian => value.to_le_bytes(),
            ByteOrder::BigEndian => value.to_be_bytes(),
        });
    }
}

fn label(text: &str) -> [u8; 8] {
    let mut field = [b' '; 8];
    for (slot, byte) in field.iter_mut().zip(text.bytes()) {
        *slot = byte;
    }
    field
}
