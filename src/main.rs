use std::path::PathBuf;
use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use skyforest_geodesy::{
    CoordinatesOperationPoint, CrsRegistry, GeoInfo, GridShift, GridShiftFile, Terminator, TiffReader,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Grid shifts, CRS lookup and TIFF directory inspection", long_about = None)]
struct Args {
    /// Extra CRS catalog CSV (code,name,kind,horizontal,vertical)
    #[arg(long, global = true, value_name = "CSV")]
    catalog: Option<PathBuf>,

    /// Read files instead of memory-mapping them
    #[arg(long, global = true)]
    no_mmap: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the directories and georeferencing of a TIFF
    Info {
        tiff: PathBuf,

        /// Strip trailing NULs from ASCII values
        #[arg(long)]
        trim_nul: bool,
    },
    /// Print the header and sub-grid tree of an NTv2 file
    Grid { gsb: PathBuf },
    /// Shift one point (degrees) through an NTv2 file
    #[command(allow_negative_numbers = true)]
    Shift {
        #[arg(long, value_name = "GSB")]
        grid: PathBuf,

        /// Apply the inverse shift
        #[arg(long)]
        inverse: bool,

        lon: f64,
        lat: f64,
    },
    /// Resolve the compound system of a horizontal and a vertical id
    Compound { horizontal: u32, vertical: u32 },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();
    let use_mmap = !args.no_mmap;

    let mut registry = CrsRegistry::with_builtin();
    if let Some(path) = &args.catalog {
        let added = registry.load_csv_file(path)?;
        info!(added, "loaded catalog");
    }

    match args.command {
        Command::Info { tiff, trim_nul } => {
            let terminator = if trim_nul { Terminator::TrimNul } else { Terminator::Preserve };
            let mut reader = TiffReader::open_with_options(&tiff, use_mmap, terminator)?;
            let decoded = reader.read()?;
            println!("{}", decoded);

            let Some(dir) = decoded.main_directory() else {
                return Ok(());
            };
            if let Some(geo) = GeoInfo::from_directory(dir)? {
                println!("{}", geo);
                if let Some(extent) = dir.dimensions().and_then(|dims| geo.bounding_box(dims)) {
                    println!("  Bounding Box:");
                    println!("    Min: ({}, {})", extent.west, extent.south);
                    println!("    Max: ({}, {})", extent.east, extent.north);
                }
                match geo.resolve_crs(&registry) {
                    Ok(crs) => println!("  CRS: EPSG:{} {}", crs.id(), crs.name()),
                    Err(e) => println!("  CRS: unresolved ({})", e),
                }
            }
        }
        Command::Grid { gsb } => {
            let file = GridShiftFile::open(&gsb, use_mmap)?;
            let header = &file.header;
            println!("NTv2 File Information:");
            println!("  Name: {}", file.name);
            println!("  Byte order: {}", file.byte_order.label());
            println!("  Version: {}", header.version);
            println!("  Units: {}", header.gs_type);
            println!("  From: {} (a={}, b={})", header.system_from, header.major_from, header.minor_from);
            println!("  To: {} (a={}, b={})", header.system_to, header.major_to, header.minor_to);
            println!("  Sub-grids: {}", file.grids().len());

            for grid in file.grids() {
                println!(
                    "\n  {} (parent {}): {} x {} nodes",
                    grid.name,
                    grid.parent.as_deref().unwrap_or("NONE"),
                    grid.rows,
                    grid.cols
                );
                println!("    Lat: {} .. {} step {}", grid.south, grid.north, grid.lat_inc);
                println!("    Lon (positive west): {} .. {} step {}", grid.east, grid.west, grid.lon_inc);
                if !grid.children.is_empty() {
                    println!("    Children: {}", grid.children.len());
                }
            }
        }
        Command::Shift { grid, inverse, lon, lat } => {
            let mut shift = GridShift::open(&grid, use_mmap)?;
            if inverse {
                shift = shift.reversed();
            }

            let mut point = CoordinatesOperationPoint::from_lonlat(lon, lat);
            if !shift.apply_shift(&mut point) {
                bail!("({}, {}) is outside every sub-grid of {}", lon, lat, grid.display());
            }
            println!("{:.9} {:.9}", point.lon(), point.lat());
        }
        Command::Compound { horizontal, vertical } => {
            let compound = registry.get_compound(horizontal, vertical)?;
            println!("{}", compound);
            if !compound.registered {
                println!("  (synthesized id 0x{:08X})", compound.id);
            }
        }
    }

    Ok(())
}
