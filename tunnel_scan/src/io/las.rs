use std::fs::File;
use std::io::Read;
use std::path::Path;

use las::{point::Format, Builder, Reader, Version, Writer};
use log::{debug, info};

use crate::cloud::{CrsHint, PointSet, ScanHeader};
use crate::error::{Result, ScanError};
use crate::geometry::{Bounds3, Point3};
use crate::io::validate_scan_file;
use crate::progress::Monitor;

const LAS_SIGNATURE: &[u8; 4] = b"LASF";
const PROJECTION_USER_ID: &str = "LASF_Projection";
const WKT_RECORD_ID: u16 = 2112;
const GEOKEY_RECORD_ID: u16 = 34735;
const REPORT_EVERY: u64 = 100_000;

fn check_signature(path: &str) -> Result<()> {
    let mut magic = [0u8; 4];
    File::open(path)?.read_exact(&mut magic)?;
    if &magic != LAS_SIGNATURE {
        return Err(ScanError::format(path, "missing LASF signature"));
    }
    Ok(())
}

fn open_reader(path: &str) -> Result<Reader> {
    validate_scan_file(path)?;
    check_signature(path)?;
    Reader::from_path(path).map_err(|e| ScanError::format(path, e.to_string()))
}

fn crs_hint(header: &las::Header) -> CrsHint {
    let mut hint = CrsHint::None;
    for vlr in header.vlrs() {
        if vlr.user_id.trim_end_matches('\0') != PROJECTION_USER_ID {
            continue;
        }
        match vlr.record_id {
            WKT_RECORD_ID => {
                let wkt = String::from_utf8_lossy(&vlr.data)
                    .trim_end_matches('\0')
                    .to_string();
                return CrsHint::Wkt(wkt);
            }
            GEOKEY_RECORD_ID => hint = CrsHint::GeoTiffKeys,
            _ => {}
        }
    }
    hint
}

fn scan_header(path: &str, header: &las::Header) -> ScanHeader {
    let b = header.bounds();
    let version = header.version();
    ScanHeader {
        path: Path::new(path).to_path_buf(),
        point_count: header.number_of_points(),
        bounds: Bounds3 {
            min: Point3::new(b.min.x, b.min.y, b.min.z),
            max: Point3::new(b.max.x, b.max.y, b.max.z),
        },
        version: format!("{}.{}", version.major, version.minor),
        point_format: header.point_format().to_u8().unwrap_or_default(),
        system_identifier: header.system_identifier().to_string(),
        generating_software: header.generating_software().to_string(),
        crs: crs_hint(header),
    }
}

/// Reads only the header of a LAS or LAZ file.
pub fn read_header(path: &str) -> Result<ScanHeader> {
    let reader = open_reader(path)?;
    Ok(scan_header(path, reader.header()))
}

/// Loads all points of a LAS or LAZ file.
pub fn load_point_set(path: &str) -> Result<(PointSet, ScanHeader)> {
    load_point_set_with(path, &Monitor::new())
}

/// Loads all points of a LAS or LAZ file, reporting progress to `monitor`.
///
/// Fails with [`ScanError::FileFormat`] when the stream ends before the
/// number of points declared in the header.
pub fn load_point_set_with(path: &str, monitor: &Monitor) -> Result<(PointSet, ScanHeader)> {
    let mut reader = open_reader(path)?;
    let header = scan_header(path, reader.header());
    let declared = header.point_count;
    debug!("{}: header declares {} points", path, declared);

    let capacity = usize::try_from(declared).unwrap_or(0);
    let mut points = Vec::with_capacity(capacity);
    let mut intensity = Vec::with_capacity(capacity);
    let mut return_number = Vec::with_capacity(capacity);
    for (i, wrapped) in reader.points().enumerate() {
        let p = wrapped.map_err(|e| ScanError::format(path, format!("point {}: {}", i, e)))?;
        points.push(Point3::new(p.x, p.y, p.z));
        intensity.push(p.intensity);
        return_number.push(p.return_number);
        let read = i as u64 + 1;
        if read % REPORT_EVERY == 0 {
            monitor.checkpoint()?;
            monitor.report(read, declared, format!("Loading points ({read}/{declared})"));
        }
    }
    if (points.len() as u64) < declared {
        return Err(ScanError::format(
            path,
            format!("header declares {} points but only {} could be read", declared, points.len()),
        ));
    }
    monitor.report(declared, declared, "Points loaded");
    info!("Loaded {} points from {}", points.len(), path);
    Ok((
        PointSet::with_attributes(points, Some(intensity), Some(return_number)),
        header,
    ))
}

/// Writes a point set to a LAS file (version 1.2, point format 0).
/// Compression is inferred from the file extension when the `laz` feature
/// is enabled.
pub fn write_points_las(path: &str, set: &PointSet) -> Result<()> {
    let mut builder = Builder::default();
    builder.version = Version::new(1, 2);
    builder.point_format = Format::new(0).map_err(|e| ScanError::format(path, e.to_string()))?;
    builder.generating_software = "tunnel_scan".to_string();
    let header = builder
        .into_header()
        .map_err(|e| ScanError::format(path, e.to_string()))?;
    let mut writer =
        Writer::from_path(path, header).map_err(|e| ScanError::format(path, e.to_string()))?;
    let intensity = set.intensity();
    let returns = set.return_number();
    for (i, p) in set.points().iter().enumerate() {
        let lp = las::Point {
            x: p.x,
            y: p.y,
            z: p.z,
            intensity: intensity.map(|v| v[i]).unwrap_or_default(),
            return_number: returns.map(|v| v[i]).unwrap_or(1),
            number_of_returns: returns.map(|v| v[i]).unwrap_or(1),
            ..Default::default()
        };
        writer
            .write_point(lp)
            .map_err(|e| ScanError::format(path, e.to_string()))?;
    }
    writer.close().map_err(|e| ScanError::format(path, e.to_string()))
}
