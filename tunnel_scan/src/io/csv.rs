//! CSV import and export of cross-section profiles.
//!
//! Exported sections start with a short preamble naming the slice position
//! and tolerance, followed by `X,Z,Type` rows. Design profiles are read from
//! `X,Z` rows with an optional `Type` column; any preamble before the header
//! is skipped.

use std::fmt::Write as _;
use std::io;
use std::path::Path;

use log::info;

use crate::classify::Label;
use crate::cloud::Axis;
use crate::error::{Result, ScanError};
use crate::geometry::Point;
use crate::io::{read_lines, write_string};
use crate::section::{samples_by_label, CrossSection, Profile, ProfileVertex, Provenance};

const HEADER: &str = "X,Z,Type";

fn axis_key(axis: Axis) -> &'static str {
    match axis {
        Axis::X => "X",
        Axis::Y => "Y",
    }
}

/// Writes the ordered vertices of `profile` as `X,Z,Type` rows.
pub fn write_profile_csv(path: &str, profile: &Profile) -> Result<()> {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');
    for v in &profile.vertices {
        let _ = writeln!(out, "{},{},{}", v.point.x, v.point.y, v.label);
    }
    write_string(path, &out)?;
    info!("Wrote {} profile vertices to {}", profile.len(), path);
    Ok(())
}

/// Writes all samples of `section`, grouped by label, after a preamble with
/// the slice position and tolerance.
pub fn write_section_csv(path: &str, section: &CrossSection) -> Result<()> {
    let mut out = String::new();
    let _ = writeln!(out, "{},{}", axis_key(section.axis), section.position);
    let _ = writeln!(out, "Tol,{}", section.tolerance);
    out.push('\n');
    out.push_str(HEADER);
    out.push('\n');
    for (label, points) in samples_by_label(section) {
        for p in points {
            let _ = writeln!(out, "{},{},{}", p.x, p.y, label);
        }
    }
    write_string(path, &out)?;
    info!("Wrote {} section samples to {}", section.samples.len(), path);
    Ok(())
}

fn invalid(path: &str, reason: impl Into<String>) -> ScanError {
    ScanError::InvalidProfile {
        path: Path::new(path).to_path_buf(),
        reason: reason.into(),
    }
}

fn cells(line: &str) -> Vec<&str> {
    line.split(',').map(str::trim).collect()
}

fn is_header(cells: &[&str]) -> bool {
    cells.len() >= 2 && cells[0].eq_ignore_ascii_case("x") && cells[1].eq_ignore_ascii_case("z")
}

/// Parses the non-blank lines of `lines`, numbered from `first_line`.
fn parse_rows(path: &str, lines: &[String], first_line: usize) -> Result<Vec<ProfileVertex>> {
    let mut vertices = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        let line_no = first_line + idx + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let cells = cells(line);
        if cells.len() < 2 {
            return Err(invalid(path, format!("line {line_no}: expected at least two columns")));
        }
        let x: f64 = cells[0]
            .parse()
            .map_err(|_| invalid(path, format!("line {line_no}: invalid X value '{}'", cells[0])))?;
        let z: f64 = cells[1]
            .parse()
            .map_err(|_| invalid(path, format!("line {line_no}: invalid Z value '{}'", cells[1])))?;
        if !x.is_finite() || !z.is_finite() {
            return Err(invalid(path, format!("line {line_no}: coordinates must be finite")));
        }
        let label = match cells.get(2) {
            Some(raw) => raw
                .parse::<Label>()
                .map_err(|e| invalid(path, format!("line {line_no}: {e}")))?,
            None => Label::Unclassified,
        };
        vertices.push(ProfileVertex {
            point: Point::new(x, z),
            label,
        });
    }
    Ok(vertices)
}

/// Reads a design profile.
///
/// Lines before the `X,Z` header are ignored, as are blank lines after it.
/// A file without a header is accepted when every non-blank line is an
/// `X,Z` row. A third column, when present, holds the surface label of the
/// vertex. At least two vertices are required.
pub fn read_design_profile(path: &str) -> Result<Profile> {
    let lines = read_lines(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ScanError::FileNotFound {
            path: Path::new(path).to_path_buf(),
        },
        _ => ScanError::Io(e),
    })?;

    let vertices = match lines.iter().position(|line| is_header(&cells(line))) {
        Some(header) => parse_rows(path, &lines[header + 1..], header + 1)?,
        None => parse_rows(path, &lines, 0)
            .map_err(|_| invalid(path, "missing X,Z header and not every line is an X,Z row"))?,
    };
    if vertices.len() < 2 {
        return Err(invalid(
            path,
            format!("at least two points are required, found {}", vertices.len()),
        ));
    }
    info!("Read design profile with {} vertices from {}", vertices.len(), path);
    Ok(Profile::new(Provenance::Design, vertices))
}
