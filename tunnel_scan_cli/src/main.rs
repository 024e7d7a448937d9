use clap::{Parser, Subcommand};
use log::debug;
use tunnel_scan::{
    cloud::Axis,
    config::{AppConfig, MatchRule},
    io::{
        csv::{write_profile_csv, write_section_csv},
        file_info,
        las::{read_header, write_points_las},
        suggest_output_path,
    },
    logging::init_logging,
    mesh::write_obj,
    Label, Monitor, Result, ScanError, Session,
};

/// Tunnel LiDAR scan analysis: classification, meshing, cross-sections and
/// design comparison.
#[derive(Parser)]
#[command(name = "tunnel_scan_cli", version)]
struct Cli {
    /// JSON configuration file; environment variables override it.
    #[arg(long, global = true)]
    config: Option<String>,
    /// Minimum wall height in metres.
    #[arg(long, global = true)]
    min_wall_height: Option<f64>,
    /// RANSAC inlier distance in metres.
    #[arg(long, global = true)]
    ransac_distance: Option<f64>,
    /// Seed of the RANSAC sampler.
    #[arg(long, global = true)]
    seed: Option<u64>,
    /// Smallest plane accepted during segmentation.
    #[arg(long, global = true)]
    min_plane_points: Option<usize>,
    /// Half thickness of cross-section slices in metres.
    #[arg(long, global = true)]
    tolerance: Option<f64>,
    /// Long axis of the tunnel (x or y).
    #[arg(long, global = true)]
    axis: Option<Axis>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print file and header information of a LAS/LAZ scan.
    Info { input: String },
    /// Classify ground and wall points.
    Classify {
        input: String,
        /// Write the ground and wall points to this LAS file.
        #[arg(long)]
        output: Option<String>,
    },
    /// Reconstruct a surface mesh and write it as OBJ.
    Mesh {
        input: String,
        output: Option<String>,
    },
    /// Extract a cross-section and write it as CSV.
    Section {
        input: String,
        position: f64,
        #[arg(long)]
        output: Option<String>,
        /// Write every slice sample instead of the boundary profile.
        #[arg(long)]
        samples: bool,
    },
    /// Compare a cross-section against a design profile.
    Compare {
        input: String,
        position: f64,
        design: String,
        /// Use the nearest design vertex instead of interpolation.
        #[arg(long)]
        nearest: bool,
    },
    /// Print a JSON summary of a full analysis run.
    Summary {
        input: String,
        #[arg(long)]
        position: Option<f64>,
        #[arg(long)]
        design: Option<String>,
    },
    /// Detect damage as points off the dominant surface.
    Damage { input: String },
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::from_json_file(path)?,
        None => AppConfig::from_env()?,
    };
    let analysis = &mut config.analysis;
    if let Some(v) = cli.min_wall_height {
        analysis.classifier.min_wall_height = v;
    }
    if let Some(v) = cli.ransac_distance {
        analysis.classifier.ransac_distance = v;
    }
    if let Some(v) = cli.seed {
        analysis.classifier.seed = v;
    }
    if let Some(v) = cli.min_plane_points {
        analysis.classifier.min_plane_points = v;
    }
    if let Some(v) = cli.tolerance {
        analysis.section.tolerance = v;
    }
    if let Some(v) = cli.axis {
        analysis.section.axis = v;
    }
    config.validate()?;
    Ok(config)
}

fn open_session(config: &AppConfig, input: &str) -> Result<Session> {
    let mut session = Session::new(config.analysis.clone());
    let monitor = Monitor::new().with_observer(|p| debug!("{}% {}", p.percent(), p.message));
    session.load(input, &monitor)?;
    Ok(session)
}

fn classified_session(config: &AppConfig, input: &str) -> Result<Session> {
    let mut session = open_session(config, input)?;
    session.classify(&Monitor::new())?;
    Ok(session)
}

fn run(cli: Cli, config: AppConfig) -> Result<()> {
    match cli.command {
        Commands::Info { input } => {
            let info = file_info(&input)?;
            let header = read_header(&input)?;
            println!("File: {} ({:.2} MB)", info.name, info.size_mb);
            println!("LAS version: {}", header.version);
            println!("Point format: {}", header.point_format);
            println!("Points: {}", header.point_count);
            let (min, max) = (header.bounds.min, header.bounds.max);
            println!(
                "Bounds: ({:.3}, {:.3}, {:.3}) - ({:.3}, {:.3}, {:.3})",
                min.x, min.y, min.z, max.x, max.y, max.z
            );
        }
        Commands::Classify { input, output } => {
            let session = classified_session(&config, &input)?;
            let Some(classified) = session.classification() else {
                return Err(ScanError::MissingInput("a classified point cloud"));
            };
            let stats = classified.stats();
            println!("Ground points: {}", stats.ground_points);
            for (i, n) in stats.wall_points.iter().enumerate() {
                println!("{} points: {}", Label::Wall(i + 1), n);
            }
            println!("Unclassified points: {}", stats.unclassified_points);
            if let Some(output) = output {
                let (subset, _) = classified.classified_subset();
                write_points_las(&output, &subset)?;
                println!("Wrote {} points to {}", subset.len(), output);
            }
        }
        Commands::Mesh { input, output } => {
            let mut session = classified_session(&config, &input)?;
            let mesh = session.reconstruct(&Monitor::new())?;
            let output = output.unwrap_or_else(|| {
                suggest_output_path(&input, "mesh.obj")
                    .to_string_lossy()
                    .into_owned()
            });
            write_obj(&output, mesh)?;
            println!(
                "Mesh: {} vertices, {} triangles written to {}",
                mesh.vertex_count(),
                mesh.face_count(),
                output
            );
        }
        Commands::Section {
            input,
            position,
            output,
            samples,
        } => {
            let mut session = classified_session(&config, &input)?;
            let section = session.extract_section(position, &Monitor::new())?;
            let output = output.unwrap_or_else(|| {
                suggest_output_path(&input, &format!("section_{position}.csv"))
                    .to_string_lossy()
                    .into_owned()
            });
            if samples {
                write_section_csv(&output, section)?;
            } else {
                write_profile_csv(&output, &section.profile)?;
            }
            println!(
                "Section at {}: {} samples, {} boundary vertices written to {}",
                position,
                section.samples.len(),
                section.profile.len(),
                output
            );
        }
        Commands::Compare {
            input,
            position,
            design,
            nearest,
        } => {
            let mut config = config;
            if nearest {
                config.analysis.compare.rule = MatchRule::NearestVertex;
            }
            let mut session = classified_session(&config, &input)?;
            session.extract_section(position, &Monitor::new())?;
            session.import_design(&design)?;
            let stats = &session.compare()?.stats;
            println!("Matched vertices: {} ({} outside design)", stats.matched, stats.unmatched);
            println!("Max deviation: {:.3}", stats.max_deviation);
            println!("Min deviation: {:.3}", stats.min_deviation);
            println!("Mean deviation: {:.3}", stats.mean_deviation);
            println!("RMS deviation: {:.3}", stats.rms_deviation);
            println!("Area difference: {:.3}", stats.area_difference);
        }
        Commands::Summary {
            input,
            position,
            design,
        } => {
            let mut session = classified_session(&config, &input)?;
            if let Some(position) = position {
                session.extract_section(position, &Monitor::new())?;
                if let Some(design) = design {
                    session.import_design(&design)?;
                    session.compare()?;
                }
            }
            println!("{}", session.summary(&config.model).to_json()?);
        }
        Commands::Damage { input } => {
            let mut session = open_session(&config, &input)?;
            let report = session.detect_damage(&Monitor::new())?;
            println!("Surface points: {}", report.surface_points);
            println!("Damage points: {}", report.damage_indices.len());
            println!("Max distance: {:.3}", report.max_distance);
            if let Some(extent) = report.extent {
                println!(
                    "Extent: {:.3} x {:.3} x {:.3}",
                    extent.length, extent.width, extent.depth
                );
            }
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Hint: {}", e.hint());
            std::process::exit(2);
        }
    };
    if let Ok(level) = config.log_level_filter() {
        init_logging(level);
    }
    if let Err(e) = run(cli, config) {
        eprintln!("Error: {}", e);
        eprintln!("Hint: {}", e.hint());
        std::process::exit(1);
    }
}
