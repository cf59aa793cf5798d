use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use inmet::core::{FitParams, GeometryEngine, OrbitFitter};
use inmet::io::{
    read_coordinate_records, read_fit_file, write_fit_file, write_geometry_records,
    write_positions, OrbitReader,
};
use inmet::types::CoordinateMode;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

/// Orbit fitting and radar look-angle calculation
#[derive(Parser)]
#[command(name = "inmet", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fit polynomials to (t, x, y, z) orbit records
    FitOrbit(FitOrbitArgs),
    /// Evaluate a fitted orbit over its time window
    EvalOrbit(EvalOrbitArgs),
    /// Azimuth and incidence angles for ground points
    AziInc(AziIncArgs),
}

#[derive(Args)]
struct FitOrbitArgs {
    /// (ascii, in) file with t x y z rows
    coords: PathBuf,
    /// Degree of the fitted polynomials
    deg: usize,
    /// 1 = subtract mean time and coordinates before fitting, 0 = no centering
    #[arg(value_parser = clap::value_parser!(u8).range(0..=1))]
    centered: u8,
    /// (ascii, out) fitted orbit parameters
    fit_file: PathBuf,
}

#[derive(Args)]
struct EvalOrbitArgs {
    /// (ascii, in) fitted orbit parameters
    fit_file: PathBuf,
    /// Number of steps between t_min and t_max
    nstep: usize,
    /// Coordinates are multiplied by this number
    multiply: f64,
    /// (ascii, out) t x y z rows
    outfile: PathBuf,
}

#[derive(Args)]
struct AziIncArgs {
    /// (ascii, in) fitted orbit parameters
    fit_file: PathBuf,
    /// (binary, in) ground coordinates, three f64 per point
    coords: PathBuf,
    /// xyz for WGS-84 Cartesian, llh for WGS-84 lon., lat. (degrees), height
    mode: String,
    /// Maximum number of iterations of the closest-approach search
    max_iter: usize,
    /// (binary, out) azimuth, incidence pairs
    outfile: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();

    match Cli::parse().command {
        Command::FitOrbit(args) => fit_orbit(args),
        Command::EvalOrbit(args) => eval_orbit(args),
        Command::AziInc(args) => azi_inc(args),
    }
}

fn fit_orbit(args: FitOrbitArgs) -> Result<()> {
    let samples = OrbitReader::read_samples(&args.coords)
        .with_context(|| format!("could not read orbit records {}", args.coords.display()))?;

    let fitter = OrbitFitter::new(FitParams {
        degree: args.deg,
        centered: args.centered == 1,
    });
    let model = fitter.fit(&samples).context("orbit fitting failed")?;

    write_fit_file(&args.fit_file, &model)
        .with_context(|| format!("could not write {}", args.fit_file.display()))?;
    Ok(())
}

fn eval_orbit(args: EvalOrbitArgs) -> Result<()> {
    let model = read_fit_file(&args.fit_file)
        .with_context(|| format!("could not read orbit fit file {}", args.fit_file.display()))?;

    let rows: Vec<_> = model
        .sample_trajectory(args.nstep)?
        .into_iter()
        .map(|(t, p)| (t, p * args.multiply))
        .collect();

    let mut out = BufWriter::new(File::create(&args.outfile)?);
    write_positions(&mut out, &rows)
        .with_context(|| format!("could not write {}", args.outfile.display()))?;
    Ok(())
}

fn azi_inc(args: AziIncArgs) -> Result<()> {
    let mode: CoordinateMode = args.mode.parse()?;
    let model = read_fit_file(&args.fit_file)
        .with_context(|| format!("could not read orbit fit file {}", args.fit_file.display()))?;

    let mut input = BufReader::new(
        File::open(&args.coords)
            .with_context(|| format!("could not open {}", args.coords.display()))?,
    );
    let coords = read_coordinate_records(&mut input)?;

    let engine = GeometryEngine::new(&model, args.max_iter)?;
    let angles = engine.compute_array(coords.view(), mode)?;

    let mut out = BufWriter::new(File::create(&args.outfile)?);
    write_geometry_records(&mut out, &angles)
        .with_context(|| format!("could not write {}", args.outfile.display()))?;
    log::info!("Wrote {} azimuth/incidence pairs to {}", angles.nrows(), args.outfile.display());
    Ok(())
}
