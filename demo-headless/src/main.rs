use clap::Parser;
use farm_wakes_core::variables as v;
use farm_wakes_core::{
    add_grid, add_row, points_dataset, AlgorithmConfig, Axis, Dataset, Downwind, EngineConfig,
    EngineContext, FarmSetup, Iterative, ModelBook, States, Vec3, WindFarm, RHO_STANDARD,
};
use tracing_subscriber::EnvFilter;

/// Wind farm wake calculation demo with configurable parameters
#[derive(Parser, Debug)]
#[command(name = "farm-wakes-demo")]
#[command(about = "Chunked wind farm wake calculation demo", long_about = None)]
struct Args {
    /// Turbines per row
    #[arg(short = 'n', long, default_value_t = 5)]
    turbines: usize,

    /// Number of rows (1 = single row along x)
    #[arg(long, default_value_t = 1)]
    rows: usize,

    /// Turbine spacing in meters
    #[arg(short, long, default_value_t = 500.0)]
    spacing: f64,

    /// Number of random states (0 = one uniform state from --ws/--wd/--ti)
    #[arg(long, default_value_t = 0)]
    states: usize,

    /// Seed of the random states
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Wind speed in m/s of the uniform state
    #[arg(long, default_value_t = 9.0)]
    ws: f64,

    /// Wind direction in degrees of the uniform state (270 = from the west)
    #[arg(long, default_value_t = 270.0)]
    wd: f64,

    /// Turbulence intensity of the uniform state
    #[arg(long, default_value_t = 0.05)]
    ti: f64,

    /// Wake models, comma separated (e.g. jensen,crespo_hernandez)
    #[arg(short, long, value_delimiter = ',', default_value = "jensen")]
    wake_models: Vec<String>,

    /// Partial wakes of every wake model (centre, grid<n2>)
    #[arg(long, default_value = "centre")]
    partial_wakes: String,

    /// Execution engine (single, pool, cluster)
    #[arg(short, long, default_value = "single")]
    engine: String,

    /// Worker count of the pool and cluster engines
    #[arg(long)]
    workers: Option<usize>,

    /// States per chunk (default: spread over the workers)
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Run the iterative algorithm with under-relaxation
    #[arg(short, long)]
    iterative: bool,

    /// Sample the wind speed on a line through the farm at hub height
    #[arg(long, default_value_t = 0)]
    line_points: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    println!("=== Wind Farm Wake Demo ===\n");

    let book = ModelBook::new();
    let names: Vec<&str> = args.wake_models.iter().map(String::as_str).collect();
    let config = AlgorithmConfig::default()
        .with_wake_models(&names)
        .with_partial_wakes(&args.partial_wakes);
    config.validate()?;
    let turbine_type = config.resolve_turbine_type(&book)?;

    let mut farm = WindFarm::new("demo");
    if args.rows > 1 {
        add_grid(
            &mut farm,
            [0.0, 0.0],
            [args.spacing, 0.0],
            [0.0, args.spacing],
            args.turbines,
            args.rows,
            &turbine_type,
        );
    } else {
        add_row(&mut farm, [0.0, 0.0], [args.spacing, 0.0], args.turbines, &turbine_type);
    }
    println!(
        "Farm: {} turbines of type {} ({:.0} m rotor, {:.0} m hub)",
        farm.n_turbines(),
        turbine_type.name,
        turbine_type.diameter,
        turbine_type.hub_height
    );

    let states = if args.states > 0 {
        States::random(args.states, args.seed)
    } else {
        States::uniform(args.ws, args.wd, args.ti, RHO_STANDARD)
    };
    println!("States: {}", states.n_states());
    println!("Wake models: {}\n", args.wake_models.join(", "));

    let mut engine_config = EngineConfig::named(&args.engine);
    if let Some(n) = args.workers {
        engine_config = engine_config.with_workers(n);
    }
    if let Some(size) = args.chunk_size {
        engine_config = engine_config.with_chunk_size_states(size);
    }
    let mut ctx = EngineContext::with_config(&engine_config)?;

    let setup = FarmSetup::from_config(farm, states, &config, &book)?;
    let weights: Vec<f64> = setup.states.as_slice().iter().map(|s| s.weight).collect();
    let hub_height = turbine_type.hub_height;

    let results = if args.iterative {
        let mut algo = Iterative::new(setup.clone(), &config);
        let results = algo.calc_farm(&ctx)?;
        println!(
            "Iterations: {} (converged: {})\n",
            algo.history().len(),
            algo.converged()
        );
        results
    } else {
        Downwind::new(setup.clone()).calc_farm(&ctx)?
    };

    print_turbine_table(&results, &weights)?;

    if args.line_points > 0 {
        // from one spacing upstream to one spacing behind the last turbine
        let x0 = -args.spacing;
        let length = args.spacing * (args.turbines as f64 + 1.0);
        let step = length / (args.line_points.max(2) - 1) as f64;
        let line: Vec<Vec3> = (0..args.line_points)
            .map(|i| Vec3::new(x0 + step * i as f64, 0.0, hub_height))
            .collect();
        let point_data = points_dataset(results.states().len(), &line);
        let points = Downwind::new(setup).calc_points(&ctx, &results, &point_data)?;
        let ws = points.var(v::WS)?;

        println!("\nWind speed along y = 0 (state 0)");
        println!("   x(m) | WS(m/s)");
        println!("--------|--------");
        for (i, p) in line.iter().enumerate() {
            println!("{:7.0} | {:7.3}", p.x, ws.get3(0, i, 0));
        }
    }

    ctx.finalize()?;
    Ok(())
}

/// Weighted mean of REWS, CT and P per turbine and the farm totals
fn print_turbine_table(
    results: &Dataset,
    weights: &[f64],
) -> Result<(), Box<dyn std::error::Error>> {
    let rews = results.var(v::REWS)?;
    let amb_rews = results.var(v::AMB_REWS)?;
    let ct = results.var(v::CT)?;
    let power = results.var(v::P)?;
    let amb_power = results.var(v::AMB_P)?;
    let n_turbines = results.size(Axis::Turbine).unwrap_or(0);

    println!("Turbine | AMB_REWS |   REWS |    CT |   P(kW) | Loss(%)");
    println!("--------|----------|--------|-------|---------|--------");

    let mut farm_power = 0.0;
    let mut farm_amb_power = 0.0;
    for t in 0..n_turbines {
        let mut mean = [0.0; 5];
        for (s, &w) in weights.iter().enumerate() {
            mean[0] += w * amb_rews.get2(s, t);
            mean[1] += w * rews.get2(s, t);
            mean[2] += w * ct.get2(s, t);
            mean[3] += w * power.get2(s, t);
            mean[4] += w * amb_power.get2(s, t);
        }
        let loss = if mean[4] > 0.0 {
            100.0 * (1.0 - mean[3] / mean[4])
        } else {
            0.0
        };
        println!(
            "{:7} | {:8.3} | {:6.3} | {:5.3} | {:7.1} | {:6.2}",
            t, mean[0], mean[1], mean[2], mean[3], loss
        );
        farm_power += mean[3];
        farm_amb_power += mean[4];
    }

    println!("\n=== Calculation Complete ===");
    println!("Farm power: {:.1} kW", farm_power);
    println!("Ambient farm power: {:.1} kW", farm_amb_power);
    if farm_amb_power > 0.0 {
        println!("Farm efficiency: {:.2}%", 100.0 * farm_power / farm_amb_power);
    }
    Ok(())
}
