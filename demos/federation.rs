use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use cdd_rs::cdd::Cdd;
use cdd_rs::dbm::Dbm;
use cdd_rs::manager::{CddConfig, CddManager};

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Number of random zones in the federation.
    #[arg(value_name = "INT", default_value = "10")]
    zones: usize,

    /// Number of clocks, the reference clock included.
    #[clap(long, value_name = "INT", default_value = "4")]
    clocks: usize,

    /// Magnitude of the generated bounds.
    #[clap(long, value_name = "INT", default_value = "100")]
    range: i32,

    /// Node table size (in bits, so the actual size is `2^size` nodes).
    #[clap(long, value_name = "INT", default_value = "12")]
    size: usize,

    /// Random seed.
    #[clap(long, value_name = "INT", default_value = "42")]
    seed: u64,

    /// Print every extracted zone.
    #[clap(long)]
    print: bool,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    println!("args = {:?}", args);

    let manager = CddManager::with_config(CddConfig {
        max_clocks: args.clocks,
        storage_bits: args.size,
        ..CddConfig::default()
    });
    manager.add_clocks(args.clocks);
    println!("config = {:?}", manager.config());
    println!("manager = {:?}", manager);

    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);

    // Build the federation:
    let mut zones = Vec::new();
    let mut federation = Cdd::empty(&manager);
    for _ in 0..args.zones {
        let zone = Dbm::generate(args.clocks, &mut rng, args.range);
        federation |= Cdd::from_matrix(&manager, &zone);
        zones.push(zone);
    }
    println!(
        "federation: {} nodes, {} edges, {} paths",
        federation.size(),
        manager.edge_count(federation.node()),
        manager.path_count(federation.node())
    );

    let time_reduce = std::time::Instant::now();
    let reduced = federation.reduce();
    println!(
        "reduced in {:.3}s: {} nodes, {} paths",
        time_reduce.elapsed().as_secs_f64(),
        reduced.size(),
        manager.path_count(reduced.node())
    );

    for zone in &zones {
        assert!(reduced.contains(zone));
    }

    // Enumerate the zones of the federation:
    let time_extract = std::time::Instant::now();
    let mut rest = reduced.clone();
    let mut extracted = Cdd::empty(&manager);
    let mut count = 0;
    while let Some((zone, remainder)) = rest.extract(args.clocks) {
        count += 1;
        if args.print {
            println!("zone #{}:\n{}", count, zone);
        }
        extracted |= Cdd::from_matrix(&manager, &zone);
        rest = remainder.reduce();
    }
    println!(
        "extracted {} zones in {:.3}s",
        count,
        time_extract.elapsed().as_secs_f64()
    );
    assert!(extracted.equivalent(&reduced));

    println!("cache: hits = {}, misses = {}", manager.cache().hits(), manager.cache().misses());
    println!("manager = {:?}", manager);
    println!("Total time: {:.3}s", time_total.elapsed().as_secs_f64());

    drop(extracted);
    drop(rest);
    drop(reduced);
    drop(federation);
    manager.finalize();

    Ok(())
}
