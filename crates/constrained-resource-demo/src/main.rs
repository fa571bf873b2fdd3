//! Reference CLI: packs a catalog of items into a single bin using
//! `constrained-resource-core`, optionally exploring every ordering of the
//! catalog via a `StandardPermutationGenerator`.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use constrained_resource_core::{
    PermutationGeneratorFactory, PermutationGeneratorKind, Request, RequestGroup, ResultSystem, SystemPtr,
    WorkingSystem,
};

mod config;
mod resource;

use config::Config;
use resource::BinResource;

#[derive(Debug, Parser)]
#[command(about = "Explores bin-packing orderings with constrained-resource-core")]
struct Opts {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "constrained-resource-demo.toml")]
    config: String,
}

fn load_config(path: &str) -> anyhow::Result<Config> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("no config file at '{path}', using built-in defaults");
            Ok(Config::default())
        }
        Err(err) => Err(err.into()),
    }
}

fn run() -> anyhow::Result<()> {
    let opts = Opts::parse();
    let config = load_config(&opts.config)?;

    let item_sizes: HashMap<String, u32> = config.items.iter().map(|item| (item.name.clone(), item.size)).collect();
    let requests = config
        .items
        .iter()
        .map(|item| Request::new(item.name.clone(), None, None, None).map(Arc::new))
        .collect::<Result<Vec<_>, _>>()?;
    let group = RequestGroup::new(requests)?;

    let resource = BinResource::new(config.bin.capacity, item_sizes);
    let factory: Option<Arc<dyn PermutationGeneratorFactory<BinResource>>> = if config.permute {
        Some(Arc::new(PermutationGeneratorKind::Standard { max_total: u64::MAX }))
    } else {
        None
    };

    let root = WorkingSystem::new_single_group(group, resource, factory)?;
    let results = explore(root, config.max_n)?;

    tracing::info!("found {} packing(s)", results.len());
    for result in &results {
        println!("{result} (used {}/{})", result.resource.used(), result.resource.used() + result.resource.remaining());
    }

    if let Some(best) = results.iter().max_by_key(|result| result.score) {
        println!("best: {best}");
    }

    Ok(())
}

fn explore(root: WorkingSystem<BinResource>, max_n: usize) -> anyhow::Result<Vec<ResultSystem<BinResource>>> {
    let mut pending = VecDeque::new();
    let mut results = Vec::new();
    pending.push_back(root);

    while let Some(mut node) = pending.pop_front() {
        for child in node.generate_children(max_n)? {
            match child {
                SystemPtr::Working(calculated) => pending.push_back(calculated.commit()),
                SystemPtr::Result(calculated) => results.push(calculated.commit()),
            }
        }
    }

    Ok(results)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .compact()
        .init();

    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
