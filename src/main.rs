use anyhow::{anyhow, bail, Result};

use cdbg::config::ColorSet;
use cdbg::engine::TraversalEngine;
use cdbg::stopper::StoppingRuleKind;
use cdbg::store::{KmerStore, MmapStore};

fn parse_colors(arg: &str, num_colors: usize) -> Result<ColorSet> {
    let mut colors = ColorSet::new();
    for field in arg.split(',') {
        let color: usize = field
            .trim()
            .parse()
            .map_err(|_| anyhow!("not a color index: {}", field))?;
        if color >= num_colors {
            bail!("color {} out of range, the store has {}", color, num_colors);
        }
        colors.insert(color);
    }
    Ok(colors)
}

fn main() -> Result<()> {
    let args: Vec<_> = std::env::args().collect();
    if args.len() < 3 {
        bail!("usage: {} <store> <seed k-mer> [colors]", args[0]);
    }

    let store = MmapStore::open(&args[1])?;
    println!("# k-mer size: {}", store.kmer_size());
    println!("# colors: {}", store.num_colors());
    println!("# k-mers: {}", store.len());

    let colors = match args.get(3) {
        Some(arg) => parse_colors(arg, store.num_colors())?,
        None => (0..store.num_colors()).collect(),
    };

    let engine = TraversalEngine::builder()
        .graph(&store)
        .traversal_colors(colors)
        .stopping_rule(StoppingRuleKind::Contig)
        .try_build()?;

    let contig = engine.assemble(args[2].as_bytes());
    if contig.is_empty() {
        bail!("seed {} is not in the store", args[2]);
    }
    println!("# left end: {:?}", contig.left);
    println!("# right end: {:?}", contig.right);
    println!("{}", contig.sequence());
    Ok(())
}
