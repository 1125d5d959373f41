use std::path::Path;

use anyhow::Context;
use compositor::{Composite, Compositor, SymbolStore, Vocabulary, geometry::fatten};
use rand::{RngCore, SeedableRng};
use rand_xoshiro::SplitMix64;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::{
    generator::ExpressionGenerator, geom::fit_to_frame, glyphs::DirLoader, io::DatasetWriter,
    render::{GenCfg, draw_preview},
};

mod generator;
mod geom;
mod glyphs;
mod io;
mod record;
mod render;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cfg = match std::env::args().nth(1) {
        Some(path) => GenCfg::from_json_file(Path::new(&path))?,
        None => GenCfg::default(),
    };
    run(&cfg)
}

fn run(cfg: &GenCfg) -> anyhow::Result<()> {
    let mut store = SymbolStore::with_seed(
        Vocabulary::default(),
        DirLoader::new(&cfg.glyph_root),
        cfg.seed,
    );
    let mut comp = Compositor::with_layout(&mut store, cfg.layout.clone());

    let mut out = DatasetWriter::new(&cfg.out_dir);
    out.init_output(cfg.previews)
        .with_context(|| format!("cannot prepare output dir {}", cfg.out_dir))?;

    let mut sm = SplitMix64::seed_from_u64(cfg.seed);
    let mut written = 0u32;
    for id in 0..cfg.samples {
        let seed = sm.next_u64();

        let expr = match ExpressionGenerator::new(cfg, seed).generate(&mut comp) {
            Ok(expr) => expr,
            Err(err) => {
                warn!(id, seed, %err, "skipping sample");
                continue;
            }
        };
        let composite = if cfg.fatten_radius > 0 {
            let (image, boxes) =
                fatten(&expr.composite.image, cfg.fatten_radius, expr.composite.boxes);
            Composite::new(image, boxes)
        } else {
            expr.composite
        };

        let (img, boxes) = match fit_to_frame(&composite, cfg.size, cfg.white_background) {
            Ok(framed) => framed,
            Err(err) => {
                warn!(id, seed, %err, expression = %expr.text, "skipping sample");
                continue;
            }
        };

        out.save_png(&img, id)?;
        if cfg.previews {
            out.save_preview(&draw_preview(&img, &boxes), id)?;
        }
        out.write_record(id, seed, &expr.text, cfg.size, boxes)?;
        written += 1;
    }

    out.finalize_output()?;
    info!(
        written,
        classes = out.classes().names().len(),
        loaded_sets = comp.store_mut().loaded_symbols().len(),
        out_dir = %cfg.out_dir,
        "dataset written"
    );
    Ok(())
}
