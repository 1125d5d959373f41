use compositor::{Composite, Compositor};
use rand::{Rng, SeedableRng, rngs::SmallRng};

use crate::render::GenCfg;

/// Vocabulary label and LaTeX spelling of each binary operator.
const OPERATORS: [(&str, &str); 5] = [
    ("+", "+"),
    ("-", "-"),
    ("times", "\\times"),
    ("div", "\\div"),
    ("=", "="),
];

/// A composited expression and its LaTeX source.
pub struct Expression {
    pub composite: Composite,
    pub text: String,
}

/// Random expression trees built from handwritten glyphs.
pub struct ExpressionGenerator<'a> {
    cfg: &'a GenCfg,
    rng: SmallRng,
}

impl<'a> ExpressionGenerator<'a> {
    pub fn new(cfg: &'a GenCfg, seed: u64) -> Self {
        Self {
            cfg,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn generate(&mut self, comp: &mut Compositor<'_>) -> compositor::Result<Expression> {
        self.node(comp, self.cfg.max_depth)
    }

    fn spacing(&mut self) -> u32 {
        let (lo, hi) = self.cfg.spacing;
        self.rng.random_range(lo..=hi.max(lo))
    }

    fn node(&mut self, comp: &mut Compositor<'_>, depth: u32) -> compositor::Result<Expression> {
        if depth == 0 || self.rng.random_range(0..100) < 30 {
            return self.leaf(comp);
        }

        match self.rng.random_range(0..4) {
            0 => {
                let left = self.node(comp, depth - 1)?;
                let (label, latex) = OPERATORS[self.rng.random_range(0..OPERATORS.len())];
                let op = comp.symbol(label)?;
                let right = self.node(comp, depth - 1)?;
                let spacing = self.spacing();
                Ok(Expression {
                    composite: comp.binary(left.composite, op, right.composite, spacing),
                    text: format!("{} {latex} {}", left.text, right.text),
                })
            }
            1 => {
                let base = self.node(comp, depth - 1)?;
                let exp = self.leaf(comp)?;
                let spacing = self.spacing();
                Ok(Expression {
                    composite: comp.exponent(
                        base.composite,
                        exp.composite,
                        self.cfg.exponent_scale,
                        spacing,
                    )?,
                    text: format!("{{{}}}^{{{}}}", base.text, exp.text),
                })
            }
            2 => {
                let num = self.node(comp, depth - 1)?;
                let den = self.node(comp, depth - 1)?;
                let spacing = self.spacing();
                Ok(Expression {
                    composite: comp.fraction(num.composite, den.composite, spacing)?,
                    text: format!("\\frac{{{}}}{{{}}}", num.text, den.text),
                })
            }
            _ => {
                let inner = self.node(comp, depth - 1)?;
                let spacing = self.spacing();
                Ok(Expression {
                    composite: comp.parenthesize(inner.composite, spacing)?,
                    text: format!("({})", inner.text),
                })
            }
        }
    }

    fn leaf(&mut self, comp: &mut Compositor<'_>) -> compositor::Result<Expression> {
        let spacing = self.spacing();
        if self.rng.random_range(0..100) < 65 {
            let n = self.rng.random_range(0..=self.cfg.max_number.max(0));
            return Ok(Expression {
                composite: comp.digits(n, spacing)?,
                text: n.to_string(),
            });
        }

        let len = self.rng.random_range(1..=2);
        let name: String = (0..len)
            .map(|_| (b'a' + self.rng.random_range(0..26u8)) as char)
            .collect();
        Ok(Expression {
            composite: comp.string(&name, spacing)?,
            text: name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compositor::{Canvas, MemoryLoader, SymbolStore, Vocabulary};
    use image::{ImageBuffer, Luma};

    fn store(seed: u64) -> SymbolStore {
        let vocabulary = Vocabulary::default();
        let mut loader = MemoryLoader::new();
        for label in vocabulary.labels() {
            let source = vocabulary.resolve(label).unwrap();
            let transform = source.transform();
            // raw polarity of the dataset
            let glyph = |xs: std::ops::Range<u32>, ys: std::ops::Range<u32>| -> Canvas {
                ImageBuffer::from_fn(45, 45, |x, y| {
                    let ink = xs.contains(&x) && ys.contains(&y);
                    Luma([if ink != transform.invert { 1.0 } else { 0.0 }])
                })
            };
            loader.insert(label, vec![glyph(9..36, 12..33), glyph(6..39, 21..24)]);
        }
        SymbolStore::with_seed(vocabulary, loader, seed)
    }

    #[test]
    fn generated_boxes_stay_inside_the_image() {
        let cfg = GenCfg::default();
        let mut s = store(5);
        let mut comp = Compositor::with_layout(&mut s, cfg.layout.clone());
        for seed in 0..25 {
            let expr = ExpressionGenerator::new(&cfg, seed).generate(&mut comp).unwrap();
            assert!(!expr.text.is_empty());
            assert!(!expr.composite.boxes.is_empty());
            assert!(expr.composite.boxes_fit(), "seed {seed}: {}", expr.text);
        }
    }

    #[test]
    fn large_exponent_scales_stay_inside_the_image() {
        let cfg = GenCfg {
            max_depth: 2,
            exponent_scale: 3.0,
            ..GenCfg::default()
        };
        let mut s = store(6);
        let mut comp = Compositor::new(&mut s);
        for seed in 0..40 {
            let expr = ExpressionGenerator::new(&cfg, seed).generate(&mut comp).unwrap();
            assert!(expr.composite.boxes_fit(), "seed {seed}: {}", expr.text);
        }
    }

    #[test]
    fn same_seed_gives_the_same_expression() {
        let cfg = GenCfg {
            max_depth: 4,
            ..GenCfg::default()
        };
        let mut a = store(1);
        let mut b = store(1);
        let ea = ExpressionGenerator::new(&cfg, 8)
            .generate(&mut Compositor::new(&mut a))
            .unwrap();
        let eb = ExpressionGenerator::new(&cfg, 8)
            .generate(&mut Compositor::new(&mut b))
            .unwrap();
        assert_eq!(ea.text, eb.text);
        assert_eq!(ea.composite, eb.composite);
    }

    #[test]
    fn depth_zero_yields_a_leaf() {
        let cfg = GenCfg {
            max_depth: 0,
            max_number: 9,
            ..GenCfg::default()
        };
        let mut s = store(2);
        let mut comp = Compositor::new(&mut s);
        for seed in 0..10 {
            let expr = ExpressionGenerator::new(&cfg, seed).generate(&mut comp).unwrap();
            assert!(expr.composite.boxes.len() <= 2, "{}", expr.text);
        }
    }
}
